pub mod manager;
pub mod schema;

pub use manager::{connect_lazy, health_check, DatabaseError};
pub use schema::{PgSchemaProvider, MIGRATOR};
