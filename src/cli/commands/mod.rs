pub mod schema;
pub mod server;
pub mod token;
pub mod user;
