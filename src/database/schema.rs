use async_trait::async_trait;
use sqlx::migrate::{Migrate, MigrateDatabase, Migrator};
use sqlx::{PgConnection, PgPool, Postgres};
use std::collections::HashSet;
use tracing::debug;

use crate::bootstrap::{ChangeId, SchemaError, SchemaProvider};

/// Migrations shipped with the binary, applied in version order.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Schema provider backed by Postgres and the embedded sqlx migrations.
pub struct PgSchemaProvider {
    pool: PgPool,
    url: String,
    migrator: &'static Migrator,
}

impl PgSchemaProvider {
    pub fn new(pool: PgPool, url: impl Into<String>) -> Self {
        Self {
            pool,
            url: url.into(),
            migrator: &MIGRATOR,
        }
    }

    fn declared(&self) -> impl Iterator<Item = ChangeId> + '_ {
        self.migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| ChangeId::new(m.version, m.description.to_string()))
    }
}

#[async_trait]
impl SchemaProvider for PgSchemaProvider {
    async fn can_connect(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Connectivity probe failed: {}", e);
                false
            }
        }
    }

    async fn pending_changes(&self) -> Result<Vec<ChangeId>, SchemaError> {
        let mut pooled = self
            .pool
            .acquire()
            .await
            .map_err(|e| SchemaError::Connectivity(e.to_string()))?;
        let conn: &mut PgConnection = &mut pooled;

        conn.ensure_migrations_table()
            .await
            .map_err(|e| SchemaError::Apply(e.to_string()))?;
        let applied: HashSet<i64> = conn
            .list_applied_migrations()
            .await
            .map_err(|e| SchemaError::Apply(e.to_string()))?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(self.declared().filter(|c| !applied.contains(&c.version)).collect())
    }

    async fn apply_pending(&self) -> Result<(), SchemaError> {
        self.migrator
            .run(&self.pool)
            .await
            .map_err(|e| SchemaError::Apply(e.to_string()))
    }

    async fn create_if_absent(&self) -> Result<(), SchemaError> {
        let exists = Postgres::database_exists(&self.url)
            .await
            .map_err(|e| SchemaError::Provision(e.to_string()))?;
        if exists {
            debug!("Database already exists");
            return Ok(());
        }

        Postgres::create_database(&self.url)
            .await
            .map_err(|e| SchemaError::Provision(e.to_string()))
    }
}
