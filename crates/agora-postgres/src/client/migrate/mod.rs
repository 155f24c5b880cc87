//! Embedded schema migrations.
//!
//! Migrations are compiled into the binary with [`diesel_migrations::embed_migrations`]
//! and applied through a blocking [`AsyncConnectionWrapper`] on a worker thread.
//!
//! [`AsyncConnectionWrapper`]: diesel_async::async_connection_wrapper::AsyncConnectionWrapper

mod migrate_result;
mod run_migration;
mod run_utility;

pub use migrate_result::{MigrationResult, MigrationStatus};
pub use run_migration::run_pending_migrations;
pub use run_utility::{get_applied_migrations, get_migration_status, verify_schema_integrity};

use crate::{PgClient, PgResult};

/// Migration operations available directly on a [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending migration. Calling it on an up to date database is a no-op.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;

    /// Reports which embedded migrations have and have not been applied.
    fn get_migration_status(&self) -> impl Future<Output = PgResult<MigrationStatus>> + Send;

    /// Fails unless the migration bookkeeping table exists and the schema is current.
    fn verify_schema_integrity(&self) -> impl Future<Output = PgResult<()>> + Send;
}

impl PgClientMigrationExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        run_pending_migrations(self).await
    }

    async fn get_migration_status(&self) -> PgResult<MigrationStatus> {
        let mut conn = self.get_connection().await?;
        get_migration_status(&mut conn).await
    }

    async fn verify_schema_integrity(&self) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        verify_schema_integrity(&mut conn).await
    }
}
