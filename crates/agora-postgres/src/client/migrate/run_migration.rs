use std::time::Instant;

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::PoolableConnection;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use super::{MigrationResult, get_migration_status};
use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Applies all pending migrations.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationResult> {
    let start = Instant::now();
    let mut conn = pg.get_connection().await?;
    let status = get_migration_status(&mut conn).await?;

    if status.is_up_to_date() {
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            last_applied = ?status.last_applied_version(),
            "Database schema is already up to date"
        );
        return Ok(MigrationResult::new(start.elapsed(), Vec::new()));
    }

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        pending = status.pending_migrations(),
        "Applying pending migrations"
    );

    if conn.is_broken() {
        return Err(PgError::Migration(
            "connection is broken before running migrations".into(),
        ));
    }

    let mut wrapper: AsyncConnectionWrapper<_> = conn.into_inner().into();
    let outcome = spawn_blocking(move || {
        wrapper
            .run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.into_iter().map(|v| v.to_string()).collect::<Vec<_>>())
    })
    .await
    .map_err(|err| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %err, "Migration task panicked");
        PgError::Migration(err.into())
    })?;

    let duration = start.elapsed();
    let versions: Vec<String> = outcome.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            error = %err,
            "Database migration failed"
        );
        PgError::Migration(err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        duration = ?duration,
        applied = versions.len(),
        "Database migration completed"
    );

    Ok(MigrationResult::new(duration, versions))
}
