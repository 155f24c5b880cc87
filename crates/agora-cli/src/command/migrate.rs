use agora_postgres::{PgClient, PgClientMigrationExt};
use anyhow::Context;

use crate::TRACING_TARGET_COMMAND;

/// Applies pending migrations, or only reports them with `status_only`.
pub async fn run(client: &PgClient, status_only: bool) -> anyhow::Result<()> {
    if status_only {
        let status = client
            .get_migration_status()
            .await
            .context("failed to read migration status")?;

        println!(
            "last applied: {}",
            status.last_applied_version().unwrap_or("none")
        );
        for version in &status.pending_versions {
            println!("pending: {version}");
        }
        return Ok(());
    }

    let result = client
        .run_pending_migrations()
        .await
        .context("failed to apply migrations")?;

    if result.is_no_op() {
        println!("database is up to date");
    } else {
        for version in &result.processed_versions {
            println!("applied: {version}");
        }
    }

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        applied = result.processed_versions.len(),
        duration_ms = result.duration.as_millis() as u64,
        "Migrations finished"
    );

    Ok(())
}
