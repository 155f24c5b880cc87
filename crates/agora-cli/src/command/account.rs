use agora_postgres::PgClient;
use agora_postgres::model::{NewAccount, NewGroup};
use agora_postgres::query::{AccountRepository, GroupRepository};
use anyhow::Context;

use crate::config::SessionConfig;

/// Mirrors the acting user into the accounts table.
pub async fn register(
    client: &PgClient,
    session: &SessionConfig,
    user_name: String,
) -> anyhow::Result<()> {
    let id = session
        .user_id
        .context("--user-id is required to register")?;

    let mut conn = client.get_connection().await?;
    let account = conn
        .upsert_account(NewAccount { id, user_name })
        .await
        .context("failed to register account")?;

    println!("registered {} as {}", account.id, account.user_name);
    Ok(())
}

pub async fn create_group(client: &PgClient, name: String) -> anyhow::Result<()> {
    let mut conn = client.get_connection().await?;
    let group = conn
        .create_group(NewGroup::new(name))
        .await
        .context("failed to create group")?;

    println!("{}  {}", group.id, group.name);
    Ok(())
}
