use std::sync::Arc;

use agora_core::session::{SessionProvider, StaticSession};
use clap::Args;
use uuid::Uuid;

/// Identity the commands act as.
///
/// Sign-in happens outside this tool; the id of an already authenticated
/// account is passed in directly.
#[derive(Debug, Clone, Args)]
pub struct SessionConfig {
    /// Account id of the acting user; omit to act signed out
    #[arg(long = "user-id", env = "AGORA_USER_ID")]
    pub user_id: Option<Uuid>,
}

impl SessionConfig {
    /// Returns the session handed to the state layer.
    pub fn provider(&self) -> Arc<dyn SessionProvider> {
        match self.user_id {
            Some(user_id) => Arc::new(StaticSession::signed_in(user_id)),
            None => Arc::new(StaticSession::anonymous()),
        }
    }
}
