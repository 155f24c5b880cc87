//! Account model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::accounts;

/// A user known to the identity provider.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    /// Identifier issued by the identity provider.
    pub id: Uuid,
    /// Unique user name.
    pub user_name: String,
    /// Timestamp when the account was first seen.
    pub created_at: Timestamp,
}

/// Data for registering an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAccount {
    pub id: Uuid,
    pub user_name: String,
}
