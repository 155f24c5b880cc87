//! Group model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::groups;

/// A community that posts are published in.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Group {
    /// Unique group identifier.
    pub id: Uuid,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Optional image reference.
    pub image: Option<String>,
    /// Timestamp when the group was created.
    pub created_at: Timestamp,
}

/// Data for creating a new group.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewGroup {
    /// Display name.
    pub name: String,
    /// Image reference.
    pub image: Option<String>,
}

impl NewGroup {
    /// Creates a new group without an image.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }
}
