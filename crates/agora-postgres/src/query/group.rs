//! Groups repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::escape_like;
use crate::model::{Group, NewGroup};
use crate::types::constants::group::SEARCH_LIMIT;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for group database operations.
pub trait GroupRepository {
    /// Inserts a group and returns the stored row.
    fn create_group(&mut self, new_group: NewGroup) -> impl Future<Output = PgResult<Group>> + Send;

    /// Lists groups whose name contains `search`, ignoring case, ordered by name.
    ///
    /// An empty search lists every group, up to the search limit.
    fn search_groups(&mut self, search: &str) -> impl Future<Output = PgResult<Vec<Group>>> + Send;
}

impl GroupRepository for PgConnection {
    async fn create_group(&mut self, new_group: NewGroup) -> PgResult<Group> {
        use schema::groups;

        let group = diesel::insert_into(groups::table)
            .values(&new_group)
            .returning(Group::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(group)
    }

    async fn search_groups(&mut self, search: &str) -> PgResult<Vec<Group>> {
        use schema::groups::{self, dsl};

        let pattern = format!("%{}%", escape_like(search.trim()));

        let groups = groups::table
            .filter(dsl::name.ilike(pattern))
            .order(dsl::name.asc())
            .limit(SEARCH_LIMIT)
            .select(Group::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(groups)
    }
}
