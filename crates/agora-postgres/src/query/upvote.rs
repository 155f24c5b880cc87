//! Upvotes repository.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewUpvote, Upvote};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for vote database operations.
pub trait UpvoteRepository {
    /// Casts a vote, replacing any earlier vote by the same account on the same post.
    fn upsert_vote(&mut self, new_vote: NewUpvote) -> impl Future<Output = PgResult<Upvote>> + Send;

    /// Finds the vote an account cast on a post.
    fn find_vote(
        &mut self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Upvote>>> + Send;
}

impl UpvoteRepository for PgConnection {
    async fn upsert_vote(&mut self, new_vote: NewUpvote) -> PgResult<Upvote> {
        use schema::upvotes::{self, dsl};

        let vote = diesel::insert_into(upvotes::table)
            .values(&new_vote)
            .on_conflict((dsl::post_id, dsl::author_id))
            .do_update()
            .set(dsl::value.eq(excluded(dsl::value)))
            .returning(Upvote::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            post_id = %vote.post_id,
            value = vote.value,
            "Vote recorded"
        );

        Ok(vote)
    }

    async fn find_vote(&mut self, post_id: Uuid, author_id: Uuid) -> PgResult<Option<Upvote>> {
        use schema::upvotes::{self, dsl};

        let vote = upvotes::table
            .filter(dsl::post_id.eq(post_id))
            .filter(dsl::author_id.eq(author_id))
            .select(Upvote::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(vote)
    }
}
