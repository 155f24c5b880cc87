//! Comments repository backing the threaded discussion under a post.

use std::collections::HashMap;
use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Comment, NewComment};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for comment database operations.
///
/// Lists are ordered oldest first so a thread reads top to bottom.
pub trait CommentRepository {
    /// Inserts a comment and returns the stored row.
    fn create_comment(
        &mut self,
        new_comment: NewComment,
    ) -> impl Future<Output = PgResult<Comment>> + Send;

    /// Lists the comments of a post that have no parent.
    fn find_top_level_comments(
        &mut self,
        post_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Comment>>> + Send;

    /// Lists the direct replies of a comment.
    fn find_comment_replies(
        &mut self,
        parent_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Comment>>> + Send;

    /// Counts direct replies for each of the given comments.
    ///
    /// Comments without replies are absent from the returned map.
    fn count_comment_replies(
        &mut self,
        parent_ids: Vec<Uuid>,
    ) -> impl Future<Output = PgResult<HashMap<Uuid, i64>>> + Send;

    /// Deletes a comment together with its reply subtree.
    ///
    /// Returns `false` when no such comment exists.
    fn delete_comment(&mut self, comment_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl CommentRepository for PgConnection {
    async fn create_comment(&mut self, new_comment: NewComment) -> PgResult<Comment> {
        use schema::comments;

        let comment = diesel::insert_into(comments::table)
            .values(&new_comment)
            .returning(Comment::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            comment_id = %comment.id,
            post_id = %comment.post_id,
            parent_id = ?comment.parent_id,
            "Comment created"
        );

        Ok(comment)
    }

    async fn find_top_level_comments(&mut self, post_id: Uuid) -> PgResult<Vec<Comment>> {
        use schema::comments::{self, dsl};

        let comments = comments::table
            .filter(dsl::post_id.eq(post_id))
            .filter(dsl::parent_id.is_null())
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(Comment::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(comments)
    }

    async fn find_comment_replies(&mut self, parent_id: Uuid) -> PgResult<Vec<Comment>> {
        use schema::comments::{self, dsl};

        let replies = comments::table
            .filter(dsl::parent_id.eq(parent_id))
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(Comment::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(replies)
    }

    async fn count_comment_replies(&mut self, parent_ids: Vec<Uuid>) -> PgResult<HashMap<Uuid, i64>> {
        use diesel::dsl::count;
        use schema::comments::{self, dsl};

        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Option<Uuid>, i64)> = comments::table
            .filter(dsl::parent_id.eq_any(parent_ids))
            .group_by(dsl::parent_id)
            .select((dsl::parent_id, count(dsl::id)))
            .load(self)
            .await
            .map_err(PgError::from)?;

        let counts = rows
            .into_iter()
            .filter_map(|(parent_id, replies)| parent_id.map(|id| (id, replies)))
            .collect();

        Ok(counts)
    }

    async fn delete_comment(&mut self, comment_id: Uuid) -> PgResult<bool> {
        use schema::comments::{self, dsl};

        let deleted = diesel::delete(comments::table.filter(dsl::id.eq(comment_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            comment_id = %comment_id,
            deleted,
            "Comment delete executed"
        );

        Ok(deleted > 0)
    }
}
