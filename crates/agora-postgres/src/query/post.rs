//! Posts repository for the feed and the post detail view.

use std::collections::HashMap;
use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewPost, Post, PostListing};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for post database operations.
pub trait PostRepository {
    /// Inserts a post and returns the stored row.
    fn create_post(&mut self, new_post: NewPost) -> impl Future<Output = PgResult<Post>> + Send;

    /// Lists posts newest first, each with its group name and counters.
    fn list_posts(
        &mut self,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<PostListing>>> + Send;

    /// Finds a post with its group name and counters.
    fn find_post_by_id(
        &mut self,
        post_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PostListing>>> + Send;

    /// Deletes a post together with its comments and votes.
    ///
    /// Returns `false` when no such post exists.
    fn delete_post(&mut self, post_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl PostRepository for PgConnection {
    async fn create_post(&mut self, new_post: NewPost) -> PgResult<Post> {
        use schema::posts;

        let post = diesel::insert_into(posts::table)
            .values(&new_post)
            .returning(Post::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            post_id = %post.id,
            group_id = %post.group_id,
            "Post created"
        );

        Ok(post)
    }

    async fn list_posts(&mut self, pagination: OffsetPagination) -> PgResult<Vec<PostListing>> {
        use schema::{groups, posts};

        let rows: Vec<(Post, String)> = posts::table
            .inner_join(groups::table)
            .order((posts::created_at.desc(), posts::id.desc()))
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select((Post::as_select(), groups::name))
            .load(self)
            .await
            .map_err(PgError::from)?;

        attach_counters(self, rows).await
    }

    async fn find_post_by_id(&mut self, post_id: Uuid) -> PgResult<Option<PostListing>> {
        use schema::{groups, posts};

        let row: Option<(Post, String)> = posts::table
            .inner_join(groups::table)
            .filter(posts::id.eq(post_id))
            .select((Post::as_select(), groups::name))
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut listings = attach_counters(self, vec![row]).await?;
        Ok(listings.pop())
    }

    async fn delete_post(&mut self, post_id: Uuid) -> PgResult<bool> {
        use schema::posts::{self, dsl};

        let deleted = diesel::delete(posts::table.filter(dsl::id.eq(post_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}

/// Loads vote totals and comment counts for the given posts in two grouped queries.
async fn attach_counters(
    conn: &mut PgConnection,
    rows: Vec<(Post, String)>,
) -> PgResult<Vec<PostListing>> {
    use diesel::dsl::{count, sum};
    use schema::{comments, upvotes};

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = rows.iter().map(|(post, _)| post.id).collect();

    let totals: HashMap<Uuid, i64> = upvotes::table
        .filter(upvotes::post_id.eq_any(post_ids.clone()))
        .group_by(upvotes::post_id)
        .select((upvotes::post_id, sum(upvotes::value)))
        .load::<(Uuid, Option<i64>)>(conn)
        .await
        .map_err(PgError::from)?
        .into_iter()
        .map(|(post_id, total)| (post_id, total.unwrap_or_default()))
        .collect();

    let comment_counts: HashMap<Uuid, i64> = comments::table
        .filter(comments::post_id.eq_any(post_ids))
        .group_by(comments::post_id)
        .select((comments::post_id, count(comments::id)))
        .load::<(Uuid, i64)>(conn)
        .await
        .map_err(PgError::from)?
        .into_iter()
        .collect();

    let listings = rows
        .into_iter()
        .map(|(post, group_name)| PostListing {
            upvote_total: totals.get(&post.id).copied().unwrap_or_default(),
            comment_count: comment_counts.get(&post.id).copied().unwrap_or_default(),
            post,
            group_name,
        })
        .collect();

    Ok(listings)
}
