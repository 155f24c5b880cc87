use agora_postgres::query::CommentRepository;
use agora_postgres::{PgClient, model};
use uuid::Uuid;

use super::CommentStore;
use crate::comment::{Comment, NewComment};
use crate::{Error, Result, TRACING_TARGET_STORE};

/// [`CommentStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCommentStore {
    client: PgClient,
}

impl PgCommentStore {
    /// Creates a store on top of an existing client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &PgClient {
        &self.client
    }

    /// Attaches reply counts and drops rows that cannot belong to the requested list.
    async fn with_reply_counts(
        &self,
        rows: Vec<model::Comment>,
        expected_parent: Option<Uuid>,
    ) -> Result<Vec<Comment>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows.iter().map(|row| row.id).collect();
        let mut conn = self.client.get_connection().await?;
        let counts = conn.count_comment_replies(ids).await?;

        let comments = rows
            .into_iter()
            .filter(|row| {
                let valid = row.parent_id != Some(row.id) && row.parent_id == expected_parent;
                if !valid {
                    tracing::warn!(
                        target: TRACING_TARGET_STORE,
                        comment_id = %row.id,
                        parent_id = ?row.parent_id,
                        "Skipping malformed comment row"
                    );
                }
                valid
            })
            .map(|row| {
                let reply_count = counts.get(&row.id).copied().unwrap_or_default();
                into_comment(row, reply_count)
            })
            .collect();

        Ok(comments)
    }
}

fn into_comment(row: model::Comment, reply_count: i64) -> Comment {
    Comment {
        id: row.id,
        post_id: row.post_id,
        parent_id: row.parent_id,
        author_id: row.author_id,
        created_at: row.created_at(),
        body: row.body,
        upvote_count: row.upvote_count,
        reply_count: u64::try_from(reply_count).unwrap_or_default(),
    }
}

impl CommentStore for PgCommentStore {
    async fn fetch_top_level(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let rows = {
            let mut conn = self.client.get_connection().await?;
            conn.find_top_level_comments(post_id).await?
        };

        let comments = self.with_reply_counts(rows, None).await?;
        Ok(comments
            .into_iter()
            .filter(|comment| comment.post_id == post_id)
            .collect())
    }

    async fn fetch_replies(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let rows = {
            let mut conn = self.client.get_connection().await?;
            conn.find_comment_replies(parent_id).await?
        };

        self.with_reply_counts(rows, Some(parent_id)).await
    }

    async fn insert(&self, new_comment: NewComment) -> Result<Comment> {
        let mut conn = self.client.get_connection().await?;
        let row = conn
            .create_comment(model::NewComment {
                post_id: new_comment.post_id,
                parent_id: new_comment.parent_id,
                author_id: new_comment.author_id,
                body: new_comment.body,
            })
            .await?;

        Ok(into_comment(row, 0))
    }

    async fn delete(&self, comment_id: Uuid) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        if !conn.delete_comment(comment_id).await? {
            return Err(Error::data_access().with_message(format!("comment {comment_id} not found")));
        }

        Ok(())
    }
}
