use agora_postgres::query::{GroupRepository, PostRepository, UpvoteRepository};
use agora_postgres::types::{MAX_LIMIT, OffsetPagination};
use agora_postgres::{PgClient, model};
use uuid::Uuid;

use super::model::{Group, NewPost, PostSummary, Vote, VoteValue};
use super::post_store::PostStore;
use crate::{Error, Result};

/// [`PostStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgPostStore {
    client: PgClient,
}

impl PgPostStore {
    /// Creates a store on top of an existing client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn into_summary(listing: model::PostListing) -> PostSummary {
    let model::PostListing {
        post,
        group_name,
        upvote_total,
        comment_count,
    } = listing;

    PostSummary {
        id: post.id,
        group_id: post.group_id,
        group_name,
        author_id: post.author_id,
        created_at: post.created_at(),
        title: post.title,
        description: post.description,
        image: post.image,
        upvote_total,
        comment_count: u64::try_from(comment_count).unwrap_or_default(),
    }
}

fn into_group(group: model::Group) -> Group {
    Group {
        id: group.id,
        name: group.name,
        image: group.image,
    }
}

fn into_vote_value(value: i16) -> Result<VoteValue> {
    VoteValue::try_from(value).map_err(|error| {
        Error::data_access()
            .with_message("stored vote has an invalid value")
            .with_source(error)
    })
}

impl PostStore for PgPostStore {
    async fn list_posts(&self, limit: usize, offset: usize) -> Result<Vec<PostSummary>> {
        let pagination = OffsetPagination::new(
            i64::try_from(limit).unwrap_or(MAX_LIMIT),
            i64::try_from(offset).unwrap_or(i64::MAX),
        );

        let mut conn = self.client.get_connection().await?;
        let listings = conn.list_posts(pagination).await?;
        Ok(listings.into_iter().map(into_summary).collect())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        let mut conn = self.client.get_connection().await?;
        let listing = conn.find_post_by_id(post_id).await?;
        Ok(listing.map(into_summary))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<PostSummary> {
        let mut conn = self.client.get_connection().await?;
        let post = conn
            .create_post(model::NewPost {
                group_id: new_post.group_id,
                author_id: new_post.author_id,
                title: new_post.title,
                description: new_post.description,
                image: new_post.image,
            })
            .await?;

        let listing = conn.find_post_by_id(post.id).await?.ok_or_else(|| {
            Error::data_access().with_message(format!("post {} vanished after insert", post.id))
        })?;

        Ok(into_summary(listing))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        if !conn.delete_post(post_id).await? {
            return Err(Error::data_access().with_message(format!("post {post_id} not found")));
        }

        Ok(())
    }

    async fn vote(&self, post_id: Uuid, author_id: Uuid, value: VoteValue) -> Result<Vote> {
        let mut conn = self.client.get_connection().await?;
        let upvote = conn
            .upsert_vote(model::NewUpvote {
                post_id,
                author_id,
                value: value.value(),
            })
            .await?;

        Ok(Vote {
            post_id: upvote.post_id,
            author_id: upvote.author_id,
            value: into_vote_value(upvote.value)?,
        })
    }

    async fn my_vote(&self, post_id: Uuid, author_id: Uuid) -> Result<Option<VoteValue>> {
        let mut conn = self.client.get_connection().await?;
        let upvote = conn.find_vote(post_id, author_id).await?;
        upvote.map(|upvote| into_vote_value(upvote.value)).transpose()
    }

    async fn search_groups(&self, search: &str) -> Result<Vec<Group>> {
        let mut conn = self.client.get_connection().await?;
        let groups = conn.search_groups(search).await?;
        Ok(groups.into_iter().map(into_group).collect())
    }
}
