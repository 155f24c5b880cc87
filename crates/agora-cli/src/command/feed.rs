use std::sync::Arc;

use agora_core::feed::{NewPost, PgPostStore, PostFeed, PostSummary, VoteValue};
use agora_core::session::SessionProvider;
use agora_postgres::PgClient;
use anyhow::Context;
use uuid::Uuid;

use super::VoteDirection;

type Feed = PostFeed<PgPostStore>;

fn open(client: PgClient, session: Arc<dyn SessionProvider>) -> Feed {
    PostFeed::new(Arc::new(PgPostStore::new(client)), session)
}

fn print_post(post: &PostSummary) {
    println!(
        "{}  [{:+}] {}  (g/{}, {} comments, {})",
        post.id, post.upvote_total, post.title, post.group_name, post.comment_count, post.created_at
    );
}

pub async fn list_posts(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    pages: usize,
    page_size: usize,
) -> anyhow::Result<()> {
    let mut feed = open(client, session).with_page_size(page_size);
    for _ in 0..pages {
        feed.load_next_page().await.context("failed to load posts")?;
        if feed.is_exhausted() {
            break;
        }
    }

    feed.posts().iter().for_each(print_post);
    if !feed.is_exhausted() {
        println!("(more posts available)");
    }
    Ok(())
}

pub async fn search_groups(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    search: &str,
) -> anyhow::Result<()> {
    let feed = open(client, session);
    let groups = feed
        .search_groups(search)
        .await
        .context("failed to search groups")?;

    for group in groups {
        println!("{}  {}", group.id, group.name);
    }
    Ok(())
}

pub async fn create_post(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    group_id: Uuid,
    title: String,
    description: Option<String>,
) -> anyhow::Result<()> {
    let author_id = session
        .current_user_id()
        .context("--user-id is required to post")?;

    let mut new_post = NewPost::new(group_id, author_id, title);
    if let Some(description) = description {
        new_post = new_post.with_description(description);
    }

    let mut feed = open(client, session);
    let post = feed
        .create_post(new_post)
        .await
        .context("failed to create post")?;

    print_post(&post);
    Ok(())
}

pub async fn delete_post(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
) -> anyhow::Result<()> {
    let mut feed = open(client, session);
    feed.delete_post(post_id)
        .await
        .context("failed to delete post")?;

    println!("deleted {post_id}");
    Ok(())
}

pub async fn vote(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
    direction: VoteDirection,
) -> anyhow::Result<()> {
    let value = match direction {
        VoteDirection::Up => VoteValue::Up,
        VoteDirection::Down => VoteValue::Down,
    };

    let mut feed = open(client, session);
    feed.vote(post_id, value).await.context("failed to vote")?;

    if let Some(post) = feed.post(post_id).await? {
        print_post(&post);
    }
    Ok(())
}
