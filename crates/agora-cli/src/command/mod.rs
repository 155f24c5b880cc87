//! Subcommands and their execution.

mod account;
mod feed;
mod migrate;
mod thread;

use agora_postgres::PgClient;
use clap::{Subcommand, ValueEnum};
use uuid::Uuid;

use crate::config::Cli;

/// What the CLI should do.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Apply pending schema migrations
    Migrate {
        /// Only report which migrations are pending
        #[arg(long)]
        status: bool,
    },
    /// Mirror the acting user into the accounts table
    Register {
        /// Display name of the account
        #[arg(long = "user-name")]
        user_name: String,
    },
    /// List the newest posts
    Posts {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Posts per page
        #[arg(long = "page-size", default_value_t = agora_core::feed::FEED_PAGE_SIZE)]
        page_size: usize,
    },
    /// Search groups by name
    Groups {
        /// Part of the group name; lists every group when omitted
        #[arg(default_value = "")]
        search: String,
    },
    /// Create a group
    CreateGroup { name: String },
    /// Create a post in a group
    CreatePost {
        group_id: Uuid,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete one of your posts
    DeletePost { post_id: Uuid },
    /// Vote on a post
    Vote {
        post_id: Uuid,
        #[arg(value_enum)]
        direction: VoteDirection,
    },
    /// Print the comment thread of a post
    Thread {
        post_id: Uuid,
        /// Load every reply level the thread allows
        #[arg(long = "expand-all")]
        expand_all: bool,
    },
    /// Comment on a post or reply to a comment
    Comment {
        post_id: Uuid,
        body: String,
        /// Comment to reply to
        #[arg(long = "reply-to")]
        reply_to: Option<Uuid>,
    },
    /// Delete one of your comments and its replies
    DeleteComment { post_id: Uuid, comment_id: Uuid },
}

/// Direction of a vote on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VoteDirection {
    Up,
    Down,
}

impl Command {
    /// Returns the subcommand name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Migrate { .. } => "migrate",
            Command::Register { .. } => "register",
            Command::Posts { .. } => "posts",
            Command::Groups { .. } => "groups",
            Command::CreateGroup { .. } => "create-group",
            Command::CreatePost { .. } => "create-post",
            Command::DeletePost { .. } => "delete-post",
            Command::Vote { .. } => "vote",
            Command::Thread { .. } => "thread",
            Command::Comment { .. } => "comment",
            Command::DeleteComment { .. } => "delete-comment",
        }
    }
}

/// Runs the parsed subcommand against the database.
pub async fn execute(cli: Cli, client: PgClient) -> anyhow::Result<()> {
    let session = cli.session.provider();

    match cli.command {
        Command::Migrate { status } => migrate::run(&client, status).await,
        Command::Register { user_name } => account::register(&client, &cli.session, user_name).await,
        Command::Posts { pages, page_size } => {
            feed::list_posts(client, session, pages, page_size).await
        }
        Command::Groups { search } => feed::search_groups(client, session, &search).await,
        Command::CreateGroup { name } => account::create_group(&client, name).await,
        Command::CreatePost {
            group_id,
            title,
            description,
        } => feed::create_post(client, session, group_id, title, description).await,
        Command::DeletePost { post_id } => feed::delete_post(client, session, post_id).await,
        Command::Vote { post_id, direction } => {
            feed::vote(client, session, post_id, direction).await
        }
        Command::Thread {
            post_id,
            expand_all,
        } => thread::print(client, session, post_id, expand_all).await,
        Command::Comment {
            post_id,
            body,
            reply_to,
        } => thread::comment(client, session, post_id, body, reply_to).await,
        Command::DeleteComment {
            post_id,
            comment_id,
        } => thread::delete(client, session, post_id, comment_id).await,
    }
}
