//! Repository traits implemented for [`PgConnection`](crate::PgConnection).
//!
//! Each trait groups the queries of one table. Obtain a connection from
//! [`PgClient::get_connection`](crate::PgClient::get_connection) and call the
//! methods on it directly.

mod account;
mod comment;
mod group;
mod post;
mod upvote;

pub use account::AccountRepository;
pub use comment::CommentRepository;
pub use group::GroupRepository;
pub use post::PostRepository;
pub use upvote::UpvoteRepository;

/// Escapes `LIKE` wildcards so user input only matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
