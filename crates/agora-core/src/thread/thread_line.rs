use uuid::Uuid;

use super::comment_node::{CommentNode, NodeState};
use crate::comment::Comment;

/// Actions available on a rendered comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    /// Replies exist, are hidden and may be loaded.
    pub show_replies: bool,
    /// The viewer may reply.
    pub reply: bool,
    /// The viewer wrote the comment and may delete it.
    pub delete: bool,
}

/// One visible row of a thread, in display order.
#[derive(Debug, Clone, Copy)]
pub struct ThreadLine<'a> {
    pub comment: &'a Comment,
    pub depth: usize,
    pub state: &'a NodeState,
    pub affordances: Affordances,
}

/// Appends the visible nodes in pre-order. Children show only under expanded nodes.
pub(crate) fn flatten<'a>(
    nodes: &'a [CommentNode],
    viewer: Option<Uuid>,
    lines: &mut Vec<ThreadLine<'a>>,
) {
    for node in nodes {
        let comment = node.comment();
        lines.push(ThreadLine {
            comment,
            depth: node.depth(),
            state: node.state(),
            affordances: Affordances {
                show_replies: node.can_show_replies(),
                reply: viewer.is_some(),
                delete: comment.is_authored_by(viewer),
            },
        });

        if node.state().is_expanded() {
            flatten(node.children(), viewer, lines);
        }
    }
}
