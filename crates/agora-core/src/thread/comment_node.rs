use std::collections::HashMap;

use uuid::Uuid;

use crate::Error;
use crate::comment::{Comment, MAX_REPLY_DEPTH};

/// Expansion state of a comment's replies.
#[derive(Debug, Clone, Default)]
pub enum NodeState {
    /// Replies are hidden.
    #[default]
    Collapsed,
    /// Replies are being fetched.
    LoadingReplies,
    /// Replies are loaded and shown.
    Expanded,
    /// The last reply fetch failed; expanding again retries.
    CollapsedWithError(Error),
}

impl NodeState {
    /// Returns whether replies are shown.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        matches!(self, NodeState::Expanded)
    }

    /// Returns whether a reply fetch is pending.
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, NodeState::LoadingReplies)
    }

    /// Returns the error of the last failed reply fetch.
    pub fn error(&self) -> Option<&Error> {
        match self {
            NodeState::CollapsedWithError(error) => Some(error),
            _ => None,
        }
    }
}

/// One comment of a thread together with its loaded replies.
#[derive(Debug, Clone)]
pub struct CommentNode {
    comment: Comment,
    depth: usize,
    state: NodeState,
    children: Vec<CommentNode>,
}

impl CommentNode {
    pub(crate) fn new(comment: Comment, depth: usize) -> Self {
        Self {
            comment,
            depth,
            state: NodeState::Collapsed,
            children: Vec::new(),
        }
    }

    /// Returns the comment shown by this node.
    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    /// Returns the nesting depth; top-level comments are at 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the expansion state.
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Returns the loaded replies. Empty unless the node was expanded.
    pub fn children(&self) -> &[CommentNode] {
        &self.children
    }

    /// Returns whether the "show replies" action applies to this node.
    ///
    /// Requires known replies, a depth below [`MAX_REPLY_DEPTH`] and replies
    /// that are not already shown or loading.
    pub fn can_show_replies(&self) -> bool {
        self.comment.has_replies()
            && self.depth < MAX_REPLY_DEPTH
            && matches!(
                self.state,
                NodeState::Collapsed | NodeState::CollapsedWithError(_)
            )
    }

    pub(crate) fn start_loading(&mut self) {
        self.state = NodeState::LoadingReplies;
    }

    /// Stores fetched replies, keeping the state of replies that were already loaded.
    pub(crate) fn set_replies(&mut self, replies: Vec<Comment>) {
        let previous = std::mem::take(&mut self.children);
        self.children = merge_level(previous, replies, self.depth + 1);
        self.comment.reply_count = self.children.len() as u64;
        self.state = NodeState::Expanded;
    }

    pub(crate) fn fail(&mut self, error: Error) {
        self.children.clear();
        self.state = NodeState::CollapsedWithError(error);
    }

    pub(crate) fn collapse(&mut self) {
        self.children.clear();
        self.state = NodeState::Collapsed;
    }
}

/// Rebuilds one level of the tree from a fresh listing.
///
/// Nodes are matched by comment id: survivors take the fresh comment data and
/// keep their state and children, new comments start collapsed, and comments
/// missing from the listing are dropped. The listing order wins.
pub(crate) fn merge_level(
    existing: Vec<CommentNode>,
    fresh: Vec<Comment>,
    depth: usize,
) -> Vec<CommentNode> {
    let mut previous: HashMap<Uuid, CommentNode> = existing
        .into_iter()
        .map(|node| (node.comment.id, node))
        .collect();

    fresh
        .into_iter()
        .map(|comment| match previous.remove(&comment.id) {
            Some(mut node) => {
                node.comment = comment;
                node.depth = depth;
                node
            }
            None => CommentNode::new(comment, depth),
        })
        .collect()
}

pub(crate) fn find(nodes: &[CommentNode], comment_id: Uuid) -> Option<&CommentNode> {
    for node in nodes {
        if node.comment.id == comment_id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, comment_id) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_mut(nodes: &mut [CommentNode], comment_id: Uuid) -> Option<&mut CommentNode> {
    for node in nodes {
        if node.comment.id == comment_id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, comment_id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    fn comment(parent_id: Option<Uuid>, reply_count: u64) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            post_id: Uuid::nil(),
            parent_id,
            author_id: Uuid::nil(),
            body: "body".to_owned(),
            upvote_count: 0,
            reply_count,
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_depth_guard_hides_show_replies() {
        let shallow = CommentNode::new(comment(None, 2), MAX_REPLY_DEPTH - 1);
        let deep = CommentNode::new(comment(None, 2), MAX_REPLY_DEPTH);
        let empty = CommentNode::new(comment(None, 0), 0);

        assert!(shallow.can_show_replies());
        assert!(!deep.can_show_replies());
        assert!(!empty.can_show_replies());
    }

    #[test]
    fn test_merge_keeps_state_of_survivors() {
        let kept = comment(None, 1);
        let dropped = comment(None, 0);

        let mut expanded = CommentNode::new(kept.clone(), 0);
        expanded.set_replies(vec![comment(Some(kept.id), 0)]);
        let existing = vec![expanded, CommentNode::new(dropped, 0)];

        let added = comment(None, 0);
        let merged = merge_level(existing, vec![added.clone(), kept.clone()], 0);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].comment().id, added.id);
        assert!(matches!(merged[0].state(), NodeState::Collapsed));
        assert_eq!(merged[1].comment().id, kept.id);
        assert!(merged[1].state().is_expanded());
        assert_eq!(merged[1].children().len(), 1);
    }

    #[test]
    fn test_set_replies_updates_reply_count() {
        let parent = comment(None, 3);
        let mut node = CommentNode::new(parent.clone(), 1);
        node.start_loading();
        node.set_replies(vec![comment(Some(parent.id), 0)]);

        assert_eq!(node.comment().reply_count, 1);
        assert_eq!(node.children()[0].depth(), 2);
        assert!(!node.can_show_replies());
    }

    #[test]
    fn test_find_descends_into_children() {
        let root = comment(None, 1);
        let reply = comment(Some(root.id), 0);
        let mut node = CommentNode::new(root, 0);
        node.set_replies(vec![reply.clone()]);
        let mut nodes = vec![node];

        assert_eq!(find(&nodes, reply.id).map(CommentNode::depth), Some(1));
        find_mut(&mut nodes, reply.id).unwrap().fail(Error::data_access());
        assert!(find(&nodes, reply.id).unwrap().state().error().is_some());
        assert!(find(&nodes, Uuid::now_v7()).is_none());
    }
}
