//! Draft state of the comment box.

use uuid::Uuid;

use crate::comment::MAX_BODY_LENGTH;
use crate::{Error, Result};

/// Body text and reply target of the comment being written.
///
/// Submitting goes through [`CommentThread::submit`](crate::thread::CommentThread::submit),
/// which clears the composer only once the store accepted the comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyComposer {
    body: String,
    reply_target: Option<Uuid>,
    focused: bool,
}

impl ReplyComposer {
    /// Creates an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets a reply at `comment_id` and focuses the composer.
    pub fn set_reply_target(&mut self, comment_id: Uuid) {
        self.reply_target = Some(comment_id);
        self.focused = true;
    }

    /// Replaces the draft body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Drops the reply target and focus. The draft body is kept.
    pub fn cancel(&mut self) {
        self.reply_target = None;
        self.focused = false;
    }

    /// Returns the draft body as typed.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the comment being replied to, if any.
    pub fn reply_target(&self) -> Option<Uuid> {
        self.reply_target
    }

    /// Returns whether the composer has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Returns the body with surrounding whitespace removed, rejecting blank drafts.
    pub fn validated_body(&self) -> Result<&str> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(Error::validation().with_message("comment body is empty"));
        }
        if body.chars().count() > MAX_BODY_LENGTH {
            return Err(Error::validation()
                .with_message(format!("comment body exceeds {MAX_BODY_LENGTH} characters")));
        }

        Ok(body)
    }

    pub(crate) fn reset(&mut self) {
        self.body.clear();
        self.reply_target = None;
        self.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_reply_target_focuses() {
        let mut composer = ReplyComposer::new();
        let target = Uuid::now_v7();

        composer.set_reply_target(target);
        assert_eq!(composer.reply_target(), Some(target));
        assert!(composer.is_focused());
    }

    #[test]
    fn test_cancel_keeps_body() {
        let mut composer = ReplyComposer::new();
        composer.set_reply_target(Uuid::now_v7());
        composer.set_body("half written");

        composer.cancel();
        assert_eq!(composer.reply_target(), None);
        assert!(!composer.is_focused());
        assert_eq!(composer.body(), "half written");
    }

    #[test]
    fn test_blank_body_is_rejected() {
        let mut composer = ReplyComposer::new();
        assert_eq!(
            composer.validated_body().unwrap_err().kind(),
            ErrorKind::Validation
        );

        composer.set_body(" \n\t ");
        assert_eq!(
            composer.validated_body().unwrap_err().kind(),
            ErrorKind::Validation
        );

        composer.set_body("  hello  ");
        assert_eq!(composer.validated_body().unwrap(), "hello");
    }

    #[test]
    fn test_overlong_body_is_rejected() {
        let mut composer = ReplyComposer::new();
        composer.set_body("é".repeat(MAX_BODY_LENGTH));
        assert!(composer.validated_body().is_ok());

        composer.set_body("é".repeat(MAX_BODY_LENGTH + 1));
        assert_eq!(
            composer.validated_body().unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut composer = ReplyComposer::new();
        composer.set_reply_target(Uuid::now_v7());
        composer.set_body("sent");

        composer.reset();
        assert_eq!(composer, ReplyComposer::default());
    }
}
