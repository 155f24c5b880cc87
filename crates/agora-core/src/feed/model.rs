use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum length of a post title in characters.
pub const MAX_TITLE_LENGTH: usize = 300;

/// A post as listed in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub group_id: Uuid,
    /// Name of the group the post was made in.
    pub group_name: String,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Storage path of the attached image.
    pub image: Option<String>,
    /// Sum of all vote values.
    pub upvote_total: i64,
    pub comment_count: u64,
    pub created_at: Timestamp,
}

impl PostSummary {
    /// Returns whether `user_id` wrote this post.
    pub fn is_authored_by(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.author_id)
    }
}

/// A community posts are made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Returns the stored value: `1` or `-1`.
    pub fn value(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = Error;

    fn try_from(value: i16) -> Result<Self> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(Error::validation().with_message(format!("vote value must be 1 or -1, got {other}"))),
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.value()
    }
}

/// A vote cast by one account on one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub value: VoteValue,
}

/// Sums vote values into a post score.
pub fn upvote_total(votes: &[Vote]) -> i64 {
    votes.iter().map(|vote| i64::from(vote.value.value())).sum()
}

/// Data for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub group_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl NewPost {
    pub fn new(group_id: Uuid, author_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            group_id,
            author_id,
            title: title.into(),
            description: None,
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Trims the title and checks that it is neither blank nor too long.
    pub fn validated(mut self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation().with_message("post title is empty"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::validation()
                .with_message(format!("post title exceeds {MAX_TITLE_LENGTH} characters")));
        }

        self.title = title.to_owned();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_vote_value_accepts_only_unit_values() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);

        for invalid in [0, 2, -2] {
            let error = VoteValue::try_from(invalid).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Validation);
        }

        assert!(serde_json::from_str::<VoteValue>("3").is_err());
        assert_eq!(serde_json::to_string(&VoteValue::Down).unwrap(), "-1");
    }

    #[test]
    fn test_upvote_total() {
        let post_id = Uuid::now_v7();
        let vote = |value| Vote {
            post_id,
            author_id: Uuid::now_v7(),
            value,
        };

        assert_eq!(upvote_total(&[]), 0);
        assert_eq!(
            upvote_total(&[vote(VoteValue::Up), vote(VoteValue::Up), vote(VoteValue::Down)]),
            1
        );
    }

    #[test]
    fn test_new_post_title_validation() {
        let (group_id, author_id) = (Uuid::now_v7(), Uuid::now_v7());

        let post = NewPost::new(group_id, author_id, "  hello  ").validated().unwrap();
        assert_eq!(post.title, "hello");

        let blank = NewPost::new(group_id, author_id, "   ").validated().unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::Validation);

        let long = NewPost::new(group_id, author_id, "x".repeat(MAX_TITLE_LENGTH + 1));
        assert!(long.validated().is_err());
    }
}
