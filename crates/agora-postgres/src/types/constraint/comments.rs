//! Comments table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Comments table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum CommentConstraints {
    // Body validation constraints
    #[strum(serialize = "comments_body_not_empty")]
    BodyNotEmpty,
    #[strum(serialize = "comments_body_length")]
    BodyLength,

    // Thread structure constraints
    #[strum(serialize = "comments_id_post_unique")]
    IdPostUnique,
    #[strum(serialize = "comments_parent_same_post")]
    ParentSamePost,
    #[strum(serialize = "comments_not_self_parent")]
    NotSelfParent,

    // Ownership constraints
    #[strum(serialize = "comments_post_id_fkey")]
    PostExists,
    #[strum(serialize = "comments_author_id_fkey")]
    AuthorExists,
}

impl CommentConstraints {
    /// Creates a new [`CommentConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            CommentConstraints::BodyNotEmpty | CommentConstraints::BodyLength => {
                ConstraintCategory::Validation
            }

            CommentConstraints::IdPostUnique => ConstraintCategory::Uniqueness,

            CommentConstraints::ParentSamePost
            | CommentConstraints::NotSelfParent
            | CommentConstraints::PostExists
            | CommentConstraints::AuthorExists => ConstraintCategory::Reference,
        }
    }
}

impl From<CommentConstraints> for String {
    #[inline]
    fn from(val: CommentConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for CommentConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
