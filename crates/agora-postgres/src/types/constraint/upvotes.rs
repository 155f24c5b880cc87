//! Upvotes table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Upvotes table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum UpvoteConstraints {
    // Only +1 and -1 are valid votes
    #[strum(serialize = "upvotes_value_range")]
    ValueRange,

    // One vote per account and post
    #[strum(serialize = "upvotes_post_author_unique_idx")]
    PostAuthorUnique,

    #[strum(serialize = "upvotes_post_id_fkey")]
    PostExists,
}

impl UpvoteConstraints {
    /// Creates a new [`UpvoteConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            UpvoteConstraints::ValueRange => ConstraintCategory::Validation,
            UpvoteConstraints::PostAuthorUnique => ConstraintCategory::Uniqueness,
            UpvoteConstraints::PostExists => ConstraintCategory::Reference,
        }
    }
}

impl From<UpvoteConstraints> for String {
    #[inline]
    fn from(val: UpvoteConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for UpvoteConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
