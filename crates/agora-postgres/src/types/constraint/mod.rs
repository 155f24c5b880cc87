//! Database constraint violations, one enum per table.

mod accounts;
mod comments;
mod groups;
mod posts;
mod upvotes;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::accounts::AccountConstraints;
pub use self::comments::CommentConstraints;
pub use self::groups::GroupConstraints;
pub use self::posts::PostConstraints;
pub use self::upvotes::UpvoteConstraints;

/// Any named constraint declared by the migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    Account(AccountConstraints),
    Group(GroupConstraints),
    Post(PostConstraints),
    Comment(CommentConstraints),
    Upvote(UpvoteConstraints),
}

/// Categories of database constraint violations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Format, length and range checks.
    Validation,
    /// Primary keys and unique indexes.
    Uniqueness,
    /// Foreign keys and structural relationships between rows.
    Reference,
}

impl ConstraintViolation {
    /// Parses a constraint name reported by PostgreSQL.
    ///
    /// ```
    /// use agora_postgres::types::{CommentConstraints, ConstraintViolation};
    ///
    /// let violation = ConstraintViolation::new("comments_body_not_empty");
    /// assert_eq!(
    ///     violation,
    ///     Some(ConstraintViolation::Comment(CommentConstraints::BodyNotEmpty))
    /// );
    /// assert!(ConstraintViolation::new("unknown_constraint").is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        match constraint.split('_').next()? {
            "accounts" => AccountConstraints::new(constraint).map(Self::Account),
            "groups" => GroupConstraints::new(constraint).map(Self::Group),
            "posts" => PostConstraints::new(constraint).map(Self::Post),
            "comments" => CommentConstraints::new(constraint).map(Self::Comment),
            "upvotes" => UpvoteConstraints::new(constraint).map(Self::Upvote),
            _ => None,
        }
    }

    /// Returns the table the constraint is declared on.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConstraintViolation::Account(_) => "accounts",
            ConstraintViolation::Group(_) => "groups",
            ConstraintViolation::Post(_) => "posts",
            ConstraintViolation::Comment(_) => "comments",
            ConstraintViolation::Upvote(_) => "upvotes",
        }
    }

    /// Returns the category of this constraint violation.
    pub fn constraint_category(&self) -> ConstraintCategory {
        match self {
            ConstraintViolation::Account(c) => c.categorize(),
            ConstraintViolation::Group(c) => c.categorize(),
            ConstraintViolation::Post(c) => c.categorize(),
            ConstraintViolation::Comment(c) => c.categorize(),
            ConstraintViolation::Upvote(c) => c.categorize(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::Account(c) => write!(f, "{c}"),
            ConstraintViolation::Group(c) => write!(f, "{c}"),
            ConstraintViolation::Post(c) => write!(f, "{c}"),
            ConstraintViolation::Comment(c) => write!(f, "{c}"),
            ConstraintViolation::Upvote(c) => write!(f, "{c}"),
        }
    }
}

impl From<ConstraintViolation> for String {
    #[inline]
    fn from(val: ConstraintViolation) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("Unknown constraint: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_constraint_parsing() {
        assert_eq!(
            ConstraintViolation::new("comments_parent_same_post"),
            Some(ConstraintViolation::Comment(
                CommentConstraints::ParentSamePost
            ))
        );
        assert_eq!(
            ConstraintViolation::new("upvotes_post_author_unique_idx"),
            Some(ConstraintViolation::Upvote(
                UpvoteConstraints::PostAuthorUnique
            ))
        );
        assert_eq!(ConstraintViolation::new("comments_unknown"), None);
        assert_eq!(ConstraintViolation::new(""), None);
    }

    #[test]
    fn test_every_comment_constraint_round_trips() {
        for constraint in CommentConstraints::iter() {
            let name = constraint.to_string();
            let parsed = ConstraintViolation::new(&name);
            assert_eq!(parsed, Some(ConstraintViolation::Comment(constraint)));
            assert_eq!(parsed.map(|v| v.table_name()), Some("comments"));
        }
    }

    #[test]
    fn test_constraint_categorization() {
        let violation = ConstraintViolation::Comment(CommentConstraints::BodyNotEmpty);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Validation
        );

        let violation = ConstraintViolation::Group(GroupConstraints::NameUnique);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Uniqueness
        );

        let violation = ConstraintViolation::Post(PostConstraints::GroupExists);
        assert_eq!(
            violation.constraint_category(),
            ConstraintCategory::Reference
        );
    }

    #[test]
    fn test_serde_uses_constraint_names() {
        let violation = ConstraintViolation::Upvote(UpvoteConstraints::ValueRange);
        let json = serde_json::to_string(&violation).unwrap();
        assert_eq!(json, "\"upvotes_value_range\"");

        let parsed: ConstraintViolation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, violation);
    }
}
