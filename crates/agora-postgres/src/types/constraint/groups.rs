//! Groups table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Groups table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum GroupConstraints {
    #[strum(serialize = "groups_name_length")]
    NameLength,
    #[strum(serialize = "groups_name_unique_idx")]
    NameUnique,
}

impl GroupConstraints {
    /// Creates a new [`GroupConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            GroupConstraints::NameLength => ConstraintCategory::Validation,
            GroupConstraints::NameUnique => ConstraintCategory::Uniqueness,
        }
    }
}

impl From<GroupConstraints> for String {
    #[inline]
    fn from(val: GroupConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for GroupConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
