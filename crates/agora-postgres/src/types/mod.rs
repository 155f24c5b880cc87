//! Constraints, pagination and other custom types.

pub mod constants;
mod constraint;
mod pagination;

pub use constraint::{
    AccountConstraints, CommentConstraints, ConstraintCategory, ConstraintViolation,
    GroupConstraints, PostConstraints, UpvoteConstraints,
};
pub use pagination::{MAX_LIMIT, OffsetPage, OffsetPagination};
