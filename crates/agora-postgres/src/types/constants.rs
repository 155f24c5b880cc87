//! Limits mirrored from the database check constraints.

/// Post-related constants.
pub mod post {
    /// Number of posts in one feed page.
    pub const FEED_PAGE_SIZE: i64 = 10;

    /// Maximum length of a post title in characters.
    pub const MAX_TITLE_LENGTH: usize = 300;
}

/// Comment-related constants.
pub mod comment {
    /// Maximum length of a comment body in characters.
    pub const MAX_BODY_LENGTH: usize = 10_000;
}

/// Group-related constants.
pub mod group {
    /// Maximum number of groups returned by a search.
    pub const SEARCH_LIMIT: i64 = 25;
}
