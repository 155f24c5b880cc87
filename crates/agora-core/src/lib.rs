#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for query cache operations.
pub const TRACING_TARGET_CACHE: &str = "agora_core::cache";

/// Tracing target for comment thread state changes.
pub const TRACING_TARGET_THREAD: &str = "agora_core::thread";

/// Tracing target for store implementations.
pub const TRACING_TARGET_STORE: &str = "agora_core::store";

/// Tracing target for the post feed.
pub const TRACING_TARGET_FEED: &str = "agora_core::feed";

mod error;

pub mod cache;
pub mod comment;
pub mod composer;
pub mod feed;
pub mod session;
pub mod store;
pub mod thread;

pub use error::{BoxedError, Error, ErrorKind, Result};
