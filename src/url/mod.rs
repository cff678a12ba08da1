//! URL handling module for Topic-Search
//!
//! This module provides URL normalization for frontier deduplication and
//! full-string pattern matching for deciding which discovered links belong to
//! the target corpus.

mod matcher;
mod normalize;

// Re-export main functions
pub use matcher::LinkMatcher;
pub use normalize::normalize_url;
