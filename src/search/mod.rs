//! Query engine
//!
//! This module evaluates queries against a loaded index:
//! - Free-text search across all full-text fields
//! - Boolean must / should / must-not search
//! - Relevance ranking and 1-based pagination
//! - Mapping of search-form requests to queries

mod engine;
mod page;
mod query;

pub use engine::SearchEngine;
pub use page::{Hit, Page};
pub use query::{LogicalOperator, Query, SearchRequest};

use thiserror::Error;

/// Reasons a query is rejected
///
/// These are caller errors; the engine stays usable after returning one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Enter a search term")]
    EmptyQuery,

    #[error("Term '{0}' contains no searchable words")]
    EmptyTerm(String),

    #[error("Term '{0}' is both required and excluded")]
    ConflictingTerm(String),

    #[error("Choose AND, OR or NOT to combine two terms")]
    MissingOperator,

    #[error("Unknown operator '{0}' (expected and, or, not)")]
    UnknownOperator(String),

    #[error("Page numbers start at 1")]
    InvalidPageIndex,

    #[error("Page size must be greater than 0")]
    InvalidPageSize,
}
