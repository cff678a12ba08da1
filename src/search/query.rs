//! Query model and the request mapping used by presentation layers

use crate::search::QueryError;
use std::fmt;
use std::str::FromStr;

/// A query against the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Free text; any token in any full-text field matches
    Simple { text: String },

    /// Term groups; each term is tokenized and matches when all its tokens occur
    Boolean {
        must: Vec<String>,
        should: Vec<String>,
        must_not: Vec<String>,
    },
}

impl Query {
    pub fn simple(text: impl Into<String>) -> Self {
        Self::Simple { text: text.into() }
    }

    pub fn boolean<S: AsRef<str>>(must: &[S], should: &[S], must_not: &[S]) -> Self {
        let owned = |terms: &[S]| terms.iter().map(|t| t.as_ref().to_string()).collect();
        Self::Boolean {
            must: owned(must),
            should: owned(should),
            must_not: owned(must_not),
        }
    }
}

/// Operator joining the primary and secondary search boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl FromStr for LogicalOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "not" => Ok(Self::Not),
            other => Err(QueryError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        };
        f.write_str(name)
    }
}

/// Search request as entered in a search form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub primary: String,
    pub secondary: String,
    pub operator: Option<LogicalOperator>,
    /// 1-based page number
    pub page_index: usize,
    pub page_size: usize,
}

impl SearchRequest {
    /// Maps the form fields to a query
    ///
    /// | Operator | must | should | must not |
    /// |---|---|---|---|
    /// | AND | primary, secondary | | |
    /// | OR | | primary, secondary | |
    /// | NOT | primary | | secondary |
    /// | any, secondary empty | primary | | |
    /// | none, secondary empty | simple query on primary | | |
    ///
    /// # Errors
    ///
    /// * `QueryError::EmptyQuery` - The primary box is blank
    /// * `QueryError::MissingOperator` - A secondary term was given without an operator
    pub fn to_query(&self) -> Result<Query, QueryError> {
        let primary = self.primary.trim();
        let secondary = self.secondary.trim();

        if primary.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let query = match (self.operator, secondary.is_empty()) {
            (None, true) => Query::simple(primary),
            (None, false) => return Err(QueryError::MissingOperator),
            (Some(_), true) => Query::boolean(&[primary], &[], &[]),
            (Some(LogicalOperator::And), false) => Query::boolean(&[primary, secondary], &[], &[]),
            (Some(LogicalOperator::Or), false) => Query::boolean(&[], &[primary, secondary], &[]),
            (Some(LogicalOperator::Not), false) => Query::boolean(&[primary], &[], &[secondary]),
        };

        Ok(query)
    }
}
