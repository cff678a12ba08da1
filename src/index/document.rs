//! Documents as they are indexed and stored

use crate::index::analysis::Tokenizer;
use crate::storage::StoredRecord;
use std::collections::BTreeMap;

/// Full-text fields of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Title,
    Description,
    Keywords,
    Detail,
    Content,
}

impl FieldName {
    pub const ALL: [FieldName; 5] = [
        FieldName::Title,
        FieldName::Description,
        FieldName::Keywords,
        FieldName::Detail,
        FieldName::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Keywords => "keywords",
            Self::Detail => "detail",
            Self::Content => "content",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "keywords" => Some(Self::Keywords),
            "detail" => Some(Self::Detail),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    /// Score multiplier for matches in this field
    pub fn boost(&self) -> f64 {
        match self {
            Self::Title => 2.0,
            Self::Description | Self::Keywords => 1.5,
            Self::Detail | Self::Content => 1.0,
        }
    }
}

/// Exact-match and display fields kept for every indexed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Id of the source row in the record store
    pub record_id: i64,
    pub url: String,
    pub title: String,
    /// Leading part of the content, shown in result lists
    pub summary: String,
    pub detail: String,
    /// Fetch time in milliseconds since the Unix epoch
    pub fetched_at: i64,
}

/// A record prepared for the index: stored fields plus per-field term counts
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub stored: StoredDocument,
    /// Term frequencies for each non-empty full-text field
    pub terms: BTreeMap<FieldName, BTreeMap<String, u32>>,
}

impl IndexedDocument {
    /// Tokenizes every full-text field of `source`
    pub fn from_record(
        source: &StoredRecord,
        tokenizer: &dyn Tokenizer,
        summary_length: usize,
    ) -> Self {
        let record = &source.record;
        let mut terms = BTreeMap::new();

        for field in FieldName::ALL {
            let text = match field {
                FieldName::Title => &record.title,
                FieldName::Description => &record.description,
                FieldName::Keywords => &record.keywords,
                FieldName::Detail => &record.detail,
                FieldName::Content => &record.content,
            };

            let mut counts: BTreeMap<String, u32> = BTreeMap::new();
            for token in tokenizer.tokenize(text) {
                *counts.entry(token).or_insert(0) += 1;
            }
            if !counts.is_empty() {
                terms.insert(field, counts);
            }
        }

        Self {
            stored: StoredDocument {
                record_id: source.id,
                url: record.url.clone(),
                title: record.title.clone(),
                summary: summarize(&record.content, summary_length),
                detail: record.detail.clone(),
                fetched_at: record.fetched_at,
            },
            terms,
        }
    }
}

/// First `max_chars` characters of `content`, followed by `...` when cut
pub fn summarize(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}
