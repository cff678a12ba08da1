//! In-memory inverted index

use crate::index::document::{FieldName, IndexedDocument, StoredDocument};
use std::collections::{BTreeMap, HashMap};

/// Index-local document id, assigned in the order documents are added
pub type DocId = u32;

/// One entry of a posting list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    /// Occurrences of the term in the field, always at least 1
    pub frequency: u32,
}

/// What `add_document` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(DocId),
    /// A document with the same URL was removed and the new one added
    Replaced { old: DocId, new: DocId },
}

/// Postings for every `(field, term)` pair plus the stored documents
///
/// Posting lists are sorted by doc id. A URL identifies at most one document;
/// adding a document for an indexed URL replaces the older one.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    documents: BTreeMap<DocId, StoredDocument>,
    postings: HashMap<FieldName, HashMap<String, Vec<Posting>>>,
    by_url: HashMap<String, DocId>,
    /// Keys of the posting lists each document appears in, for removal
    doc_terms: HashMap<DocId, Vec<(FieldName, String)>>,
    next_doc_id: DocId,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an index from its persisted parts
    ///
    /// Postings that refer to unknown documents are dropped.
    pub fn from_parts<D, P>(documents: D, postings: P) -> Self
    where
        D: IntoIterator<Item = (DocId, StoredDocument)>,
        P: IntoIterator<Item = (FieldName, String, Posting)>,
    {
        let mut index = Self::new();

        for (doc_id, doc) in documents {
            index.by_url.insert(doc.url.clone(), doc_id);
            index.documents.insert(doc_id, doc);
            index.next_doc_id = index.next_doc_id.max(doc_id.saturating_add(1));
        }

        for (field, term, posting) in postings {
            if posting.frequency == 0 || !index.documents.contains_key(&posting.doc_id) {
                continue;
            }
            index
                .doc_terms
                .entry(posting.doc_id)
                .or_default()
                .push((field, term.clone()));
            index
                .postings
                .entry(field)
                .or_default()
                .entry(term)
                .or_default()
                .push(posting);
        }

        for list in index.postings.values_mut().flat_map(|terms| terms.values_mut()) {
            list.sort_by_key(|p| p.doc_id);
            list.dedup_by_key(|p| p.doc_id);
        }

        index
    }

    /// Adds a document, replacing any document already indexed under its URL
    pub fn add_document(&mut self, doc: IndexedDocument) -> AddOutcome {
        let old = self.by_url.get(&doc.stored.url).copied();
        if let Some(old_id) = old {
            self.remove_document(old_id);
        }

        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        let mut keys = Vec::new();
        for (field, counts) in doc.terms {
            let field_postings = self.postings.entry(field).or_default();
            for (term, frequency) in counts {
                if frequency == 0 {
                    continue;
                }
                // New ids are always the largest, so lists stay sorted
                field_postings
                    .entry(term.clone())
                    .or_default()
                    .push(Posting { doc_id, frequency });
                keys.push((field, term));
            }
        }

        self.doc_terms.insert(doc_id, keys);
        self.by_url.insert(doc.stored.url.clone(), doc_id);
        self.documents.insert(doc_id, doc.stored);

        match old {
            Some(old) => AddOutcome::Replaced { old, new: doc_id },
            None => AddOutcome::Added(doc_id),
        }
    }

    /// Removes a document and its postings
    ///
    /// # Returns
    ///
    /// The removed document, if it existed
    pub fn remove_document(&mut self, doc_id: DocId) -> Option<StoredDocument> {
        let doc = self.documents.remove(&doc_id)?;
        if self.by_url.get(&doc.url) == Some(&doc_id) {
            self.by_url.remove(&doc.url);
        }

        for (field, term) in self.doc_terms.remove(&doc_id).unwrap_or_default() {
            let Some(field_postings) = self.postings.get_mut(&field) else {
                continue;
            };
            if let Some(list) = field_postings.get_mut(&term) {
                if let Ok(pos) = list.binary_search_by_key(&doc_id, |p| p.doc_id) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    field_postings.remove(&term);
                }
            }
        }

        Some(doc)
    }

    /// Posting list for `term` in `field`, sorted by doc id
    pub fn postings(&self, field: FieldName, term: &str) -> &[Posting] {
        self.postings
            .get(&field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of documents containing `term` in at least one field
    pub fn document_frequency(&self, term: &str) -> usize {
        let mut ids: Vec<DocId> = FieldName::ALL
            .iter()
            .flat_map(|&field| self.postings(field, term).iter().map(|p| p.doc_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&StoredDocument> {
        self.documents.get(&doc_id)
    }

    pub fn doc_id_for_url(&self, url: &str) -> Option<DocId> {
        self.by_url.get(url).copied()
    }

    /// Number of live documents
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct `(field, term)` pairs
    pub fn term_count(&self) -> usize {
        self.postings.values().map(HashMap::len).sum()
    }

    /// Documents in doc id order
    pub fn documents(&self) -> impl Iterator<Item = (DocId, &StoredDocument)> {
        self.documents.iter().map(|(id, doc)| (*id, doc))
    }

    /// Every posting list, in no particular order
    pub fn posting_lists(&self) -> impl Iterator<Item = (FieldName, &str, &[Posting])> {
        self.postings.iter().flat_map(|(field, terms)| {
            terms
                .iter()
                .map(move |(term, list)| (*field, term.as_str(), list.as_slice()))
        })
    }
}
