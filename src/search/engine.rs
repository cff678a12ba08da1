//! Query evaluation and ranking

use crate::index::{
    DocId, FieldName, IndexError, IndexReader, InvertedIndex, StandardTokenizer, StoredDocument,
    Tokenizer,
};
use crate::search::page::{Hit, Page};
use crate::search::query::{Query, SearchRequest};
use crate::search::QueryError;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// A query term after tokenization
#[derive(Debug)]
struct Term {
    text: String,
    /// Distinct tokens in order of first appearance
    tokens: Vec<String>,
}

/// Read-only query engine over a loaded index
///
/// Cloning is cheap and clones share the index, so one engine can serve any
/// number of threads.
#[derive(Clone)]
pub struct SearchEngine {
    index: Arc<InvertedIndex>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl SearchEngine {
    /// Creates an engine; `tokenizer` must be the one the index was built with
    pub fn new(index: Arc<InvertedIndex>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { index, tokenizer }
    }

    /// Loads the index published in `dir` with the default tokenizer
    pub fn open(dir: &Path) -> Result<Self, IndexError> {
        Self::open_with_tokenizer(dir, Arc::new(StandardTokenizer))
    }

    /// Loads the index published in `dir`, which must have been built with `tokenizer`
    pub fn open_with_tokenizer(
        dir: &Path,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, IndexError> {
        let reader = IndexReader::open(dir, tokenizer.name())?;
        Ok(Self::new(reader.index(), tokenizer))
    }

    pub fn doc_count(&self) -> usize {
        self.index.doc_count()
    }

    /// Stored display fields of a hit
    pub fn document(&self, doc_id: DocId) -> Option<&StoredDocument> {
        self.index.document(doc_id)
    }

    /// Free-text search across every full-text field
    ///
    /// A document matches when it contains at least one token of `text`.
    pub fn search(&self, text: &str, page_index: usize, page_size: usize) -> Result<Page, QueryError> {
        check_page(page_index, page_size)?;

        let tokens = distinct(self.tokenizer.tokenize(text));
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for token in &tokens {
            self.accumulate(token, |_| true, &mut scores);
        }

        Ok(Page::from_ranked(rank(scores), page_index, page_size))
    }

    /// Boolean search over must, should and must-not term groups
    ///
    /// A document qualifies when it matches every must term, at least one
    /// should term (if any are given) and no must-not term. With no must and no
    /// should terms the result is empty.
    ///
    /// # Errors
    ///
    /// * `QueryError::EmptyTerm` - A term has no searchable characters
    /// * `QueryError::ConflictingTerm` - The same term is both required and forbidden
    pub fn advanced_search<S: AsRef<str>>(
        &self,
        must: &[S],
        should: &[S],
        must_not: &[S],
        page_index: usize,
        page_size: usize,
    ) -> Result<Page, QueryError> {
        check_page(page_index, page_size)?;

        let must = self.analyze(must)?;
        let should = self.analyze(should)?;
        let must_not = self.analyze(must_not)?;

        if let Some(conflict) = must
            .iter()
            .find(|m| must_not.iter().any(|n| same_tokens(m, n)))
        {
            return Err(QueryError::ConflictingTerm(conflict.text.clone()));
        }

        if must.is_empty() && should.is_empty() {
            return Ok(Page::empty(page_index, page_size));
        }

        let must_docs: Vec<BTreeSet<DocId>> = must.iter().map(|t| self.term_docs(t)).collect();
        let should_docs: Vec<BTreeSet<DocId>> = should.iter().map(|t| self.term_docs(t)).collect();

        let mut candidates: BTreeSet<DocId> = match must_docs.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, docs| acc.intersection(docs).copied().collect()),
            None => should_docs.iter().flatten().copied().collect(),
        };
        if !must_docs.is_empty() && !should_docs.is_empty() {
            candidates.retain(|id| should_docs.iter().any(|docs| docs.contains(id)));
        }
        for term in &must_not {
            for id in self.term_docs(term) {
                candidates.remove(&id);
            }
        }

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for (term, docs) in must.iter().zip(&must_docs).chain(should.iter().zip(&should_docs)) {
            for token in &term.tokens {
                self.accumulate(
                    token,
                    |id| candidates.contains(&id) && docs.contains(&id),
                    &mut scores,
                );
            }
        }

        Ok(Page::from_ranked(rank(scores), page_index, page_size))
    }

    /// Evaluates a query
    pub fn execute(&self, query: &Query, page_index: usize, page_size: usize) -> Result<Page, QueryError> {
        match query {
            Query::Simple { text } => self.search(text, page_index, page_size),
            Query::Boolean {
                must,
                should,
                must_not,
            } => self.advanced_search(must, should, must_not, page_index, page_size),
        }
    }

    /// Maps a form request to a query and evaluates it
    pub fn handle(&self, request: &SearchRequest) -> Result<Page, QueryError> {
        let query = request.to_query()?;
        self.execute(&query, request.page_index, request.page_size)
    }

    fn analyze<S: AsRef<str>>(&self, terms: &[S]) -> Result<Vec<Term>, QueryError> {
        terms
            .iter()
            .map(|t| {
                let text = t.as_ref();
                let tokens = distinct(self.tokenizer.tokenize(text));
                if tokens.is_empty() {
                    Err(QueryError::EmptyTerm(text.to_string()))
                } else {
                    Ok(Term {
                        text: text.to_string(),
                        tokens,
                    })
                }
            })
            .collect()
    }

    /// Documents in which every token of `term` occurs in some full-text field
    fn term_docs(&self, term: &Term) -> BTreeSet<DocId> {
        let mut result: Option<BTreeSet<DocId>> = None;
        for token in &term.tokens {
            let docs: BTreeSet<DocId> = FieldName::ALL
                .iter()
                .flat_map(|&field| self.index.postings(field, token).iter().map(|p| p.doc_id))
                .collect();
            result = Some(match result {
                Some(acc) => acc.intersection(&docs).copied().collect(),
                None => docs,
            });
        }
        result.unwrap_or_default()
    }

    /// Adds the contribution of `token` to every accepted document
    fn accumulate<F>(&self, token: &str, accept: F, scores: &mut HashMap<DocId, f64>)
    where
        F: Fn(DocId) -> bool,
    {
        let df = self.index.document_frequency(token);
        if df == 0 {
            return;
        }
        let idf = (1.0 + self.index.doc_count() as f64 / df as f64).ln();

        for field in FieldName::ALL {
            for posting in self.index.postings(field, token) {
                if accept(posting.doc_id) {
                    *scores.entry(posting.doc_id).or_insert(0.0) +=
                        field.boost() * f64::from(posting.frequency).sqrt() * idf;
                }
            }
        }
    }
}

fn check_page(page_index: usize, page_size: usize) -> Result<(), QueryError> {
    if page_index == 0 {
        return Err(QueryError::InvalidPageIndex);
    }
    if page_size == 0 {
        return Err(QueryError::InvalidPageSize);
    }
    Ok(())
}

fn distinct(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

fn same_tokens(a: &Term, b: &Term) -> bool {
    let mut x = a.tokens.clone();
    let mut y = b.tokens.clone();
    x.sort();
    y.sort();
    x == y
}

/// Descending score, ties by ascending doc id
fn rank(scores: HashMap<DocId, f64>) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scores
        .into_iter()
        .map(|(doc_id, score)| Hit { doc_id, score })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    hits
}
