use crate::index::DocId;

/// A matching document and its relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub doc_id: DocId,
    pub score: f64,
}

/// One page of a ranked result list
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Hits on this page, best first
    pub hits: Vec<Hit>,
    /// Number of matching documents across all pages
    pub total_hits: usize,
    /// 1-based page number
    pub page_index: usize,
    pub page_size: usize,
}

impl Page {
    /// Cuts page `page_index` out of the full ranked list
    ///
    /// `page_index` must be at least 1 and `page_size` greater than 0.
    pub(crate) fn from_ranked(ranked: Vec<Hit>, page_index: usize, page_size: usize) -> Self {
        let total_hits = ranked.len();
        let start = page_index
            .saturating_sub(1)
            .saturating_mul(page_size)
            .min(total_hits);
        let hits = ranked.into_iter().skip(start).take(page_size).collect();

        Self {
            hits,
            total_hits,
            page_index,
            page_size,
        }
    }

    pub(crate) fn empty(page_index: usize, page_size: usize) -> Self {
        Self::from_ranked(Vec::new(), page_index, page_size)
    }

    /// `ceil(total_hits / page_size)`
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        (self.total_hits + self.page_size - 1) / self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
