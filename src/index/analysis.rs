//! Text analysis for indexing and querying
//!
//! The same tokenizer must be used when a document is indexed and when a query
//! is evaluated, otherwise terms will not line up.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Splits text into index terms
pub trait Tokenizer: Send + Sync {
    /// Returns the terms of `text` in order of appearance, repeats included
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Short identifier stored in the index metadata
    fn name(&self) -> &'static str;
}

/// Unicode-aware default tokenizer
///
/// Text is NFKC-normalized, split on Unicode word boundaries and lowercased.
/// Segments without any letter or digit are dropped. Scripts without spaces
/// between words (Chinese, for example) are indexed as overlapping bigrams of
/// each run of adjacent ideographs; a lone ideograph is a term of its own.
///
/// # Examples
///
/// ```
/// use topic_search::index::{StandardTokenizer, Tokenizer};
///
/// let tokens = StandardTokenizer.tokenize("Zelda: Tears of the Kingdom!");
/// assert_eq!(tokens, vec!["zelda", "tears", "of", "the", "kingdom"]);
///
/// let tokens = StandardTokenizer.tokenize("塞尔达传说");
/// assert_eq!(tokens, vec!["塞尔", "尔达", "达传", "传说"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTokenizer;

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfkc().collect();
        let mut tokens = Vec::new();

        // Adjacent ideographs and the byte offset just past the last one
        let mut run: Vec<&str> = Vec::new();
        let mut run_end = 0;

        for (offset, word) in normalized.unicode_word_indices() {
            if !word.chars().any(char::is_alphanumeric) {
                continue;
            }
            if is_ideograph(word) {
                if offset != run_end {
                    flush_run(&mut run, &mut tokens);
                }
                run.push(word);
                run_end = offset + word.len();
                continue;
            }
            flush_run(&mut run, &mut tokens);
            tokens.push(word.to_lowercase());
        }
        flush_run(&mut run, &mut tokens);

        tokens
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// True for a word segment that is a single Han or Hiragana character
fn is_ideograph(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => matches!(
            c,
            '\u{3040}'..='\u{309F}'
                | '\u{3400}'..='\u{4DBF}'
                | '\u{4E00}'..='\u{9FFF}'
                | '\u{F900}'..='\u{FAFF}'
                | '\u{20000}'..='\u{2FA1F}'
        ),
        _ => false,
    }
}

fn flush_run(run: &mut Vec<&str>, tokens: &mut Vec<String>) {
    match run.len() {
        0 => {}
        1 => tokens.push(run[0].to_string()),
        _ => tokens.extend(run.windows(2).map(|pair| pair.concat())),
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let tokens = StandardTokenizer.tokenize("Hello, WORLD... (again)");
        assert_eq!(tokens, vec!["hello", "world", "again"]);
    }

    #[test]
    fn test_keeps_repeats_in_order() {
        let tokens = StandardTokenizer.tokenize("b a b");
        assert_eq!(tokens, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_full_width_forms_are_normalized() {
        // Full-width Latin letters and digits fold to ASCII under NFKC
        let tokens = StandardTokenizer.tokenize("ＰＳ５ ＧＡＭＥ");
        assert_eq!(tokens, vec!["ps5", "game"]);
    }

    #[test]
    fn test_ideograph_runs_become_bigrams() {
        let tokens = StandardTokenizer.tokenize("塞尔达");
        assert_eq!(tokens, vec!["塞尔", "尔达"]);
    }

    #[test]
    fn test_ideograph_runs_break_at_other_text() {
        let tokens = StandardTokenizer.tokenize("塞尔达 传说，王国之泪 Switch版 新");
        assert_eq!(
            tokens,
            vec!["塞尔", "尔达", "传说", "王国", "国之", "之泪", "switch", "版", "新"]
        );
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert!(StandardTokenizer.tokenize("").is_empty());
        assert!(StandardTokenizer.tokenize("  -- !! ").is_empty());
    }
}
