use crate::ConfigError;
use regex::Regex;

/// Allow-list of URL shapes that belong to the crawl corpus
///
/// Every pattern must match the *entire* URL. A pattern that only matches a
/// substring (for example a category prefix followed by extra path segments it
/// does not describe) rejects the URL.
///
/// # Examples
///
/// ```
/// use topic_search::url::LinkMatcher;
///
/// let matcher = LinkMatcher::new(&["https://www\\.gamersky\\.com/z/.*/"]).unwrap();
/// assert!(matcher.matches("https://www.gamersky.com/z/zelda/"));
/// assert!(!matcher.matches("https://www.gamersky.com/z/zelda/page.html"));
/// ```
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    patterns: Vec<Regex>,
}

impl LinkMatcher {
    /// Compiles the given patterns, anchoring each one at both ends
    ///
    /// # Returns
    ///
    /// * `Ok(LinkMatcher)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})$", p))
                    .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if any pattern matches the whole URL
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(url))
    }

    /// Number of configured patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
