//! URL scope matching for include/exclude lists.
//!
//! Patterns are regular expressions searched (not anchored) in the
//! percent-decoded request URL, so `/admin` matches any URL containing
//! `/admin` and `^https://app\.example\.com/docs/` pins a prefix.

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::Error;

/// A compiled, ordered set of scope patterns.
#[derive(Debug, Clone, Default)]
pub struct ScopePatterns {
    patterns: Vec<Regex>,
}

impl ScopePatterns {
    /// Compile every pattern, failing on the first invalid one.
    pub fn compile(patterns: &[String]) -> Result<Self, Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::InvalidPattern(format!("{p}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True iff any pattern matches `url`. An empty set matches nothing.
    pub fn matches_any(&self, url: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let decoded = percent_decode_str(url).decode_utf8_lossy();
        self.patterns.iter().any(|p| p.is_match(&decoded))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
