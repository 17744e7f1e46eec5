//! Extension filter: keep only candidate URLs whose path ends in an allowed extension.
//!
//! Each extension becomes an anchored `^.+\.<ext>$` pattern matched against
//! the URL *path*, so query strings and fragments do not hide the suffix.
//! Matching is case-sensitive and single-extension only.

use crate::error::WallsortError;
use regex::Regex;
use reqwest::Url;
use tracing::debug;

/// Compiled allow-list of file extensions.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    patterns: Vec<Regex>,
}

impl ExtensionFilter {
    /// Compile one pattern per bare extension (`jpg`, `png`, …).
    ///
    /// An empty list is valid and rejects every URL.
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, WallsortError> {
        let patterns = extensions
            .iter()
            .map(|ext| {
                let pattern = format!(r"^.+\.{}$", regex::escape(ext.as_ref()));
                Regex::new(&pattern).map_err(|e| {
                    WallsortError::InvalidConfig(format!(
                        "bad extension {:?}: {e}",
                        ext.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True when the URL's path ends in `.` + one allowed extension.
    ///
    /// Unparseable URLs are never eligible.
    pub fn is_eligible(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let path = parsed.path();
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Keep eligible URLs, preserving their relative order.
    pub fn filter<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        candidates
            .into_iter()
            .map(Into::into)
            .filter(|url| {
                let keep = self.is_eligible(url);
                if !keep {
                    debug!("Skipping non-image URL: {}", url);
                }
                keep
            })
            .collect()
    }
}
