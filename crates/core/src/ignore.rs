//! Basename ignore rules for uploads

use std::path::Path;

use glob::Pattern;

use crate::config::DEFAULT_IGNORE;
use crate::error::Result;

/// A set of glob patterns matched against a file's basename
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    /// Compile the given patterns
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Rules that ignore nothing
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether `path`'s basename matches any pattern
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            patterns: Pattern::new(&Pattern::escape(DEFAULT_IGNORE))
                .into_iter()
                .collect(),
        }
    }
}
