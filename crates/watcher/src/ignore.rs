//! Ignore patterns for watched roots
//!
//! Patterns use gitignore syntax and are matched against paths relative to
//! the root. Store directories are always ignored at any depth, so a root
//! never reports its own bookkeeping or that of a root nested inside it.

use crate::error::WatchError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use store::STORE_DIR_NAME;

/// Decides whether a path under a root is left out of a listing
pub trait IgnoreMatcher {
    /// `relative` is the path relative to the root
    fn matches(&self, relative: &Path, is_dir: bool) -> bool;
}

/// Compiled ignore patterns of one root
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    /// Built-in patterns (always enforced)
    builtin: Gitignore,

    /// Patterns from configuration
    configured: Gitignore,

    /// Source lines of `configured`
    patterns: Vec<String>,
}

impl IgnoreRules {
    /// Compile `patterns` for `root`
    ///
    /// Fails on the first pattern that is not valid gitignore syntax.
    pub fn new(root: &Path, patterns: &[String]) -> Result<Self, WatchError> {
        let mut builtin = GitignoreBuilder::new(root);
        builtin
            .add_line(None, &format!("{}/", STORE_DIR_NAME))
            .map_err(|source| WatchError::InvalidPattern {
                pattern: STORE_DIR_NAME.to_string(),
                source,
            })?;

        let mut configured = GitignoreBuilder::new(root);
        for pattern in patterns {
            let line = pattern.trim();
            if line.is_empty() {
                continue;
            }
            configured
                .add_line(None, line)
                .map_err(|source| WatchError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }

        let compile = |builder: GitignoreBuilder, pattern: &str| {
            builder.build().map_err(|source| WatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };

        Ok(Self {
            builtin: compile(builtin, STORE_DIR_NAME)?,
            configured: compile(configured, &patterns.join(", "))?,
            patterns: patterns.to_vec(),
        })
    }

    /// Only the built-in patterns
    pub fn builtin(root: &Path) -> Result<Self, WatchError> {
        Self::new(root, &[])
    }

    /// Configured patterns, as given
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl IgnoreMatcher for IgnoreRules {
    fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        if relative.as_os_str().is_empty() {
            return false;
        }

        self.builtin
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
            || self
                .configured
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreRules {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        IgnoreRules::new(Path::new("/watched"), &patterns).unwrap()
    }

    #[test]
    fn test_store_directory_always_ignored() {
        let rules = rules(&[]);

        assert!(rules.matches(Path::new(".snapwatch.db"), true));
        assert!(rules.matches(Path::new(".snapwatch.db/conf"), false));
        assert!(rules.matches(Path::new("inner/.snapwatch.db"), true));
        assert!(rules.matches(Path::new("inner/.snapwatch.db/snap.0000"), false));
        assert!(!rules.matches(Path::new("src/main.rs"), false));
        assert!(!rules.matches(Path::new("README.md"), false));
    }

    #[test]
    fn test_configured_patterns() {
        let rules = rules(&["*.log", "build/", "/top.txt"]);

        assert!(rules.matches(Path::new("debug.log"), false));
        assert!(rules.matches(Path::new("nested/deep/trace.log"), false));
        assert!(rules.matches(Path::new("build"), true));
        assert!(rules.matches(Path::new("build/output.txt"), false));
        assert!(rules.matches(Path::new("top.txt"), false));

        // Anchored pattern only applies at the root
        assert!(!rules.matches(Path::new("sub/top.txt"), false));
        // Directory-only pattern does not hit a file of that name
        assert!(!rules.matches(Path::new("build"), false));
    }

    #[test]
    fn test_negation_overrides_earlier_pattern() {
        let rules = rules(&["*.log", "!keep.log"]);

        assert!(rules.matches(Path::new("drop.log"), false));
        assert!(!rules.matches(Path::new("keep.log"), false));
    }

    #[test]
    fn test_blank_patterns_are_skipped() {
        let rules = rules(&["", "   "]);
        assert!(!rules.matches(Path::new("anything"), false));
        assert_eq!(rules.patterns().len(), 2);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let patterns = vec!["ok.txt".to_string(), "broken[".to_string()];
        match IgnoreRules::new(Path::new("/watched"), &patterns) {
            Err(WatchError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "broken["),
            other => panic!("expected invalid pattern, got {:?}", other),
        }
    }
}
