use crate::event::OpSet;

/// How one root is watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// List dot-prefixed entries
    pub include_hidden: bool,
    /// Gitignore-style patterns, relative to the root
    pub ignore: Vec<String>,
    /// Operations reported for this root
    pub ops: OpSet,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_hidden: false,
            ignore: Vec::new(),
            ops: OpSet::ALL,
        }
    }
}
