//! snapwatch.toml loading and validation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sw_core::HashAlgorithm;
use watcher::{OpSet, WatchOptions};

/// Config file name, looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "snapwatch.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no paths to watch, add at least one [[watch]] entry with paths")]
    NothingToWatch,

    #[error("interval_secs must be at least 1")]
    ZeroInterval,

    #[error("invalid actions in [[watch]] #{index}: {source}")]
    Actions {
        index: usize,
        #[source]
        source: watcher::WatchError,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest used for content identity
    pub hash_algorithm: String,

    /// Hash cache location; `data/hashing.db` next to the executable if unset
    pub hash_cache: Option<PathBuf>,

    /// Seconds between scans of `snapwatch watch`
    pub interval_secs: u64,

    /// Seconds to wait for a store locked by another process
    pub lock_timeout_secs: u64,

    /// Watched roots, grouped by shared options
    pub watch: Vec<WatchConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default().name().to_string(),
            hash_cache: None,
            interval_secs: 60,
            lock_timeout_secs: 5,
            watch: Vec::new(),
        }
    }
}

/// One `[[watch]]` group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub include_hidden: bool,
    pub ignore: Vec<String>,
    /// Reported operations; empty means all
    pub actions: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            recursive: true,
            include_hidden: false,
            ignore: Vec::new(),
            actions: Vec::new(),
        }
    }
}

impl WatchConfig {
    pub fn ops(&self) -> Result<OpSet, watcher::WatchError> {
        OpSet::from_names(&self.actions)
    }

    pub fn options(&self) -> Result<WatchOptions, watcher::WatchError> {
        Ok(WatchOptions {
            recursive: self.recursive,
            include_hidden: self.include_hidden,
            ignore: self.ignore.clone(),
            ops: self.ops()?,
        })
    }
}

impl Config {
    /// Read and validate the config at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, path)?;
        config.resolve_relative_to(path.parent().unwrap_or_else(|| Path::new(".")));
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A relative hash cache path is taken relative to the config file
    fn resolve_relative_to(&mut self, dir: &Path) {
        if let Some(cache) = &self.hash_cache {
            if cache.is_relative() {
                self.hash_cache = Some(dir.join(cache));
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.iter().all(|w| w.paths.is_empty()) {
            return Err(ConfigError::NothingToWatch);
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        for (index, watch) in self.watch.iter().enumerate() {
            watch
                .ops()
                .map_err(|source| ConfigError::Actions { index, source })?;
        }
        Ok(())
    }

    /// Configured algorithm, falling back to the default on unknown names
    pub fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::from_name_or_default(&self.hash_algorithm)
    }

    /// Where the hash cache lives, if anywhere
    pub fn hash_cache_path(&self) -> Option<PathBuf> {
        self.hash_cache.clone().or_else(store::HashCache::default_path)
    }

    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lock_timeout_secs)
    }
}

/// `snapwatch.toml` next to the running executable
pub fn default_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(CONFIG_FILE_NAME))
}

/// Commented example configuration
pub fn example_config() -> &'static str {
    r#"# snapwatch configuration

# Digest used to recognize moved and renamed files:
# blake3, sha1, sha256, sha512, crc32, xxh3
hash_algorithm = "blake3"

# Seconds between scans of `snapwatch watch`
interval_secs = 60

# Seconds to wait for a store locked by another process
lock_timeout_secs = 5

# Shared digest cache, relative to this file (default: data/hashing.db next
# to the executable). Safe to delete.
# hash_cache = "data/hashing.db"

[[watch]]
paths = ["/srv/share", "/home/me/documents"]
recursive = true
include_hidden = false
# gitignore syntax, relative to each root
ignore = ["*.tmp", "cache/"]
# create, write, remove, rename, move, chmod (empty: all)
actions = []
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use watcher::Op;

    fn parse(content: &str) -> Config {
        Config::parse(content, Path::new("snapwatch.toml")).unwrap()
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse(example_config());
        config.validate().unwrap();

        assert_eq!(config.algorithm(), HashAlgorithm::Blake3);
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.watch.iter().map(|w| w.paths.len()).sum::<usize>(), 2);

        let options = config.watch[0].options().unwrap();
        assert!(options.recursive);
        assert!(!options.include_hidden);
        assert_eq!(options.ops, OpSet::ALL);
        assert_eq!(options.ignore, vec!["*.tmp", "cache/"]);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = parse("[[watch]]\npaths = [\"/data\"]\n");

        assert_eq!(config.hash_algorithm, "blake3");
        assert_eq!(config.lock_timeout().as_secs(), 5);
        assert!(config.hash_cache.is_none());
        assert!(config.watch[0].recursive);
        config.validate().unwrap();
    }

    #[test]
    fn test_actions_become_op_set() {
        let config = parse("[[watch]]\npaths = [\"/data\"]\nactions = [\"Create\", \"MOVE\"]\n");
        let ops = config.watch[0].ops().unwrap();

        assert!(ops.contains(Op::Create));
        assert!(ops.contains(Op::Move));
        assert!(!ops.contains(Op::Remove));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(parse("").validate(), Err(ConfigError::NothingToWatch)));
        assert!(matches!(
            parse("interval_secs = 0\n[[watch]]\npaths = [\"/d\"]\n").validate(),
            Err(ConfigError::ZeroInterval)
        ));
        assert!(matches!(
            parse("[[watch]]\npaths = [\"/d\"]\n[[watch]]\npaths = [\"/e\"]\nactions = [\"teleport\"]\n").validate(),
            Err(ConfigError::Actions { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_algorithm_falls_back() {
        let config = parse("hash_algorithm = \"md5\"\n[[watch]]\npaths = [\"/d\"]\n");
        assert_eq!(config.algorithm(), HashAlgorithm::Blake3);
    }

    #[test]
    fn test_load_resolves_cache_next_to_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "hash_cache = \"cache/hashing.db\"\n[[watch]]\npaths = [\"/d\"]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.hash_cache_path().unwrap(),
            temp_dir.path().join("cache/hashing.db")
        );
    }

    #[test]
    fn test_load_reports_missing_and_malformed_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Read { .. })));

        let broken = temp_dir.path().join("broken.toml");
        std::fs::write(&broken, "watch = [[[").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }
}
