//! Walk configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matcher::{DEFAULT_BLOCK_PATTERNS, HashPolicy, PathMatcher};

/// Configuration for a snapshot walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Root path to walk.
    pub root: PathBuf,

    /// Regex patterns for paths to leave out, subtree included.
    #[builder(default)]
    #[serde(default)]
    pub block_patterns: Vec<String>,

    /// Skip the built-in `/dev` and `/proc` blocks.
    #[builder(default = "false")]
    #[serde(default)]
    pub no_default_blocks: bool,

    /// Regex patterns for paths whose content is hashed.
    #[builder(default)]
    #[serde(default)]
    pub hash_patterns: Vec<String>,

    /// Hash every regular file. Overrides `hash_patterns`.
    #[builder(default = "false")]
    #[serde(default)]
    pub hash_all: bool,

    /// Threads for per-directory fan-out (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Steps buffered between the walker and the writer.
    #[builder(default = "1024")]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1024
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.channel_capacity == Some(0) {
            return Err("Channel capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a simple config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            block_patterns: Vec::new(),
            no_default_blocks: false,
            hash_patterns: Vec::new(),
            hash_all: false,
            threads: 0,
            channel_capacity: default_channel_capacity(),
        }
    }

    /// Compile the pattern lists.
    pub fn compile(&self) -> Result<WalkPolicy, ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::invalid("Root path cannot be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::invalid("Channel capacity must be at least 1"));
        }

        let defaults: &[&str] = if self.no_default_blocks {
            &[]
        } else {
            DEFAULT_BLOCK_PATTERNS
        };
        let block = PathMatcher::new(
            defaults
                .iter()
                .copied()
                .chain(self.block_patterns.iter().map(String::as_str)),
        )?;

        let hash = if self.hash_all {
            HashPolicy::All
        } else {
            HashPolicy::Matching(PathMatcher::new(&self.hash_patterns)?)
        };

        Ok(WalkPolicy { block, hash })
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Compiled matchers for a walk. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct WalkPolicy {
    /// Paths excluded from traversal and output.
    pub block: PathMatcher,
    /// Which regular files get hashed.
    pub hash: HashPolicy,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WalkConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .hash_all(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert!(config.hash_all);
        assert_eq!(config.channel_capacity, 1024);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(WalkConfig::builder().build().is_err());
        assert!(WalkConfig::builder().root("").build().is_err());
        assert!(
            WalkConfig::builder()
                .root("/x")
                .channel_capacity(0usize)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_compile_includes_default_blocks() {
        let policy = WalkConfig::new("/").compile().unwrap();
        assert!(policy.block.matches(Path::new("/proc/self")));

        let mut config = WalkConfig::new("/");
        config.no_default_blocks = true;
        let policy = config.compile().unwrap();
        assert!(!policy.block.matches(Path::new("/proc/self")));
    }

    #[test]
    fn test_compile_user_blocks() {
        let config = WalkConfig::builder()
            .root("/")
            .block_patterns(vec!["^/srv/cache".to_string()])
            .build()
            .unwrap();
        let policy = config.compile().unwrap();
        assert!(policy.block.matches(Path::new("/srv/cache/x")));
        assert!(policy.block.matches(Path::new("/dev/null")));
    }

    #[test]
    fn test_hash_all_takes_precedence() {
        let config = WalkConfig::builder()
            .root("/")
            .hash_all(true)
            .hash_patterns(vec![r"\.never$".to_string()])
            .build()
            .unwrap();
        let policy = config.compile().unwrap();
        assert!(matches!(policy.hash, HashPolicy::All));
    }

    #[test]
    fn test_compile_rejects_bad_regex() {
        let config = WalkConfig::builder()
            .root("/")
            .hash_patterns(vec!["[".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidPattern { index: 0, .. })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: WalkConfig =
            serde_json::from_str(r#"{"root": "/data", "hash_all": true}"#).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert!(config.hash_all);
        assert_eq!(config.channel_capacity, 1024);
        assert!(config.block_patterns.is_empty());
    }
}
