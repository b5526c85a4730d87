//! Regex path matching for block and hash-allow decisions.

use std::path::Path;

use regex::{Regex, RegexSet};

use crate::error::ConfigError;

/// Paths the walker never enters by default: device nodes and procfs.
pub const DEFAULT_BLOCK_PATTERNS: &[&str] = &["^/dev(/|$)", "^/proc(/|$)"];

/// A compiled set of path patterns with any-match semantics.
///
/// Immutable once built, so it can be shared across entry tasks freely.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    set: RegexSet,
}

impl PathMatcher {
    /// Compile a list of regex patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_owned())
            .collect();

        // Compile one by one first so a failure names the offending pattern.
        for (index, pattern) in patterns.iter().enumerate() {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                index,
                pattern: pattern.clone(),
                source,
            })?;
        }

        let set = RegexSet::new(&patterns)
            .map_err(|e| ConfigError::invalid(format!("pattern set: {e}")))?;
        Ok(Self { set })
    }

    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    /// Compile patterns given as a JSON array of strings.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(parse_pattern_list(json)?)
    }

    /// Whether `path` matches any pattern.
    pub fn matches(&self, path: &Path) -> bool {
        self.set.is_match(&path.to_string_lossy())
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Check if the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parse a JSON array of pattern strings, e.g. `["^/tmp", "\\.log$"]`.
pub fn parse_pattern_list(json: &str) -> Result<Vec<String>, ConfigError> {
    serde_json::from_str(json).map_err(|source| ConfigError::InvalidJson { source })
}

/// Which regular files get their content hashed.
#[derive(Debug, Clone)]
pub enum HashPolicy {
    /// Hash every eligible regular file.
    All,
    /// Hash regular files whose path matches the allow set.
    Matching(PathMatcher),
}

impl HashPolicy {
    /// Never hash anything.
    pub fn none() -> Self {
        HashPolicy::Matching(PathMatcher::empty())
    }

    /// Whether the policy allows hashing `path`. Size and file type are the
    /// walker's concern.
    pub fn allows(&self, path: &Path) -> bool {
        match self {
            HashPolicy::All => true,
            HashPolicy::Matching(matcher) => matcher.matches(path),
        }
    }
}

impl Default for HashPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_match() {
        let matcher = PathMatcher::new(["^/tmp/", r"\.log$"]).unwrap();
        assert!(matcher.matches(Path::new("/tmp/x")));
        assert!(matcher.matches(Path::new("/var/app.log")));
        assert!(!matcher.matches(Path::new("/var/app.txt")));
    }

    #[test]
    fn test_empty_matches_nothing() {
        let matcher = PathMatcher::empty();
        assert!(!matcher.matches(Path::new("/")));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_invalid_pattern_names_index() {
        let err = PathMatcher::new(["ok", "(unclosed"]).unwrap_err();
        match err {
            ConfigError::InvalidPattern { index, pattern, .. } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_blocks() {
        let blocks = PathMatcher::new(DEFAULT_BLOCK_PATTERNS).unwrap();
        assert!(blocks.matches(Path::new("/dev")));
        assert!(blocks.matches(Path::new("/dev/null")));
        assert!(blocks.matches(Path::new("/proc/1/mem")));
        assert!(!blocks.matches(Path::new("/devel")));
        assert!(!blocks.matches(Path::new("/home/dev")));
    }

    #[test]
    fn test_from_json() {
        let matcher = PathMatcher::from_json(r#"["^/a", "^/b"]"#).unwrap();
        assert_eq!(matcher.len(), 2);
        assert!(matches!(
            PathMatcher::from_json("not json"),
            Err(ConfigError::InvalidJson { .. })
        ));
        assert!(matches!(
            PathMatcher::from_json("[1, 2]"),
            Err(ConfigError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_hash_policy() {
        assert!(HashPolicy::All.allows(Path::new("/anything")));
        assert!(!HashPolicy::none().allows(Path::new("/anything")));
        let policy = HashPolicy::Matching(PathMatcher::new([r"\.bin$"]).unwrap());
        assert!(policy.allows(Path::new("/x/y.bin")));
        assert!(!policy.allows(Path::new("/x/y.txt")));
    }
}
