//! Core types for hinomori.
//!
//! This crate provides the data model shared by the walker and the wire
//! codec: file records, steps, the path cursor with its delta encoding, and
//! the regex matchers that drive block and hashing decisions.

mod config;
mod cursor;
mod error;
mod matcher;
mod record;
mod step;

pub use config::{WalkConfig, WalkConfigBuilder, WalkPolicy};
pub use cursor::{PathCursor, PathDelta, WIRE_SEPARATOR, path_components};
pub use error::{ConfigError, ScanError};
pub use matcher::{DEFAULT_BLOCK_PATTERNS, HashPolicy, PathMatcher, parse_pattern_list};
pub use record::{ContentHash, FileKind, FileRecord, MODE_TYPE_MASK};
pub use step::Step;
