//! File system walker for hinomori.
//!
//! This crate walks a directory tree breadth-first and turns it into a
//! stream of steps: cursor movements between directories and one file step
//! per entry, with optional XXH64 content hashes.
//!
//! # Overview
//!
//! - **Breadth-first traversal** with one directory in flight at a time
//! - **Parallel entry processing** (stat + hash) via rayon
//! - **Backpressure** from the stream writer through a bounded channel
//! - **Progress updates** via broadcast channels
//! - **Regex block and hash-allow sets**
//!
//! # Example
//!
//! ```rust,no_run
//! use hinomori_scan::{TreeWalker, WalkConfig};
//!
//! let config = WalkConfig::builder()
//!     .root("/srv")
//!     .hash_all(true)
//!     .build()
//!     .unwrap();
//! let walker = TreeWalker::new(&config).unwrap();
//!
//! let out = std::io::BufWriter::new(std::io::stdout().lock());
//! let summary = walker.write_snapshot(out).unwrap();
//! eprintln!("{} files", summary.walk.files_emitted);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use hinomori_scan::{TreeWalker, WalkConfig};
//!
//! let walker = TreeWalker::new(&WalkConfig::new("/srv")).unwrap();
//! let mut progress_rx = walker.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("{} directories walked", progress.dirs_visited);
//!     }
//! });
//! ```

mod hasher;
mod progress;
mod snapshot;
mod walker;

pub use hasher::{ContentHasher, HASH_SEED, HashError};
pub use progress::{CADENCE_CUTOFF, ProgressCadence, WalkProgress, WalkStats};
pub use snapshot::{SnapshotError, SnapshotSummary};
pub use walker::TreeWalker;

// Re-export core types for convenience
pub use hinomori_core::{
    ConfigError, ContentHash, FileRecord, HashPolicy, PathMatcher, ScanError, Step, WalkConfig,
    WalkPolicy,
};
