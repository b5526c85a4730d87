//! Breadth-first tree walker with per-directory fan-out.

use std::collections::VecDeque;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use crossbeam_channel::Sender;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use hinomori_core::{
    ConfigError, FileRecord, PathCursor, ScanError, Step, WalkConfig, WalkPolicy,
};

use crate::hasher::ContentHasher;
use crate::progress::{ProgressCadence, WalkCounters, WalkProgress, WalkStats};

/// A directory waiting to be listed.
#[derive(Debug, Clone)]
struct DirectoryItem {
    path: PathBuf,
    is_root: bool,
}

/// Walks a tree and emits the steps describing it.
///
/// Directories are processed one at a time in breadth-first order. The
/// entries of a directory are stat'ed and hashed in parallel, and all of them
/// finish before the next directory is popped, so at most one directory's
/// worth of work is in flight.
pub struct TreeWalker {
    root: PathBuf,
    policy: WalkPolicy,
    hasher: ContentHasher,
    pool: ThreadPool,
    channel_capacity: usize,
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl TreeWalker {
    /// Create a walker from a config. Fails on malformed patterns.
    pub fn new(config: &WalkConfig) -> Result<Self, ConfigError> {
        let policy = config.compile()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("hinomori-walk-{i}"))
            .build()
            .map_err(|e| ConfigError::invalid(format!("thread pool: {e}")))?;
        let (progress_tx, _) = broadcast::channel(100);

        Ok(Self {
            root: config.root.clone(),
            policy,
            hasher: ContentHasher::new(),
            pool,
            channel_capacity: config.channel_capacity,
            progress_tx,
        })
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Capacity for the channel between walker and writer.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Walk the tree, sending steps to `steps`.
    ///
    /// Only a bad root or a vanished consumer stops the walk; listing, stat
    /// and hash failures are logged and counted in the returned stats.
    pub fn walk(&self, steps: &Sender<Step>) -> Result<WalkStats, ScanError> {
        let start = Instant::now();
        let root = self
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&self.root, e))?;
        let root_metadata = fs::metadata(&root).map_err(|e| ScanError::io(&root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let counters = WalkCounters::default();
        let mut cadence = ProgressCadence::new();
        let mut cursor = PathCursor::new();
        let mut queue = VecDeque::from([DirectoryItem {
            path: root,
            is_root: true,
        }]);

        while let Some(dir) = queue.pop_front() {
            let visited = counters.record_dir();
            if cadence.is_due(visited) {
                info!(dirs = visited, queued = queue.len(), "progress");
                let _ = self.progress_tx.send(counters.progress(
                    queue.len(),
                    dir.path.clone(),
                    start.elapsed(),
                ));
            }

            let entries = self.list(&dir.path, &counters);
            if entries.is_empty() {
                continue;
            }

            // The cursor starts at the root, so the first directory is
            // reached by a pure descent.
            let delta = cursor.move_to(&dir.path);
            debug_assert!(!dir.is_root || delta.up == 0);
            debug!(dir = %dir.path.display(), up = delta.up, down = %delta.down_name(), "enter");
            for step in delta.steps() {
                steps.send(step).map_err(|_| ScanError::Disconnected)?;
            }

            let subdirs = self.pool.install(|| {
                entries
                    .into_par_iter()
                    .map(|entry| self.visit(entry, steps, &counters))
                    .collect::<Result<Vec<_>, ScanError>>()
            })?;

            queue.extend(subdirs.into_iter().flatten().map(|path| DirectoryItem {
                path,
                is_root: false,
            }));
        }

        let stats = counters.stats();
        let _ = self
            .progress_tx
            .send(counters.progress(0, PathBuf::new(), start.elapsed()));
        info!(
            dirs = stats.dirs_visited,
            files = stats.files_emitted,
            hash_errors = stats.hash_errors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "walk finished"
        );
        Ok(stats)
    }

    /// List a directory, dropping blocked entries. A directory that can't be
    /// read counts as empty.
    fn list(&self, dir: &Path, counters: &WalkCounters) -> Vec<DirEntry> {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "read dir failed");
                counters.record_list_error();
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(entry) => {
                    if self.policy.block.matches(&entry.path()) {
                        counters.record_blocked();
                        continue;
                    }
                    entries.push(entry);
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "read dir entry failed");
                    counters.record_list_error();
                }
            }
        }
        entries
    }

    /// Stat one entry, hash it if eligible and emit its file step. Returns the
    /// entry's path if it is a directory to descend into.
    fn visit(
        &self,
        entry: DirEntry,
        steps: &Sender<Step>,
        counters: &WalkCounters,
    ) -> Result<Option<PathBuf>, ScanError> {
        let path = entry.path();
        // Does not follow symlinks, so a link to a directory is never entered.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "stat failed");
                counters.record_stat_error();
                return Ok(None);
            }
        };
        let file_type = metadata.file_type();

        let mut record = FileRecord::new(
            entry.file_name().to_string_lossy(),
            file_mode(&metadata),
            metadata.len(),
        )
        .with_owner(get_uid(&metadata), get_gid(&metadata));

        if file_type.is_file() && metadata.len() > 0 && self.policy.hash.allows(&path) {
            match self.hasher.hash(&path) {
                Ok(hash) => {
                    counters.record_hashed();
                    record.hash = Some(hash);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "hash failed");
                    counters.record_hash_error();
                    record.hash_error = Some(err.to_string());
                }
            }
        }

        counters.record_file(record.size);
        steps
            .send(Step::File(record))
            .map_err(|_| ScanError::Disconnected)?;

        Ok(file_type.is_dir().then_some(path))
    }
}

impl std::fmt::Debug for TreeWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWalker")
            .field("root", &self.root)
            .field("policy", &self.policy)
            .field("threads", &self.pool.current_num_threads())
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

// Cross-platform metadata helpers

/// Get the Unix mode (type and permission bits).
#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use hinomori_core::FileKind;

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_file() {
        FileKind::Regular
    } else {
        FileKind::Unknown
    };
    let perm = if metadata.permissions().readonly() { 0o444 } else { 0o644 };
    kind.type_bits() | perm
}

/// Get the owning user id.
#[cfg(unix)]
fn get_uid(metadata: &fs::Metadata) -> u32 {
    metadata.uid()
}

#[cfg(not(unix))]
fn get_uid(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Get the owning group id.
#[cfg(unix)]
fn get_gid(metadata: &fs::Metadata) -> u32 {
    metadata.gid()
}

#[cfg(not(unix))]
fn get_gid(_metadata: &fs::Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn walk(config: &WalkConfig) -> (Vec<Step>, WalkStats) {
        let walker = TreeWalker::new(config).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = walker.walk(&tx).unwrap();
        drop(tx);
        (rx.iter().collect(), stats)
    }

    #[test]
    fn test_basic_walk() {
        let temp = create_test_tree();
        let (steps, stats) = walk(&WalkConfig::new(temp.path()));

        // 3 directories + 4 files, each exactly once
        assert_eq!(steps.iter().filter(|s| s.is_file()).count(), 7);
        assert_eq!(stats.files_emitted, 7);
        // root, dir1, dir2, subdir
        assert_eq!(stats.dirs_visited, 4);
        assert_eq!(stats.files_hashed, 0);
    }

    #[test]
    fn test_first_step_descends_to_root() {
        let temp = create_test_tree();
        let root = temp.path().canonicalize().unwrap();
        let (steps, _) = walk(&WalkConfig::new(temp.path()));

        let expected = PathCursor::new().delta_to(&root).steps();
        assert_eq!(&steps[..expected.len()], expected.as_slice());
        assert!(!matches!(steps[0], Step::Up(_)));
    }

    #[test]
    fn test_breadth_first_order() {
        let temp = create_test_tree();
        let (steps, _) = walk(&WalkConfig::new(temp.path()));

        let mut cursor = PathCursor::new();
        let mut depths = Vec::new();
        for step in &steps {
            cursor.apply(step);
            if step.is_file() {
                depths.push(cursor.depth());
            }
        }
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let walker = TreeWalker::new(&WalkConfig::new(temp.path().join("nope"))).unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();
        assert!(matches!(walker.walk(&tx), Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "x").unwrap();
        let walker = TreeWalker::new(&WalkConfig::new(&file)).unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();
        assert!(matches!(
            walker.walk(&tx),
            Err(ScanError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_disconnected_consumer_stops_walk() {
        let temp = create_test_tree();
        let walker = TreeWalker::new(&WalkConfig::new(temp.path())).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        assert!(matches!(walker.walk(&tx), Err(ScanError::Disconnected)));
    }

    #[test]
    fn test_empty_root_emits_nothing() {
        let temp = TempDir::new().unwrap();
        let (steps, stats) = walk(&WalkConfig::new(temp.path()));
        assert!(steps.is_empty());
        assert_eq!(stats.dirs_visited, 1);
    }
}
