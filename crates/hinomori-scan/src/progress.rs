//! Walk progress reporting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Directories popped before the cadence stops doubling.
pub const CADENCE_CUTOFF: u64 = 65_536;

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Directories popped from the queue so far.
    pub dirs_visited: u64,
    /// File steps emitted so far.
    pub files_emitted: u64,
    /// Sum of the sizes of emitted entries.
    pub bytes_seen: u64,
    /// Files whose hashing failed.
    pub hash_errors: u64,
    /// Directories waiting in the queue.
    pub queued_dirs: u64,
    /// Directory being processed.
    pub current_dir: PathBuf,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_visited: 0,
            files_emitted: 0,
            bytes_seen: 0,
            hash_errors: 0,
            queued_dirs: 0,
            current_dir: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate walk rate in entries per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_emitted as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for WalkProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Totals for a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories popped from the queue.
    pub dirs_visited: u64,
    /// File steps emitted.
    pub files_emitted: u64,
    /// Sum of entry sizes.
    pub bytes_seen: u64,
    /// Files hashed successfully.
    pub files_hashed: u64,
    /// Files whose hashing failed.
    pub hash_errors: u64,
    /// Directories that could not be listed.
    pub list_errors: u64,
    /// Entries dropped because stat failed.
    pub stat_errors: u64,
    /// Entries skipped by the block set.
    pub blocked: u64,
}

/// Counters shared by the driver and the entry tasks.
#[derive(Debug, Default)]
pub(crate) struct WalkCounters {
    dirs_visited: AtomicU64,
    files_emitted: AtomicU64,
    bytes_seen: AtomicU64,
    files_hashed: AtomicU64,
    hash_errors: AtomicU64,
    list_errors: AtomicU64,
    stat_errors: AtomicU64,
    blocked: AtomicU64,
}

impl WalkCounters {
    pub fn record_dir(&self) -> u64 {
        self.dirs_visited.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_file(&self, size: u64) {
        self.files_emitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_seen.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_hashed(&self) {
        self.files_hashed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hash_error(&self) {
        self.hash_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_list_error(&self) {
        self.list_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stat_error(&self) {
        self.stat_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> WalkStats {
        WalkStats {
            dirs_visited: self.dirs_visited.load(Ordering::Relaxed),
            files_emitted: self.files_emitted.load(Ordering::Relaxed),
            bytes_seen: self.bytes_seen.load(Ordering::Relaxed),
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            hash_errors: self.hash_errors.load(Ordering::Relaxed),
            list_errors: self.list_errors.load(Ordering::Relaxed),
            stat_errors: self.stat_errors.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }

    pub fn progress(
        &self,
        queued_dirs: usize,
        current_dir: PathBuf,
        elapsed: Duration,
    ) -> WalkProgress {
        let stats = self.stats();
        WalkProgress {
            dirs_visited: stats.dirs_visited,
            files_emitted: stats.files_emitted,
            bytes_seen: stats.bytes_seen,
            hash_errors: stats.hash_errors,
            queued_dirs: queued_dirs as u64,
            current_dir,
            elapsed,
        }
    }
}

/// Decides when to report: at 1, 2, 4, ... up to [`CADENCE_CUTOFF`], then
/// every [`CADENCE_CUTOFF`] after that.
#[derive(Debug, Clone)]
pub struct ProgressCadence {
    next: u64,
}

impl ProgressCadence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Whether `count` is a reporting point. Call with every count in turn.
    pub fn is_due(&mut self, count: u64) -> bool {
        if count != self.next {
            return false;
        }
        if self.next < CADENCE_CUTOFF {
            self.next *= 2;
        } else {
            self.next += CADENCE_CUTOFF;
        }
        true
    }
}

impl Default for ProgressCadence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_doubles_then_goes_linear() {
        let mut cadence = ProgressCadence::new();
        let due: Vec<u64> = (1..=4 * CADENCE_CUTOFF)
            .filter(|&n| cadence.is_due(n))
            .collect();

        let mut expected: Vec<u64> = (0..=16).map(|shift| 1u64 << shift).collect();
        expected.extend([2 * CADENCE_CUTOFF, 3 * CADENCE_CUTOFF, 4 * CADENCE_CUTOFF]);
        assert_eq!(due, expected);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = WalkCounters::default();
        counters.record_dir();
        counters.record_file(10);
        counters.record_file(5);
        counters.record_hash_error();
        let stats = counters.stats();
        assert_eq!(stats.dirs_visited, 1);
        assert_eq!(stats.files_emitted, 2);
        assert_eq!(stats.bytes_seen, 15);
        assert_eq!(stats.hash_errors, 1);
    }

    #[test]
    fn test_files_per_second() {
        let mut progress = WalkProgress::new();
        assert_eq!(progress.files_per_second(), 0.0);
        progress.files_emitted = 100;
        progress.elapsed = Duration::from_secs(2);
        assert_eq!(progress.files_per_second(), 50.0);
    }
}
