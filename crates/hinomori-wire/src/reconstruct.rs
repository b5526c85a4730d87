//! Replay of a step stream into file records with full paths.

use std::io::Read;
use std::path::PathBuf;

use hinomori_core::{FileRecord, PathCursor, Step};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::codec::StepDecoder;
use crate::error::WireError;

/// A file record placed in its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedFile {
    /// Absolute path of the enclosing directory.
    pub dir: PathBuf,
    /// The record as it was emitted.
    pub record: FileRecord,
}

impl ReconstructedFile {
    /// Full path of the entry.
    pub fn path(&self) -> PathBuf {
        self.dir.join(self.record.name.as_str())
    }
}

/// Tracks the current directory while folding over steps.
///
/// Steps must be applied in stream order: a file step belongs to whatever
/// directory the movements before it arrived at.
#[derive(Debug, Default)]
pub struct TreeReconstructor {
    cursor: PathCursor,
}

impl TreeReconstructor {
    /// Start at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one step. Only file steps yield a record.
    pub fn apply(&mut self, step: Step) -> Option<ReconstructedFile> {
        match step {
            Step::File(record) => Some(ReconstructedFile {
                dir: self.cursor.path(),
                record,
            }),
            Step::Up(count) => {
                let climbed = self.cursor.up(count);
                if climbed < count as usize {
                    trace!(count, climbed, "up clamped at root");
                }
                None
            }
            Step::Down(name) => {
                self.cursor.down(&name);
                None
            }
        }
    }

    /// The directory the next file step would land in.
    pub fn current_dir(&self) -> PathBuf {
        self.cursor.path()
    }
}

/// Iterator of reconstructed files read straight from a stream.
#[derive(Debug)]
pub struct Records<R: Read> {
    decoder: StepDecoder<R>,
    tree: TreeReconstructor,
}

impl<R: Read> Records<R> {
    /// Check the magic and prepare to read records.
    pub fn new(reader: R) -> Result<Self, WireError> {
        Ok(Self {
            decoder: StepDecoder::new(reader)?,
            tree: TreeReconstructor::new(),
        })
    }

    /// Frames consumed so far.
    pub fn frames(&self) -> u64 {
        self.decoder.frames()
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<ReconstructedFile, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.decoder.next()? {
                Ok(step) => {
                    if let Some(file) = self.tree.apply(step) {
                        return Some(Ok(file));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Read a whole stream into records.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ReconstructedFile>, WireError> {
    Records::new(reader)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Step {
        Step::File(FileRecord::new(name, 0o100_644, 1))
    }

    #[test]
    fn test_file_lands_in_cursor_dir() {
        let mut tree = TreeReconstructor::new();
        assert!(tree.apply(Step::Down("srv/data".into())).is_none());
        let out = tree.apply(file("a")).unwrap();
        assert_eq!(out.dir, PathBuf::from("/srv/data"));
        assert_eq!(out.path(), PathBuf::from("/srv/data/a"));
    }

    #[test]
    fn test_up_then_down() {
        let mut tree = TreeReconstructor::new();
        tree.apply(Step::Down("a/b/c".into()));
        tree.apply(Step::Up(2));
        tree.apply(Step::Down("x".into()));
        assert_eq!(tree.current_dir(), PathBuf::from("/a/x"));
    }

    #[test]
    fn test_up_past_root_clamps() {
        let mut tree = TreeReconstructor::new();
        tree.apply(Step::Down("a".into()));
        tree.apply(Step::Up(5));
        assert_eq!(tree.current_dir(), PathBuf::from("/"));
        let out = tree.apply(file("f")).unwrap();
        assert_eq!(out.path(), PathBuf::from("/f"));
    }

    #[test]
    fn test_absolute_down_name() {
        // A down carrying a leading separator still descends from the cursor.
        let mut tree = TreeReconstructor::new();
        tree.apply(Step::Down("/tmp/x".into()));
        assert_eq!(tree.current_dir(), PathBuf::from("/tmp/x"));
    }
}
