//! Step events, the unit of the snapshot stream.

use serde::{Deserialize, Serialize};

use crate::record::FileRecord;

/// One unit of the snapshot stream.
///
/// `Up` and `Down` reposition the current directory; `File` describes an
/// entry of whatever directory the preceding steps left the cursor in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// An entry of the current directory.
    File(FileRecord),
    /// Leave this many directory levels. Never zero.
    Up(u32),
    /// Enter one or more directories, joined by `/`.
    Down(String),
}

impl Step {
    /// Check if this is a file step.
    pub fn is_file(&self) -> bool {
        matches!(self, Step::File(_))
    }
}

impl From<FileRecord> for Step {
    fn from(record: FileRecord) -> Self {
        Step::File(record)
    }
}
