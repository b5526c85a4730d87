//! The walker-to-stream pipeline.

use std::io::Write;
use std::thread;

use hinomori_core::{ScanError, Step};
use hinomori_wire::{StepEncoder, WireError};
use thiserror::Error;
use tracing::debug;

use crate::progress::WalkStats;
use crate::walker::TreeWalker;

/// Errors while producing a snapshot stream.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("walk: {0}")]
    Walk(#[from] ScanError),

    #[error("write: {0}")]
    Wire(#[from] WireError),
}

/// Totals for a written snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// What the walker saw.
    pub walk: WalkStats,
    /// Frames written.
    pub frames: u64,
    /// Bytes written, magic included.
    pub bytes: u64,
}

impl TreeWalker {
    /// Walk the tree and write the complete stream to `out`.
    ///
    /// The walk runs on its own thread and hands steps over a bounded
    /// channel; this thread is the only writer. A slow `out` therefore
    /// throttles the walk. The writer is flushed but not closed.
    pub fn write_snapshot<W: Write>(&self, out: W) -> Result<SnapshotSummary, SnapshotError> {
        let mut encoder = StepEncoder::new(out)?;
        let (tx, rx) = crossbeam_channel::bounded::<Step>(self.channel_capacity());

        let (write_result, walk_result) = thread::scope(|scope| {
            let walk = scope.spawn(move || self.walk(&tx));

            let mut write_result = Ok(());
            for step in rx.iter() {
                if let Err(err) = encoder.encode(&step) {
                    write_result = Err(err);
                    break;
                }
            }
            // Unblocks the walker if we stopped early.
            drop(rx);

            match walk.join() {
                Ok(walk_result) => (write_result, walk_result),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });

        // A write failure makes the walker see a disconnect; report the cause.
        write_result?;
        let walk = walk_result?;
        encoder.flush()?;

        debug!(frames = encoder.frames(), bytes = encoder.bytes(), "snapshot written");
        Ok(SnapshotSummary {
            walk,
            frames: encoder.frames(),
            bytes: encoder.bytes(),
        })
    }
}
