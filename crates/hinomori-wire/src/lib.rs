//! Snapshot stream encoding for hinomori.
//!
//! A snapshot is the magic `hino` followed by length-prefixed protobuf
//! frames, one [`Step`](hinomori_core::Step) each. Paths never appear in
//! full: the stream moves a cursor up and down the tree and file steps are
//! read relative to it.
//!
//! # Example
//!
//! ```rust
//! use hinomori_core::{FileRecord, Step};
//! use hinomori_wire::{StepEncoder, read_records};
//!
//! let mut encoder = StepEncoder::new(Vec::new()).unwrap();
//! encoder.encode(&Step::Down("srv".into())).unwrap();
//! encoder.encode(&Step::File(FileRecord::new("a.txt", 0o100_644, 4))).unwrap();
//! let bytes = encoder.into_inner().unwrap();
//!
//! let records = read_records(bytes.as_slice()).unwrap();
//! assert_eq!(records[0].path(), std::path::PathBuf::from("/srv/a.txt"));
//! ```

mod codec;
mod error;
pub mod proto;
mod reconstruct;

pub use codec::{MAGIC, MAX_FRAME_LEN, StepDecoder, StepEncoder};
pub use error::WireError;
pub use reconstruct::{ReconstructedFile, Records, TreeReconstructor, read_records};
