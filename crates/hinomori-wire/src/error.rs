//! Errors for the step stream.

use thiserror::Error;

/// Errors while writing or reading a step stream.
///
/// Every read-side variant except [`WireError::Io`] means the stream is
/// corrupt; there is no way to resynchronize, so decoding stops.
#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before the magic was complete.
    #[error("stream ended inside the magic ({got} of 4 bytes)")]
    MissingMagic { got: usize },

    /// The stream does not start with the expected magic.
    #[error("invalid magic {found:?}")]
    BadMagic { found: [u8; 4] },

    /// The stream ended inside a length prefix.
    #[error("truncated length prefix ({got} of 8 bytes)")]
    TruncatedLength { got: usize },

    /// The stream ended inside a frame payload.
    #[error("truncated frame: want {expected} bytes, got {got}")]
    TruncatedFrame { expected: u64, got: u64 },

    /// A length prefix beyond any sane frame.
    #[error("frame of {len} bytes exceeds limit of {limit}")]
    FrameTooLarge { len: u64, limit: u64 },

    /// Payload is not a valid step message.
    #[error("decode step: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Payload decoded but carries no known step variant.
    #[error("invalid step: no known variant set")]
    InvalidStep,

    /// A file step carried a hash that is neither empty nor 8 bytes.
    #[error("invalid hash length {len}")]
    InvalidHashLength { len: usize },
}

impl WireError {
    /// Whether this error means the stream was cut short.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            WireError::MissingMagic { .. }
                | WireError::TruncatedLength { .. }
                | WireError::TruncatedFrame { .. }
        )
    }
}
