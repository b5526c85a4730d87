//! Framing of steps into the snapshot stream.
//!
//! ```text
//! stream := "hino" frame*
//! frame  := len:u64le payload[len]      payload = protobuf Step
//! ```

use std::io::{self, Read, Write};

use hinomori_core::Step;
use prost::Message;

use crate::error::WireError;
use crate::proto;

/// Stream prefix.
pub const MAGIC: &[u8; 4] = b"hino";

/// Largest payload the decoder accepts.
pub const MAX_FRAME_LEN: u64 = 16 * 1024 * 1024;

/// Writes steps as length-prefixed frames.
///
/// Concurrent producers hand their steps to a single encoder through a
/// channel; the encoder itself is never shared.
#[derive(Debug)]
pub struct StepEncoder<W: Write> {
    inner: W,
    frames: u64,
    bytes: u64,
}

impl<W: Write> StepEncoder<W> {
    /// Write the magic and return an encoder ready for frames.
    pub fn new(mut inner: W) -> Result<Self, WireError> {
        inner.write_all(MAGIC)?;
        Ok(Self {
            inner,
            frames: 0,
            bytes: MAGIC.len() as u64,
        })
    }

    /// Encode one step as a frame.
    pub fn encode(&mut self, step: &Step) -> Result<(), WireError> {
        let payload = proto::Step::from(step).encode_to_vec();
        let len = payload.len() as u64;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(&payload)?;
        self.frames += 1;
        self.bytes += 8 + len;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bytes written so far, magic included.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), WireError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, WireError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads frames back into steps.
#[derive(Debug)]
pub struct StepDecoder<R: Read> {
    inner: R,
    frames: u64,
    done: bool,
}

impl<R: Read> StepDecoder<R> {
    /// Read and check the magic.
    pub fn new(mut inner: R) -> Result<Self, WireError> {
        let mut magic = [0u8; 4];
        let got = read_full(&mut inner, &mut magic)?;
        if got < magic.len() {
            return Err(WireError::MissingMagic { got });
        }
        if &magic != MAGIC {
            return Err(WireError::BadMagic { found: magic });
        }
        Ok(Self {
            inner,
            frames: 0,
            done: false,
        })
    }

    /// Read the next step. `Ok(None)` is a clean end of stream: the input
    /// ended exactly on a frame boundary.
    pub fn next_step(&mut self) -> Result<Option<Step>, WireError> {
        let mut len_bytes = [0u8; 8];
        let got = read_full(&mut self.inner, &mut len_bytes)?;
        if got == 0 {
            return Ok(None);
        }
        if got < len_bytes.len() {
            return Err(WireError::TruncatedLength { got });
        }

        let len = u64::from_le_bytes(len_bytes);
        if len > MAX_FRAME_LEN {
            return Err(WireError::FrameTooLarge {
                len,
                limit: MAX_FRAME_LEN,
            });
        }

        let mut payload = vec![0u8; len as usize];
        let got = read_full(&mut self.inner, &mut payload)?;
        if got < payload.len() {
            return Err(WireError::TruncatedFrame {
                expected: len,
                got: got as u64,
            });
        }

        let message = proto::Step::decode(payload.as_slice())?;
        let step = Step::try_from(message)?;
        self.frames += 1;
        Ok(Some(step))
    }

    /// Frames decoded so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<R: Read> Iterator for StepDecoder<R> {
    type Item = Result<Step, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_step() {
            Ok(Some(step)) => Some(Ok(step)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf` as far as the reader allows, returning how much was read.
/// Short only at end of input.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
