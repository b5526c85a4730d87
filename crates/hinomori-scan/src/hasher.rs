//! Streaming XXH64 content hashing.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use hinomori_core::ContentHash;
use thiserror::Error;
use xxhash_rust::xxh64::Xxh64;

/// Seed used for every content hash.
pub const HASH_SEED: u64 = 0;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Why a file could not be hashed. The Display text is what ends up in a
/// record's hash error.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("open: {0}")]
    Open(#[source] io::Error),

    #[error("stat: {0}")]
    Stat(#[source] io::Error),

    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// The path no longer names a regular file.
    #[error("open: not a regular file")]
    NotRegular,
}

/// Hashes file contents with XXH64.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    buffer_size: usize,
}

impl ContentHasher {
    /// Create a hasher with the default read buffer.
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher reading `buffer_size` bytes at a time.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash the file at `path`.
    ///
    /// The opened file is checked again, since it may have been replaced
    /// after the caller's stat.
    pub fn hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        let mut file = File::open(path).map_err(HashError::Open)?;
        let metadata = file.metadata().map_err(HashError::Stat)?;
        if !metadata.is_file() {
            return Err(HashError::NotRegular);
        }
        self.hash_reader(&mut file).map_err(HashError::Read)
    }

    /// Hash everything `reader` yields.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> io::Result<ContentHash> {
        let mut digest = Xxh64::new(HASH_SEED);
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => digest.update(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(ContentHash::from_u64(digest.digest()))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
