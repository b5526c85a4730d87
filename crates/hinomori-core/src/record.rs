//! File record types.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Mask selecting the file-type bits of a Unix mode.
pub const MODE_TYPE_MASK: u32 = 0o170_000;

const S_IFSOCK: u32 = 0o140_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFREG: u32 = 0o100_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFIFO: u32 = 0o010_000;

/// XXH64 content hash, stored little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 8]);

impl ContentHash {
    /// Width of the hash on the wire.
    pub const LEN: usize = 8;

    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Create a hash from a 64-bit digest value.
    pub fn from_u64(digest: u64) -> Self {
        Self(digest.to_le_bytes())
    }

    /// Parse a hash from a byte slice. Only an 8-byte slice is accepted.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 8]>::try_from(bytes).ok().map(Self)
    }

    /// The digest as an integer.
    pub fn as_u64(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// Raw bytes in wire order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Type of a file system entry, decoded from its mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Socket,
    BlockDevice,
    CharDevice,
    Fifo,
    /// Type bits we don't recognise.
    Unknown,
}

impl FileKind {
    /// Classify a Unix mode.
    pub fn from_mode(mode: u32) -> Self {
        match mode & MODE_TYPE_MASK {
            S_IFREG => FileKind::Regular,
            S_IFDIR => FileKind::Directory,
            S_IFLNK => FileKind::Symlink,
            S_IFSOCK => FileKind::Socket,
            S_IFBLK => FileKind::BlockDevice,
            S_IFCHR => FileKind::CharDevice,
            S_IFIFO => FileKind::Fifo,
            _ => FileKind::Unknown,
        }
    }

    /// Type bits for this kind.
    pub fn type_bits(self) -> u32 {
        match self {
            FileKind::Regular => S_IFREG,
            FileKind::Directory => S_IFDIR,
            FileKind::Symlink => S_IFLNK,
            FileKind::Socket => S_IFSOCK,
            FileKind::BlockDevice => S_IFBLK,
            FileKind::CharDevice => S_IFCHR,
            FileKind::Fifo => S_IFIFO,
            FileKind::Unknown => 0,
        }
    }

    /// Character used for this kind in `ls`-style mode strings.
    fn symbol(self) -> char {
        match self {
            FileKind::Regular => '-',
            FileKind::Directory => 'd',
            FileKind::Symlink => 'l',
            FileKind::Socket => 's',
            FileKind::BlockDevice => 'b',
            FileKind::CharDevice => 'c',
            FileKind::Fifo => 'p',
            FileKind::Unknown => '?',
        }
    }
}

/// Metadata for one directory entry, as emitted in a file step.
///
/// A record carries no path: its enclosing directory is implied by the
/// Up/Down steps preceding it in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Type and permission bits.
    pub mode: u32,
    /// Size in bytes.
    pub size: u64,
    /// Entry name (not full path).
    pub name: CompactString,
    /// Owning user id.
    pub owner: u32,
    /// Owning group id.
    pub group: u32,
    /// Content hash, present only for hashed regular files.
    pub hash: Option<ContentHash>,
    /// Why hashing failed, if it did.
    pub hash_error: Option<String>,
}

impl FileRecord {
    /// Create a record without hash information.
    pub fn new(name: impl Into<CompactString>, mode: u32, size: u64) -> Self {
        Self {
            mode,
            size,
            name: name.into(),
            owner: 0,
            group: 0,
            hash: None,
            hash_error: None,
        }
    }

    /// Set owner and group.
    pub fn with_owner(mut self, owner: u32, group: u32) -> Self {
        self.owner = owner;
        self.group = group;
        self
    }

    /// Entry kind from the mode bits.
    pub fn kind(&self) -> FileKind {
        FileKind::from_mode(self.mode)
    }

    /// Check if this record is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    /// Check if this record is a regular file.
    pub fn is_regular(&self) -> bool {
        self.kind() == FileKind::Regular
    }

    /// Permission bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Render the mode like `ls -l` does, e.g. `drwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(self.kind().symbol());
        let perm = self.mode;
        let special = [(0o4000, 's'), (0o2000, 's'), (0o1000, 't')];
        for (i, (special_bit, special_char)) in special.into_iter().enumerate() {
            let shift = 6 - 3 * i as u32;
            let bits = (perm >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            let exec = bits & 0o1 != 0;
            out.push(match (perm & special_bit != 0, exec) {
                (true, true) => special_char,
                (true, false) => special_char.to_ascii_uppercase(),
                (false, true) => 'x',
                (false, false) => '-',
            });
        }
        out
    }
}
