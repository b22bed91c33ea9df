//! File entries and aggregate statistics

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

/// File-type bits of a Unix `st_mode`
pub mod mode {
    /// Mask selecting the file-type bits
    pub const TYPE_MASK: u32 = 0o170000;
    /// Directory
    pub const DIR: u32 = 0o040000;
    /// Regular file
    pub const REGULAR: u32 = 0o100000;
    /// Symbolic link
    pub const SYMLINK: u32 = 0o120000;
}

/// OS-level identity of a file (device + inode)
///
/// Only meaningful inside the process that observed it. It is never
/// persisted: inode numbers do not survive remounts or moves between machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device the file lives on
    pub device: u64,
    /// Inode number on that device
    pub inode: u64,
}

impl FileIdentity {
    /// Read identity from metadata where the platform exposes it
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    /// Read identity from metadata where the platform exposes it
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// One filesystem object as of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Base name
    pub name: String,
    /// Absolute path, unique within a collection
    pub path: String,
    /// Length in bytes
    pub size: i64,
    /// File-type and permission bits
    pub mode: u32,
    /// Last modification time, which may predate the Unix epoch
    #[serde(with = "unix_time")]
    pub mod_time: SystemTime,
    /// Content digest, empty until computed
    #[serde(default)]
    pub hash_sum: Vec<u8>,
    /// Transient OS identity
    #[serde(skip)]
    pub identity: Option<FileIdentity>,
}

impl FileEntry {
    /// Create an entry without identity or hash
    pub fn new(path: impl Into<String>, size: i64, mode: u32, mod_time: SystemTime) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            size,
            mode,
            mod_time,
            hash_sum: Vec::new(),
            identity: None,
        }
    }

    /// Build an entry from `lstat`-style metadata
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let mod_time = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let mut entry = Self::new(
            path.to_string_lossy().into_owned(),
            metadata.len() as i64,
            mode_bits(metadata),
            mod_time,
        );
        entry.identity = FileIdentity::from_metadata(metadata);
        entry
    }

    /// Attach a digest
    pub fn with_hash(mut self, hash_sum: impl Into<Vec<u8>>) -> Self {
        self.hash_sum = hash_sum.into();
        self
    }

    /// Attach an OS identity
    pub fn with_identity(mut self, identity: FileIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// File-type portion of the mode
    pub fn file_type(&self) -> u32 {
        self.mode & mode::TYPE_MASK
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == mode::DIR
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type() == mode::SYMLINK
    }

    pub fn has_hash(&self) -> bool {
        !self.hash_sum.is_empty()
    }

    pub fn has_identity_metadata(&self) -> bool {
        self.identity.is_some()
    }

    /// Directory containing this entry
    pub fn parent(&self) -> Option<&Path> {
        Path::new(&self.path).parent()
    }
}

/// `SystemTime` as signed seconds plus nanoseconds since the Unix epoch
///
/// serde's own encoding rejects times before 1970, which old archives
/// routinely carry.
mod unix_time {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const NANOS_PER_SEC: u32 = 1_000_000_000;

    pub fn to_parts(time: SystemTime) -> (i64, u32) {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => (after.as_secs() as i64, after.subsec_nanos()),
            Err(e) => {
                let before = e.duration();
                let secs = -(before.as_secs() as i64);
                match before.subsec_nanos() {
                    0 => (secs, 0),
                    nanos => (secs - 1, NANOS_PER_SEC - nanos),
                }
            }
        }
    }

    pub fn from_parts(secs: i64, nanos: u32) -> Option<SystemTime> {
        if nanos >= NANOS_PER_SEC {
            return None;
        }
        let whole = if secs >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
        };
        whole?.checked_add(Duration::from_nanos(u64::from(nanos)))
    }

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        to_parts(*time).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let (secs, nanos) = <(i64, u32)>::deserialize(deserializer)?;
        from_parts(secs, nanos).ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}s {}ns", secs, nanos)))
    }
}

/// Mode bits as the platform reports them
#[cfg(unix)]
fn mode_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

/// Synthesized Unix-style mode bits
#[cfg(not(unix))]
fn mode_bits(metadata: &Metadata) -> u32 {
    let file_type = metadata.file_type();
    let readonly = metadata.permissions().readonly();
    if file_type.is_dir() {
        mode::DIR | if readonly { 0o555 } else { 0o755 }
    } else if file_type.is_symlink() {
        mode::SYMLINK | 0o777
    } else {
        mode::REGULAR | if readonly { 0o444 } else { 0o644 }
    }
}

/// Aggregate counts over a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Regular files (anything that is neither a directory nor a link)
    pub file_count: i64,
    /// Directories
    pub dir_count: i64,
    /// Symbolic links
    pub link_count: i64,
    /// Bytes across regular files
    pub total_size: i64,
}

impl FileStats {
    /// Account for one more entry
    pub fn record(&mut self, entry: &FileEntry) {
        if entry.is_dir() {
            self.dir_count += 1;
        } else if entry.is_symlink() {
            self.link_count += 1;
        } else {
            self.file_count += 1;
            self.total_size += entry.size;
        }
    }
}

/// Human-readable IEC byte count ("512 B", "1.5 KiB")
pub fn byte_count_iec(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = b"KMGTPE"[exp] as char;
    format!("{:.1} {}iB", bytes as f64 / div as f64, prefix)
}
