//! Content digest primitives
//!
//! One [`HashAlgorithm`] is chosen per process. Every digest is computed by a
//! fresh [`StreamHasher`], so nothing is shared between callers hashing on
//! different threads.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// Read buffer used when streaming file content (64KB)
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm applied to file content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (32 bytes)
    #[default]
    Blake3,
    /// SHA-1 (20 bytes)
    Sha1,
    /// SHA-256 (32 bytes)
    Sha256,
    /// SHA-512 (64 bytes)
    Sha512,
    /// CRC-32/IEEE checksum (4 bytes, non-cryptographic)
    Crc32,
    /// XXH3 64-bit (8 bytes, non-cryptographic)
    Xxh3,
}

impl HashAlgorithm {
    /// Every supported algorithm
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Blake3,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Crc32,
        HashAlgorithm::Xxh3,
    ];

    /// Canonical lowercase name, as written to settings records
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Crc32 => "crc32",
            HashAlgorithm::Xxh3 => "xxh3",
        }
    }

    /// Length in bytes of the digests this algorithm produces
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Blake3 | HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Crc32 => 4,
            HashAlgorithm::Xxh3 => 8,
        }
    }

    /// Resolve a configured name, falling back to the default for anything
    /// unrecognized
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(algorithm) => algorithm,
            Err(UnknownAlgorithm(name)) => {
                let fallback = Self::default();
                tracing::warn!(
                    "Unknown hash algorithm {:?}, falling back to {}",
                    name,
                    fallback
                );
                fallback
            }
        }
    }

    /// Start a new streaming digest
    pub fn hasher(self) -> StreamHasher {
        match self {
            HashAlgorithm::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha1 => StreamHasher::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => StreamHasher::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha512 => StreamHasher::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Crc32 => StreamHasher::Crc32(crc32fast::Hasher::new()),
            HashAlgorithm::Xxh3 => StreamHasher::Xxh3(Box::new(Xxh3::new())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name matches no supported algorithm
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.replace('-', "");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == wanted)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Incremental digest state for a single input
pub enum StreamHasher {
    /// BLAKE3 state
    Blake3(Box<blake3::Hasher>),
    /// SHA-1 state
    Sha1(sha1::Sha1),
    /// SHA-256 state
    Sha256(sha2::Sha256),
    /// SHA-512 state
    Sha512(sha2::Sha512),
    /// CRC-32 state
    Crc32(crc32fast::Hasher),
    /// XXH3 state
    Xxh3(Box<Xxh3>),
}

impl StreamHasher {
    /// Feed more input
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StreamHasher::Blake3(h) => {
                h.update(data);
            }
            StreamHasher::Sha1(h) => h.update(data),
            StreamHasher::Sha256(h) => h.update(data),
            StreamHasher::Sha512(h) => h.update(data),
            StreamHasher::Crc32(h) => h.update(data),
            StreamHasher::Xxh3(h) => h.update(data),
        }
    }

    /// Consume the state and return the digest bytes
    pub fn finalize(self) -> Vec<u8> {
        match self {
            StreamHasher::Blake3(h) => h.finalize().as_bytes().to_vec(),
            StreamHasher::Sha1(h) => h.finalize().to_vec(),
            StreamHasher::Sha256(h) => h.finalize().to_vec(),
            StreamHasher::Sha512(h) => h.finalize().to_vec(),
            StreamHasher::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
            StreamHasher::Xxh3(h) => h.digest().to_be_bytes().to_vec(),
        }
    }
}

/// Hash an in-memory buffer
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let mut hasher = algorithm.hasher();
    hasher.update(data);
    hasher.finalize()
}

/// Hash everything a reader yields until EOF
pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, mut reader: R) -> io::Result<Vec<u8>> {
    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize())
}

/// Hash a file by streaming its full content
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    hash_reader(algorithm, file)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Hash a symbolic link by its target path, without following it
pub fn hash_symlink(algorithm: HashAlgorithm, path: &Path) -> Result<Vec<u8>> {
    let target = std::fs::read_link(path)
        .with_context(|| format!("Failed to read link {}", path.display()))?;
    Ok(hash_bytes(algorithm, target.to_string_lossy().as_bytes()))
}

/// Lowercase hex rendering of a digest
pub fn to_hex(sum: &[u8]) -> String {
    hex::encode(sum)
}
