/// Content digests and the position-indexed digest buffer.
///
/// MD5 is the default so file manifests stay comparable with earlier
/// indexes; BLAKE3 is available for new deployments.
use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Widest digest any algorithm produces, in bytes.
pub const MAX_DIGEST_LEN: usize = blake3::OUT_LEN;

/// Content hash used for the file manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Blake3,
}

impl DigestAlgorithm {
    /// Digest width in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Blake3 => blake3::OUT_LEN,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Blake3 => "blake3",
        }
    }

    /// Digest of an in-memory byte slice.
    pub fn hash_bytes(self, data: &[u8]) -> Digest {
        let mut hasher = ContentHasher::new(self);
        hasher.update(data);
        hasher.finalize()
    }

    /// Stream `reader` through `buf` into an incremental hasher.
    ///
    /// Only `buf.len()` bytes are held in memory at a time, whatever the
    /// size of the input.
    pub fn hash_reader<R: Read>(self, mut reader: R, buf: &mut [u8]) -> io::Result<Digest> {
        let mut hasher = ContentHasher::new(self);
        loop {
            match reader.read(buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(hasher.finalize())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unknown digest '{other}' (expected md5 or blake3)")),
        }
    }
}

enum ContentHasher {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl ContentHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(Md5::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Md5(h) => Digest::from_slice(h.finalize().as_slice()),
            Self::Blake3(h) => Digest::from_slice(h.finalize().as_bytes()),
        }
    }
}

/// Fixed-width content fingerprint of up to [`MAX_DIGEST_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl Digest {
    /// Copy a raw digest. Input beyond [`MAX_DIGEST_LEN`] bytes is dropped.
    pub fn from_slice(raw: &[u8]) -> Self {
        let len = raw.len().min(MAX_DIGEST_LEN);
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes[..len].copy_from_slice(&raw[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Uppercase hex, two characters per byte.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// One digest slot per File Store entry, indexed in File Store iteration
/// order. A slot is `None` until its file has been fully hashed, and stays
/// `None` if hashing failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestBuffer {
    slots: Vec<Option<Digest>>,
}

impl DigestBuffer {
    /// A buffer of `len` empty slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Digest> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a digest.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Option<Digest>> {
        self.slots.iter()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Digest>] {
        &mut self.slots
    }
}
