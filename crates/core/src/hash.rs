//! Git object ids and their content identifiers in the block store
//!
//! A git object id is the SHA-1 of the object's canonical bytes. The block
//! store addresses the very same bytes with a CIDv1 whose multihash is that
//! SHA-1 digest and whose codec is `git-raw`, so translating between the two
//! is a pure relabelling of the digest.

use crate::error::{MirrorError, Result};
use cid::Cid;
use multihash::Multihash;
use sha1::{Digest, Sha1};
use std::str::FromStr;

/// Multicodec code for raw git objects
pub const GIT_RAW_CODEC: u64 = 0x78;

/// Multicodec code for dag-pb container nodes
pub const DAG_PB_CODEC: u64 = 0x70;

/// Multihash code for SHA-1
pub const SHA1_MULTIHASH: u64 = 0x11;

/// Multihash code for BLAKE3
pub const BLAKE3_MULTIHASH: u64 = 0x1e;

/// Length of a SHA-1 digest in bytes
pub const SHA1_LEN: usize = 20;

/// A git object id (20-byte SHA-1)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Sha1Id([u8; SHA1_LEN]);

impl Sha1Id {
    /// Create a new id from raw bytes
    pub const fn from_bytes(bytes: [u8; SHA1_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an id from a slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SHA1_LEN] = bytes.try_into().map_err(|_| MirrorError::InvalidId {
            input: hex::encode(bytes),
            message: format!("expected {} bytes, got {}", SHA1_LEN, bytes.len()),
        })?;
        Ok(Self(arr))
    }

    /// Parse from a 40 character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut bytes = [0u8; SHA1_LEN];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|e| MirrorError::InvalidId {
            input: hex_str.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Hash canonical object bytes with SHA-1
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        Self(digest.into())
    }

    /// Get the id as a byte slice
    pub fn as_bytes(&self) -> &[u8; SHA1_LEN] {
        &self.0
    }

    /// Convert to lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Sha1Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sha1Id({})", self.to_hex())
    }
}

impl std::fmt::Display for Sha1Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Sha1Id {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// A self-describing block store address (CIDv1)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ContentId(Cid);

impl ContentId {
    /// Map a git object id into the block store's address space.
    ///
    /// Pure and injective: the digest is carried over verbatim.
    pub fn translate(id: &Sha1Id) -> Self {
        Self::from_digest(GIT_RAW_CODEC, SHA1_MULTIHASH, id.as_bytes())
            .expect("a 20-byte digest always fits a multihash")
    }

    /// Build a CIDv1 from a codec, a multihash code and a digest
    pub fn from_digest(codec: u64, hash_code: u64, digest: &[u8]) -> Result<Self> {
        let mh = Multihash::<64>::wrap(hash_code, digest).map_err(|e| MirrorError::InvalidId {
            input: hex::encode(digest),
            message: e.to_string(),
        })?;
        Ok(Self(Cid::new_v1(codec, mh)))
    }

    /// Parse a CID in any multibase the cid crate understands
    pub fn parse(input: &str) -> Result<Self> {
        let cid = Cid::try_from(input.trim()).map_err(|e| MirrorError::InvalidId {
            input: input.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self(cid))
    }

    /// Multicodec of the addressed content
    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// Multihash function code
    pub fn hash_code(&self) -> u64 {
        self.0.hash().code()
    }

    /// Raw digest bytes
    pub fn digest(&self) -> &[u8] {
        self.0.hash().digest()
    }

    /// Recover the git object id when this is a git-raw/SHA-1 CID
    pub fn sha1_digest(&self) -> Option<Sha1Id> {
        if self.codec() != GIT_RAW_CODEC || self.hash_code() != SHA1_MULTIHASH {
            return None;
        }
        Sha1Id::from_slice(self.digest()).ok()
    }

    /// The underlying CID
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for ContentId {
    fn from(cid: Cid) -> Self {
        Self(cid)
    }
}

impl std::fmt::Debug for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Codec and hash function label attached to every submitted block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFormat {
    /// Multicodec name understood by the block store
    pub codec: &'static str,
    /// Multihash function name understood by the block store
    pub hash_function: &'static str,
}

impl BlockFormat {
    /// Raw git objects hashed with SHA-1
    pub const GIT_RAW: BlockFormat = BlockFormat {
        codec: "git-raw",
        hash_function: "sha1",
    };
}
