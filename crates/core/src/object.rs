//! Raw git objects and their canonical wire encoding
//!
//! Canonical form is `<type> <size>\0<payload>`. Git hashes exactly these
//! bytes, and the block store must receive exactly these bytes for its own
//! SHA-1 to land on the same identifier.

use crate::error::{MirrorError, Result};
use crate::hash::Sha1Id;

/// The four kinds of git object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// File content
    Blob,
    /// Directory listing
    Tree,
    /// Snapshot record
    Commit,
    /// Annotated tag
    Tag,
}

impl ObjectKind {
    /// All kinds, in a stable order
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Blob,
        ObjectKind::Tree,
        ObjectKind::Commit,
        ObjectKind::Tag,
    ];

    /// Header name used in the canonical encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    /// Parse a header name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "blob" => Some(ObjectKind::Blob),
            "tree" => Some(ObjectKind::Tree),
            "commit" => Some(ObjectKind::Commit),
            "tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded object as handed out by the source store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// Object kind
    pub kind: ObjectKind,
    /// Size declared by the source store
    pub size: u64,
    /// Decoded payload (no header)
    pub payload: Vec<u8>,
}

impl RawObject {
    /// Create an object whose declared size is the payload length
    pub fn new(kind: ObjectKind, payload: Vec<u8>) -> Self {
        Self {
            kind,
            size: payload.len() as u64,
            payload,
        }
    }

    /// Canonical header, `<type> <size>\0`
    pub fn header(&self) -> String {
        format!("{} {}\0", self.kind.as_str(), self.size)
    }

    /// Length of the canonical encoding without building it
    pub fn encoded_len(&self) -> usize {
        self.header().len() + self.payload.len()
    }
}

/// Canonical length of an object known only by its header
pub fn canonical_len(kind: ObjectKind, size: u64) -> u64 {
    let header = format!("{} {}\0", kind.as_str(), size);
    (header.len() as u64).saturating_add(size)
}

impl RawObject {

    /// Build the canonical bytes
    pub fn encode(&self) -> Vec<u8> {
        let header = self.header();
        let mut out = Vec::with_capacity(header.len() + self.payload.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse canonical bytes back into an object
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let space = bytes
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| MirrorError::parse("object", "missing space in header"))?;
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| MirrorError::parse("object", "missing NUL in header"))?;
        if nul < space {
            return Err(MirrorError::parse("object", "NUL before size field"));
        }

        let type_name = std::str::from_utf8(&bytes[..space])
            .map_err(|e| MirrorError::parse("object", format!("invalid type name: {}", e)))?;
        let kind = ObjectKind::parse(type_name)
            .ok_or_else(|| MirrorError::parse("object", format!("unknown type '{}'", type_name)))?;

        let size_str = std::str::from_utf8(&bytes[space + 1..nul])
            .map_err(|e| MirrorError::parse("object", format!("invalid size: {}", e)))?;
        let size: u64 = size_str
            .parse()
            .map_err(|e| MirrorError::parse("object", format!("invalid size '{}': {}", size_str, e)))?;

        let payload = bytes[nul + 1..].to_vec();
        if payload.len() as u64 != size {
            return Err(MirrorError::parse(
                "object",
                format!("header declares {} bytes, payload has {}", size, payload.len()),
            ));
        }

        Ok(Self { kind, size, payload })
    }

    /// Check that the canonical encoding hashes back to `id`
    pub fn verify(&self, id: &Sha1Id) -> Result<()> {
        self.encode_verified(id).map(|_| ())
    }

    /// Encode, asserting that the bytes hash back to `id`
    pub fn encode_verified(&self, id: &Sha1Id) -> Result<Vec<u8>> {
        if self.size != self.payload.len() as u64 {
            return Err(MirrorError::CorruptObject {
                id: *id,
                message: format!(
                    "declared size {} but payload is {} bytes",
                    self.size,
                    self.payload.len()
                ),
            });
        }

        let bytes = self.encode();
        let actual = Sha1Id::compute(&bytes);
        if actual != *id {
            return Err(MirrorError::CorruptObject {
                id: *id,
                message: format!("canonical bytes hash to {}", actual),
            });
        }
        Ok(bytes)
    }
}
