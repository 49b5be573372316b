//! Error taxonomy for the mirror pipeline
//!
//! Nothing in the core recovers from these locally. Every variant aborts the
//! traversal and travels back to the driver, which decides to exit.

use crate::hash::{ContentId, Sha1Id};
use thiserror::Error;

/// Errors produced while mirroring a git object graph
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The named reference does not exist in the source repository
    #[error("reference not found: {name}")]
    ReferenceNotFound { name: String },

    /// The source store cannot produce an object
    #[error("object not found: {id}")]
    ObjectNotFound { id: Sha1Id },

    /// The source store returned something other than blob/tree/commit/tag
    #[error("object {id} has unsupported type '{kind}'")]
    UnsupportedType { id: Sha1Id, kind: String },

    /// The canonical encoding is too large to push as a single block
    #[error("object {id} is {size} bytes encoded, limit is {limit} (chunking is not supported)")]
    OversizedObject { id: Sha1Id, size: usize, limit: usize },

    /// The payload of an object could not be parsed for links
    #[error("malformed {kind}: {message}")]
    Parse { kind: &'static str, message: String },

    /// The destination store computed a different identifier than predicted
    #[error("integrity mismatch for {id}: expected {expected}, store returned {actual}")]
    IntegrityMismatch {
        id: Sha1Id,
        expected: ContentId,
        actual: ContentId,
    },

    /// Canonical bytes do not hash back to the object's own identifier
    #[error("corrupt object {id}: {message}")]
    CorruptObject { id: Sha1Id, message: String },

    /// Failure reported by the source object store
    #[error("source store error: {message}")]
    Source { message: String },

    /// Failure reported by the destination block store
    #[error("block store error: {message}")]
    Store { message: String },

    /// Failure of the visited-set backend
    #[error("visited set error: {message}")]
    Visited { message: String },

    /// Malformed identifier text (hex object id or CID)
    #[error("invalid identifier '{input}': {message}")]
    InvalidId { input: String, message: String },
}

impl MirrorError {
    /// Build a parse error for the given object kind
    pub fn parse(kind: &'static str, message: impl Into<String>) -> Self {
        MirrorError::Parse {
            kind,
            message: message.into(),
        }
    }

    /// Build a block store error
    pub fn store(message: impl Into<String>) -> Self {
        MirrorError::Store {
            message: message.into(),
        }
    }

    /// Build a source store error
    pub fn source(message: impl Into<String>) -> Self {
        MirrorError::Source {
            message: message.into(),
        }
    }

    /// True for the two "not found" cases (reference or object)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MirrorError::ReferenceNotFound { .. } | MirrorError::ObjectNotFound { .. }
        )
    }
}

impl From<sled::Error> for MirrorError {
    fn from(e: sled::Error) -> Self {
        MirrorError::Visited {
            message: e.to_string(),
        }
    }
}

/// Result type for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;
