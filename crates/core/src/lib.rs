//! Mirror a git object graph into a content-addressed block store
//!
//! This crate provides:
//! - SHA-1 object ids and their git-raw CIDs (`hash`)
//! - Canonical object encoding and verification (`object`)
//! - Per-kind link extraction (`links`)
//! - Per-run visited sets with atomic claims (`visited`)
//! - The worklist-driven graph push (`push`)
//! - Aggregate root patching (`root`)
//!
//! The source repository and the block store are reached only through the
//! [`ObjectSource`] and [`BlockStore`] traits.

pub mod error;
pub mod hash;
pub mod links;
pub mod object;
pub mod push;
pub mod root;
pub mod source;
pub mod store;
pub mod visited;

#[cfg(test)]
mod test_support;

// Re-exports
pub use error::{MirrorError, Result};
pub use hash::{BlockFormat, ContentId, Sha1Id};
pub use links::{extract_links, LinkSet};
pub use object::{ObjectKind, RawObject};
pub use push::{GraphPusher, NoProgress, PushOptions, PushProgress, PushReport, PushedObject};
pub use root::{RootUpdater, EMPTY_ROOT};
pub use source::ObjectSource;
pub use store::BlockStore;
pub use visited::{MemoryVisitedSet, SledVisitedSet, VisitedBackend, VisitedSet};
