//! Interface to the destination content-addressed block store

use crate::error::Result;
use crate::hash::{BlockFormat, ContentId};

/// Block-level access to a content-addressed store
///
/// `put_block` must be idempotent: submitting the same bytes twice returns
/// the same identifier and stores them once.
pub trait BlockStore {
    /// Fetch a block by identifier
    fn get_block(&self, id: &ContentId) -> Result<Vec<u8>>;

    /// Store a block and return the identifier the store computed for it
    fn put_block(&self, data: &[u8], format: BlockFormat) -> Result<ContentId>;

    /// Return a new container equal to `root` with `path` linked to `child`
    fn patch_link(
        &self,
        root: &ContentId,
        path: &str,
        child: &ContentId,
        create_intermediate: bool,
    ) -> Result<ContentId>;
}
