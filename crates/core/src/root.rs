//! Attaching a pushed object under a named path of an aggregate root

use crate::error::Result;
use crate::hash::ContentId;
use crate::store::BlockStore;
use tracing::debug;

/// Empty UnixFS directory (dag-pb, sha2-256), the default aggregate root
pub const EMPTY_ROOT: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

/// Patches pushed objects into an aggregate container node
#[derive(Debug, Clone)]
pub struct RootUpdater {
    empty_root: ContentId,
}

impl RootUpdater {
    /// Use `empty_root` as the base when no existing root is supplied
    pub fn new(empty_root: ContentId) -> Self {
        Self { empty_root }
    }

    /// The container used when starting from scratch
    pub fn empty_root(&self) -> &ContentId {
        &self.empty_root
    }

    /// Pick the container to patch.
    ///
    /// Without an existing root the empty container is fetched once, which
    /// also confirms the store can serve it before anything is pushed.
    pub fn prepare_base(
        &self,
        store: &dyn BlockStore,
        existing: Option<ContentId>,
    ) -> Result<ContentId> {
        match existing {
            Some(root) => Ok(root),
            None => {
                let block = store.get_block(&self.empty_root)?;
                debug!("Fetched empty root {} ({} bytes)", self.empty_root, block.len());
                Ok(self.empty_root)
            }
        }
    }

    /// Link `child` at `path` inside `base`, creating intermediate nodes.
    ///
    /// Objects pushed before a failure here stay in the store, unlinked.
    pub fn update(
        &self,
        store: &dyn BlockStore,
        base: &ContentId,
        path: &str,
        child: &ContentId,
    ) -> Result<ContentId> {
        store.patch_link(base, path, child, true)
    }
}

impl Default for RootUpdater {
    fn default() -> Self {
        let empty_root = ContentId::parse(EMPTY_ROOT).expect("EMPTY_ROOT is a valid CID literal");
        Self::new(empty_root)
    }
}
