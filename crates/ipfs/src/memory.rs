//! In-process block store
//!
//! Computes identifiers the same way a node would for git-raw blocks, so
//! integrity checks behave as they do against a real store. Containers are
//! flat `path -> child` maps addressed by a BLAKE3 digest of their listing.

use mirror_core::hash::{BLAKE3_MULTIHASH, DAG_PB_CODEC};
use mirror_core::{BlockFormat, BlockStore, ContentId, MirrorError, Result, Sha1Id, EMPTY_ROOT};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Block bytes of the empty UnixFS directory
pub const EMPTY_DIR_BLOCK: [u8; 4] = [0x0a, 0x02, 0x08, 0x01];

type Listing = BTreeMap<String, ContentId>;

#[derive(Default)]
struct Inner {
    blocks: HashMap<ContentId, Vec<u8>>,
    containers: HashMap<ContentId, Listing>,
    puts: usize,
    gets: usize,
    patches: usize,
}

/// Block store held entirely in memory
pub struct MemoryBlockStore {
    inner: Mutex<Inner>,
}

impl MemoryBlockStore {
    /// A store holding only the empty root container
    pub fn new() -> Result<Self> {
        let empty_root = ContentId::parse(EMPTY_ROOT)?;
        let mut inner = Inner::default();
        inner.blocks.insert(empty_root, EMPTY_DIR_BLOCK.to_vec());
        inner.containers.insert(empty_root, Listing::new());
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Number of `put_block` calls, duplicates included
    pub fn put_calls(&self) -> usize {
        self.inner.lock().puts
    }

    /// Number of `get_block` calls
    pub fn get_calls(&self) -> usize {
        self.inner.lock().gets
    }

    /// Number of successful `patch_link` calls
    pub fn patch_calls(&self) -> usize {
        self.inner.lock().patches
    }

    /// Distinct blocks held, containers included
    pub fn block_count(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    /// True if a block with this identifier is stored
    pub fn contains(&self, id: &ContentId) -> bool {
        self.inner.lock().blocks.contains_key(id)
    }

    /// Follow `path` inside the container `root`
    pub fn resolve(&self, root: &ContentId, path: &str) -> Option<ContentId> {
        self.inner
            .lock()
            .containers
            .get(root)
            .and_then(|listing| listing.get(path).copied())
    }

    /// All links of a container, sorted by path
    pub fn links(&self, root: &ContentId) -> Option<Vec<(String, ContentId)>> {
        self.inner
            .lock()
            .containers
            .get(root)
            .map(|listing| listing.iter().map(|(p, c)| (p.clone(), *c)).collect())
    }
}

impl BlockStore for MemoryBlockStore {
    fn get_block(&self, id: &ContentId) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.gets += 1;
        inner
            .blocks
            .get(id)
            .cloned()
            .ok_or_else(|| MirrorError::store(format!("block {} not found", id)))
    }

    fn put_block(&self, data: &[u8], format: BlockFormat) -> Result<ContentId> {
        if format != BlockFormat::GIT_RAW {
            return Err(MirrorError::store(format!(
                "unsupported block format {}/{}",
                format.codec, format.hash_function
            )));
        }
        let id = ContentId::translate(&Sha1Id::compute(data));

        let mut inner = self.inner.lock();
        inner.puts += 1;
        inner.blocks.entry(id).or_insert_with(|| data.to_vec());
        Ok(id)
    }

    fn patch_link(
        &self,
        root: &ContentId,
        path: &str,
        child: &ContentId,
        create_intermediate: bool,
    ) -> Result<ContentId> {
        let mut inner = self.inner.lock();
        let mut listing = inner
            .containers
            .get(root)
            .cloned()
            .ok_or_else(|| MirrorError::store(format!("{} is not a known container", root)))?;

        if path.is_empty() || path.split('/').any(str::is_empty) {
            return Err(MirrorError::store(format!("invalid link path '{}'", path)));
        }
        if path.contains('/') && !create_intermediate {
            return Err(MirrorError::store(format!(
                "no link named '{}' under {}",
                path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(path),
                root
            )));
        }
        if !inner.blocks.contains_key(child) {
            return Err(MirrorError::store(format!("child {} not found", child)));
        }

        listing.insert(path.to_string(), *child);
        let block = encode_listing(&listing);
        let digest = blake3::hash(&block);
        let id = ContentId::from_digest(DAG_PB_CODEC, BLAKE3_MULTIHASH, digest.as_bytes())?;

        inner.blocks.insert(id, block);
        inner.containers.insert(id, listing);
        inner.patches += 1;
        Ok(id)
    }
}

fn encode_listing(listing: &Listing) -> Vec<u8> {
    let mut out = Vec::new();
    for (path, child) in listing {
        out.extend_from_slice(path.as_bytes());
        out.push(0);
        out.extend_from_slice(&child.as_cid().to_bytes());
        out.push(b'\n');
    }
    out
}
