//! Depth-first push of everything reachable from one object
//!
//! The walk runs on an explicit stack so deep histories cannot exhaust the
//! call stack. Each object is handled in two phases:
//!
//! 1. enter: claim it in the visited set, fetch, encode, verify the
//!    canonical bytes against the id, enforce the size limit, extract links
//!    and schedule the unvisited ones (in link order);
//! 2. exit: once every child frame above it has finished, submit its bytes
//!    to the block store and check the returned identifier.
//!
//! Blocks therefore land children-first, and a run that aborts part way
//! leaves only complete sub-graphs behind.

use crate::error::{MirrorError, Result};
use crate::hash::{BlockFormat, ContentId, Sha1Id};
use crate::links::extract_links;
use crate::object::{canonical_len, ObjectKind};
use crate::source::ObjectSource;
use crate::store::BlockStore;
use crate::visited::VisitedSet;
use tracing::debug;

/// Largest encoded object pushed as a single block (2 MiB)
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 1 << 21;

/// Tunables for one push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOptions {
    /// Objects whose canonical encoding is this long or longer are rejected
    pub max_object_size: usize,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
        }
    }
}

/// One object that made it into the block store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedObject {
    pub id: Sha1Id,
    pub cid: ContentId,
    pub kind: ObjectKind,
    /// Encoded length in bytes
    pub size: usize,
    /// Number of links the object carries
    pub links: usize,
}

/// Observer for per-object progress
pub trait PushProgress {
    /// Called after each successful block submission
    fn on_pushed(&mut self, _object: &PushedObject) {}
}

/// Progress observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl PushProgress for NoProgress {}

/// Summary of a finished push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Content identifier of the root object
    pub root: ContentId,
    /// Objects submitted in this run
    pub objects: usize,
    /// Encoded bytes submitted in this run
    pub bytes: u64,
    pub blobs: usize,
    pub trees: usize,
    pub commits: usize,
    pub tags: usize,
}

impl PushReport {
    fn new(root: ContentId) -> Self {
        Self {
            root,
            objects: 0,
            bytes: 0,
            blobs: 0,
            trees: 0,
            commits: 0,
            tags: 0,
        }
    }

    fn record(&mut self, object: &PushedObject) {
        self.objects += 1;
        self.bytes += object.size as u64;
        match object.kind {
            ObjectKind::Blob => self.blobs += 1,
            ObjectKind::Tree => self.trees += 1,
            ObjectKind::Commit => self.commits += 1,
            ObjectKind::Tag => self.tags += 1,
        }
    }
}

/// An object fetched, verified and waiting for its children
struct Prepared {
    id: Sha1Id,
    kind: ObjectKind,
    bytes: Vec<u8>,
    links: Vec<Sha1Id>,
}

enum Frame {
    Enter(Sha1Id),
    Exit(Prepared),
}

/// Walks the source object graph and mirrors it into a block store
pub struct GraphPusher<'a> {
    source: &'a dyn ObjectSource,
    store: &'a dyn BlockStore,
    visited: &'a dyn VisitedSet,
    options: PushOptions,
}

impl<'a> GraphPusher<'a> {
    /// Create a pusher for one traversal run
    pub fn new(
        source: &'a dyn ObjectSource,
        store: &'a dyn BlockStore,
        visited: &'a dyn VisitedSet,
    ) -> Self {
        Self {
            source,
            store,
            visited,
            options: PushOptions::default(),
        }
    }

    /// Override the default options
    pub fn with_options(mut self, options: PushOptions) -> Self {
        self.options = options;
        self
    }

    /// Push `root` and everything reachable from it that is not yet visited
    pub fn push(&self, root: &Sha1Id) -> Result<PushReport> {
        self.push_with_progress(root, &mut NoProgress)
    }

    /// Same as [`push`](Self::push), reporting each submitted object
    pub fn push_with_progress(
        &self,
        root: &Sha1Id,
        progress: &mut dyn PushProgress,
    ) -> Result<PushReport> {
        let mut report = PushReport::new(ContentId::translate(root));
        let mut stack = vec![Frame::Enter(*root)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if !self.visited.claim(&id)? {
                        continue;
                    }

                    let prepared = self.prepare(&id)?;
                    let mut children = Vec::with_capacity(prepared.links.len());
                    for link in prepared.links.iter().rev() {
                        if !self.visited.contains(link)? {
                            children.push(Frame::Enter(*link));
                        }
                    }

                    stack.push(Frame::Exit(prepared));
                    stack.extend(children);
                }
                Frame::Exit(prepared) => {
                    let pushed = self.submit(prepared)?;
                    report.record(&pushed);
                    progress.on_pushed(&pushed);
                }
            }
        }

        Ok(report)
    }

    /// Fetch, encode, verify and link-extract one object
    fn prepare(&self, id: &Sha1Id) -> Result<Prepared> {
        // Reject on the header alone so huge payloads are never loaded
        let (kind, size) = self.source.object_header(id)?;
        let declared_len = usize::try_from(canonical_len(kind, size)).unwrap_or(usize::MAX);
        self.check_size(id, declared_len)?;

        let object = self.source.fetch_object(id)?;
        debug!("Object {} is a {} {}", id, object.kind, object.size);
        self.check_size(id, object.encoded_len())?;

        let bytes = object.encode_verified(id)?;
        let links = extract_links(object.kind, &object.payload)?;
        debug!("Object {} linked to {:?}", id, links);

        Ok(Prepared {
            id: *id,
            kind: object.kind,
            bytes,
            links,
        })
    }

    fn check_size(&self, id: &Sha1Id, encoded_len: usize) -> Result<()> {
        if encoded_len >= self.options.max_object_size {
            return Err(MirrorError::OversizedObject {
                id: *id,
                size: encoded_len,
                limit: self.options.max_object_size,
            });
        }
        Ok(())
    }

    /// Submit canonical bytes and check the identifier the store computed
    fn submit(&self, prepared: Prepared) -> Result<PushedObject> {
        let expected = ContentId::translate(&prepared.id);
        let actual = self.store.put_block(&prepared.bytes, BlockFormat::GIT_RAW)?;
        if actual != expected {
            return Err(MirrorError::IntegrityMismatch {
                id: prepared.id,
                expected,
                actual,
            });
        }
        debug!("Pushed {} to {}", prepared.id, actual);

        Ok(PushedObject {
            id: prepared.id,
            cid: actual,
            kind: prepared.kind,
            size: prepared.bytes.len(),
            links: prepared.links.len(),
        })
    }
}
