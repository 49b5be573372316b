//! In-memory source and store doubles for unit tests

use crate::error::{MirrorError, Result};
use crate::hash::{BlockFormat, ContentId, Sha1Id, DAG_PB_CODEC, SHA1_MULTIHASH};
use crate::object::{ObjectKind, RawObject};
use crate::source::ObjectSource;
use crate::store::BlockStore;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Object database held in a hash map
#[derive(Default)]
pub struct MemorySource {
    objects: HashMap<Sha1Id, RawObject>,
    unsupported: HashMap<Sha1Id, String>,
    refs: BTreeMap<String, Sha1Id>,
    fetches: Mutex<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_raw(&mut self, kind: ObjectKind, payload: &[u8]) -> Sha1Id {
        let object = RawObject::new(kind, payload.to_vec());
        let id = Sha1Id::compute(&object.encode());
        self.objects.insert(id, object);
        id
    }

    pub fn add_blob(&mut self, content: &[u8]) -> Sha1Id {
        self.add_raw(ObjectKind::Blob, content)
    }

    pub fn add_tree(&mut self, entries: &[(&str, &str, Sha1Id)]) -> Sha1Id {
        let mut payload = Vec::new();
        for (mode, name, id) in entries {
            payload.extend_from_slice(mode.as_bytes());
            payload.push(b' ');
            payload.extend_from_slice(name.as_bytes());
            payload.push(0);
            payload.extend_from_slice(id.as_bytes());
        }
        self.add_raw(ObjectKind::Tree, &payload)
    }

    pub fn add_commit(&mut self, tree: Sha1Id, parents: &[Sha1Id], message: &str) -> Sha1Id {
        let mut payload = format!("tree {}\n", tree);
        for parent in parents {
            payload.push_str(&format!("parent {}\n", parent));
        }
        payload.push_str("author T <t@example.com> 0 +0000\n");
        payload.push_str("committer T <t@example.com> 0 +0000\n\n");
        payload.push_str(message);
        payload.push('\n');
        self.add_raw(ObjectKind::Commit, payload.as_bytes())
    }

    pub fn add_tag(&mut self, target: Sha1Id, kind: ObjectKind, name: &str) -> Sha1Id {
        let payload = format!(
            "object {}\ntype {}\ntag {}\ntagger T <t@example.com> 0 +0000\n\n{}\n",
            target, kind, name, name
        );
        self.add_raw(ObjectKind::Tag, payload.as_bytes())
    }

    /// Register an id whose type the source cannot represent
    pub fn add_unsupported(&mut self, type_name: &str) -> Sha1Id {
        let id = Sha1Id::compute(type_name.as_bytes());
        self.unsupported.insert(id, type_name.to_string());
        id
    }

    /// Replace a stored payload without changing its id
    pub fn tamper(&mut self, id: &Sha1Id, payload: Vec<u8>) {
        if let Some(object) = self.objects.get_mut(id) {
            *object = RawObject::new(object.kind, payload);
        }
    }

    pub fn set_ref(&mut self, name: &str, id: Sha1Id) {
        self.refs.insert(name.to_string(), id);
    }

    pub fn encoded_len(&self, id: &Sha1Id) -> usize {
        self.objects[id].encoded_len()
    }

    /// Number of full payload reads
    pub fn fetch_calls(&self) -> usize {
        *self.fetches.lock()
    }

    fn unsupported_error(&self, id: &Sha1Id) -> Option<MirrorError> {
        self.unsupported.get(id).map(|kind| MirrorError::UnsupportedType {
            id: *id,
            kind: kind.clone(),
        })
    }
}

impl ObjectSource for MemorySource {
    fn resolve_reference(&self, name: &str) -> Result<Sha1Id> {
        self.refs
            .get(name)
            .copied()
            .ok_or_else(|| MirrorError::ReferenceNotFound {
                name: name.to_string(),
            })
    }

    fn list_references(&self) -> Result<Vec<(String, Sha1Id)>> {
        Ok(self.refs.iter().map(|(n, id)| (n.clone(), *id)).collect())
    }

    fn fetch_object(&self, id: &Sha1Id) -> Result<RawObject> {
        if let Some(err) = self.unsupported_error(id) {
            return Err(err);
        }
        *self.fetches.lock() += 1;
        self.objects
            .get(id)
            .cloned()
            .ok_or(MirrorError::ObjectNotFound { id: *id })
    }

    fn object_header(&self, id: &Sha1Id) -> Result<(ObjectKind, u64)> {
        if let Some(err) = self.unsupported_error(id) {
            return Err(err);
        }
        self.objects
            .get(id)
            .map(|object| (object.kind, object.size))
            .ok_or(MirrorError::ObjectNotFound { id: *id })
    }
}

#[derive(Default)]
struct Calls {
    puts: usize,
    gets: usize,
    stored: Vec<Sha1Id>,
    patches: Vec<(ContentId, String, ContentId, bool)>,
}

/// Block store that hashes honestly and records every call
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Calls>,
    forged: HashSet<Sha1Id>,
    reject_patches: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fabricated identifier when this object is submitted
    pub fn forge(mut self, id: Sha1Id) -> Self {
        self.forged.insert(id);
        self
    }

    /// Fail every patch_link call
    pub fn reject_patches(mut self) -> Self {
        self.reject_patches = true;
        self
    }

    /// Ids of blocks accepted, in submission order
    pub fn pushed(&self) -> Vec<Sha1Id> {
        self.calls.lock().stored.clone()
    }

    pub fn put_calls(&self) -> usize {
        self.calls.lock().puts
    }

    pub fn get_calls(&self) -> usize {
        self.calls.lock().gets
    }

    pub fn patch_calls(&self) -> usize {
        self.calls.lock().patches.len()
    }

    pub fn last_patch(&self) -> Option<(ContentId, String, ContentId, bool)> {
        self.calls.lock().patches.last().cloned()
    }
}

impl BlockStore for RecordingStore {
    fn get_block(&self, _id: &ContentId) -> Result<Vec<u8>> {
        self.calls.lock().gets += 1;
        Ok(vec![0x0a, 0x02, 0x08, 0x01])
    }

    fn put_block(&self, data: &[u8], format: BlockFormat) -> Result<ContentId> {
        assert_eq!(format, BlockFormat::GIT_RAW);
        let id = Sha1Id::compute(data);
        let mut calls = self.calls.lock();
        calls.puts += 1;

        if self.forged.contains(&id) {
            let mut fake = *id.as_bytes();
            fake[0] ^= 0xff;
            return Ok(ContentId::translate(&Sha1Id::from_bytes(fake)));
        }
        calls.stored.push(id);
        Ok(ContentId::translate(&id))
    }

    fn patch_link(
        &self,
        root: &ContentId,
        path: &str,
        child: &ContentId,
        create_intermediate: bool,
    ) -> Result<ContentId> {
        if self.reject_patches {
            return Err(MirrorError::store("patch rejected"));
        }
        let mut calls = self.calls.lock();
        calls
            .patches
            .push((*root, path.to_string(), *child, create_intermediate));

        let digest = Sha1Id::compute(format!("{}/{}={}", root, path, child).as_bytes());
        ContentId::from_digest(DAG_PB_CODEC, SHA1_MULTIHASH, digest.as_bytes())
    }
}
