//! Interface to the source version-control object store

use crate::error::Result;
use crate::hash::Sha1Id;
use crate::object::{ObjectKind, RawObject};

/// Read access to a git object database and its references
pub trait ObjectSource {
    /// Resolve a reference name (following symbolic refs) to an object id
    fn resolve_reference(&self, name: &str) -> Result<Sha1Id>;

    /// All references with the object each one resolves to
    fn list_references(&self) -> Result<Vec<(String, Sha1Id)>>;

    /// Read one object's kind, declared size and decoded payload
    fn fetch_object(&self, id: &Sha1Id) -> Result<RawObject>;

    /// Kind and declared size, without the payload.
    ///
    /// Falls back to a full fetch; override where headers are cheaper.
    fn object_header(&self, id: &Sha1Id) -> Result<(ObjectKind, u64)> {
        let object = self.fetch_object(id)?;
        Ok((object.kind, object.size))
    }
}
