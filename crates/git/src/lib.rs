//! Git repository access for the mirror pipeline
//!
//! Wraps a `git2::Repository` and exposes it through [`ObjectSource`]:
//! references resolve to object ids, and objects come back exactly as the
//! object database stores them (kind, declared size, inflated payload).

use git2::{ErrorCode, ObjectType, Oid, Repository};
use mirror_core::{MirrorError, ObjectKind, ObjectSource, RawObject, Result, Sha1Id};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A git repository opened for reading
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open the repository at `path` (work tree or bare git dir)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| {
            MirrorError::source(format!("cannot open repository {}: {}", path.display(), e.message()))
        })?;
        debug!("Opened repository at {}", repo.path().display());
        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Path the repository was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact name first, then git's short-name rules (`main`, `v1`).
    ///
    /// `find_reference` reports a bare name as `InvalidSpec`, not `NotFound`.
    fn lookup(&self, name: &str) -> std::result::Result<git2::Reference<'_>, git2::Error> {
        match self.repo.find_reference(name) {
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                self.repo.resolve_reference_from_short_name(name)
            }
            other => other,
        }
    }
}

impl ObjectSource for GitRepository {
    fn resolve_reference(&self, name: &str) -> Result<Sha1Id> {
        let not_found = || MirrorError::ReferenceNotFound {
            name: name.to_string(),
        };

        let reference = match self.lookup(name) {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                return Err(not_found())
            }
            Err(e) => return Err(source_error(e)),
        };

        // Unborn HEAD and dangling symbolic refs both end up here
        let resolved = match reference.resolve() {
            Ok(r) => r,
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::UnbornBranch) => {
                return Err(not_found())
            }
            Err(e) => return Err(source_error(e)),
        };
        let oid = resolved.target().ok_or_else(not_found)?;
        Ok(oid_to_id(oid))
    }

    fn list_references(&self) -> Result<Vec<(String, Sha1Id)>> {
        let mut refs = Vec::new();
        for reference in self.repo.references().map_err(source_error)? {
            let reference = match reference {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unreadable reference: {}", e.message());
                    continue;
                }
            };
            let Some(name) = reference.name() else {
                warn!("Skipping reference with a non UTF-8 name");
                continue;
            };
            match reference.resolve().ok().and_then(|r| r.target()) {
                Some(oid) => refs.push((name.to_string(), oid_to_id(oid))),
                None => warn!("Skipping unresolvable reference {}", name),
            }
        }
        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    fn fetch_object(&self, id: &Sha1Id) -> Result<RawObject> {
        let oid = id_to_oid(id)?;
        let odb = self.repo.odb().map_err(source_error)?;
        let object = odb.read(oid).map_err(|e| object_error(id, e))?;
        let kind = object_kind(id, object.kind())?;

        Ok(RawObject {
            kind,
            size: object.len() as u64,
            payload: object.data().to_vec(),
        })
    }

    /// Reads only the header, so the payload of a rejected object stays on disk
    fn object_header(&self, id: &Sha1Id) -> Result<(ObjectKind, u64)> {
        let oid = id_to_oid(id)?;
        let odb = self.repo.odb().map_err(source_error)?;
        let (size, kind) = odb.read_header(oid).map_err(|e| object_error(id, e))?;
        Ok((object_kind(id, kind)?, size as u64))
    }
}

fn object_kind(id: &Sha1Id, kind: ObjectType) -> Result<ObjectKind> {
    match kind {
        ObjectType::Blob => Ok(ObjectKind::Blob),
        ObjectType::Tree => Ok(ObjectKind::Tree),
        ObjectType::Commit => Ok(ObjectKind::Commit),
        ObjectType::Tag => Ok(ObjectKind::Tag),
        other => Err(MirrorError::UnsupportedType {
            id: *id,
            kind: other.str().to_string(),
        }),
    }
}

fn object_error(id: &Sha1Id, e: git2::Error) -> MirrorError {
    if e.code() == ErrorCode::NotFound {
        MirrorError::ObjectNotFound { id: *id }
    } else {
        source_error(e)
    }
}

/// Convert a git2 object id
pub fn oid_to_id(oid: Oid) -> Sha1Id {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(oid.as_bytes());
    Sha1Id::from_bytes(bytes)
}

/// Convert to a git2 object id
pub fn id_to_oid(id: &Sha1Id) -> Result<Oid> {
    Oid::from_bytes(id.as_bytes()).map_err(source_error)
}

fn source_error(e: git2::Error) -> MirrorError {
    MirrorError::source(e.message().to_string())
}
