//! Per-run set of objects already claimed for pushing
//!
//! `claim` is a single test-and-set step: exactly one caller gets `true` for
//! a given id, even if two parents discover the same child. Sets live for one
//! traversal and are dropped with it.

use crate::error::Result;
use crate::hash::Sha1Id;
use ahash::AHashSet;
use parking_lot::Mutex;

/// Set of object ids handled during one traversal
pub trait VisitedSet {
    /// Has `id` been claimed already?
    fn contains(&self, id: &Sha1Id) -> Result<bool>;

    /// Claim `id` for processing; `true` only for the first claim
    fn claim(&self, id: &Sha1Id) -> Result<bool>;

    /// Number of claimed ids
    fn len(&self) -> Result<usize>;

    /// True if nothing has been claimed yet
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Which backend to build for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitedBackend {
    /// Hash set behind a mutex
    #[default]
    Memory,
    /// Temporary sled tree, removed when the run ends
    Sled,
}

impl VisitedBackend {
    /// Parse a backend name from configuration
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "memory" => Some(VisitedBackend::Memory),
            "sled" => Some(VisitedBackend::Sled),
            _ => None,
        }
    }

    /// Create an empty set for a new run
    pub fn open(&self) -> Result<Box<dyn VisitedSet>> {
        Ok(match self {
            VisitedBackend::Memory => Box::new(MemoryVisitedSet::new()),
            VisitedBackend::Sled => Box::new(SledVisitedSet::temporary()?),
        })
    }
}

/// In-memory visited set
#[derive(Debug, Default)]
pub struct MemoryVisitedSet {
    ids: Mutex<AHashSet<Sha1Id>>,
}

impl MemoryVisitedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitedSet for MemoryVisitedSet {
    fn contains(&self, id: &Sha1Id) -> Result<bool> {
        Ok(self.ids.lock().contains(id))
    }

    fn claim(&self, id: &Sha1Id) -> Result<bool> {
        Ok(self.ids.lock().insert(*id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.ids.lock().len())
    }
}

/// Visited set in a throwaway sled database
pub struct SledVisitedSet {
    db: sled::Db,
}

impl SledVisitedSet {
    /// Open a temporary database that is deleted on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl VisitedSet for SledVisitedSet {
    fn contains(&self, id: &Sha1Id) -> Result<bool> {
        Ok(self.db.contains_key(id.as_bytes())?)
    }

    fn claim(&self, id: &Sha1Id) -> Result<bool> {
        // Insert-if-absent; a swap failure means another caller won
        let swapped = self
            .db
            .compare_and_swap(id.as_bytes(), None as Option<&[u8]>, Some(&[] as &[u8]))?;
        Ok(swapped.is_ok())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.db.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(set: &dyn VisitedSet) {
        let a = Sha1Id::from_bytes([1; 20]);
        let b = Sha1Id::from_bytes([2; 20]);

        assert!(set.is_empty().unwrap());
        assert!(!set.contains(&a).unwrap());

        assert!(set.claim(&a).unwrap());
        assert!(!set.claim(&a).unwrap(), "second claim must lose");
        assert!(set.contains(&a).unwrap());
        assert!(!set.contains(&b).unwrap());

        assert!(set.claim(&b).unwrap());
        assert_eq!(set.len().unwrap(), 2);
    }

    #[test]
    fn test_memory_claim_is_test_and_set() {
        exercise(&MemoryVisitedSet::new());
    }

    #[test]
    fn test_sled_claim_is_test_and_set() {
        exercise(&SledVisitedSet::temporary().unwrap());
    }

    #[test]
    fn test_backends_start_empty() {
        for backend in [VisitedBackend::Memory, VisitedBackend::Sled] {
            let set = backend.open().unwrap();
            assert_eq!(set.len().unwrap(), 0);
        }
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let set = Arc::new(MemoryVisitedSet::new());
        let wins = Arc::new(AtomicUsize::new(0));
        let id = Sha1Id::from_bytes([7; 20]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                let wins = wins.clone();
                std::thread::spawn(move || {
                    if set.claim(&id).unwrap() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(VisitedBackend::parse("memory"), Some(VisitedBackend::Memory));
        assert_eq!(VisitedBackend::parse("sled"), Some(VisitedBackend::Sled));
        assert_eq!(VisitedBackend::parse("badger"), None);
    }
}
