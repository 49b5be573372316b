//! Throwaway git repositories built with git2

use git2::{Oid, Repository, Signature, Time, TreeWalkMode, TreeWalkResult};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tempfile::TempDir;

/// A git repository in a temporary directory
pub struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Repository::init(dir.path()).expect("git init");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Commit `files` (slash-separated paths) on `refs/heads/main`
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let tree_id = self.write_tree(files);
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let sig = signature();

        let parent = self
            .repo
            .refname_to_id("refs/heads/main")
            .ok()
            .map(|id| self.repo.find_commit(id).expect("find parent"));
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let id = self
            .repo
            .commit(Some("refs/heads/main"), &sig, &sig, message, &tree, &parents)
            .expect("commit");
        self.repo.set_head("refs/heads/main").expect("set HEAD");
        id
    }

    /// Annotated tag pointing at `target`
    pub fn tag(&self, name: &str, target: Oid) -> Oid {
        let object = self.repo.find_object(target, None).expect("find target");
        self.repo
            .tag(name, &object, &signature(), "release\n", false)
            .expect("tag")
    }

    /// Every object reachable from the commit `head`
    pub fn reachable(&self, head: Oid) -> HashSet<Oid> {
        let mut seen = HashSet::new();
        let mut walk = self.repo.revwalk().expect("revwalk");
        walk.push(head).expect("push head");
        for commit_id in walk {
            let commit = self.repo.find_commit(commit_id.expect("walk")).expect("commit");
            seen.insert(commit.id());
            seen.insert(commit.tree_id());
            commit
                .tree()
                .expect("tree")
                .walk(TreeWalkMode::PreOrder, |_, entry| {
                    seen.insert(entry.id());
                    TreeWalkResult::Ok
                })
                .expect("tree walk");
        }
        seen
    }

    fn write_tree(&self, files: &[(&str, &str)]) -> Oid {
        let mut blobs = Vec::new();
        let mut dirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for (path, content) in files {
            match path.split_once('/') {
                Some((dir, rest)) => dirs.entry(dir).or_default().push((rest, *content)),
                None => blobs.push((*path, *content)),
            }
        }

        let mut builder = self.repo.treebuilder(None).expect("treebuilder");
        for (name, content) in blobs {
            let blob = self.repo.blob(content.as_bytes()).expect("blob");
            builder.insert(name, blob, 0o100644).expect("insert blob");
        }
        for (name, entries) in dirs {
            let subtree = self.write_tree(&entries);
            builder.insert(name, subtree, 0o040000).expect("insert tree");
        }
        builder.write().expect("write tree")
    }
}

fn signature() -> Signature<'static> {
    Signature::new("Test", "test@example.com", &Time::new(1_700_000_000, 0)).expect("signature")
}
