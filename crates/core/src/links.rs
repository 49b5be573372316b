//! Link extraction from git object payloads
//!
//! Parses just enough of each object kind to find the ids it references.
//! A payload that lacks a required field is an error, never an empty link
//! set: pushing a half-linked object would leave the destination graph
//! inconsistent.

use crate::error::{MirrorError, Result};
use crate::hash::{Sha1Id, SHA1_LEN};
use crate::object::ObjectKind;

/// Ordered child ids of one object
pub type LinkSet = Vec<Sha1Id>;

/// Mode of a gitlink (submodule commit) tree entry
pub const GITLINK_MODE: u32 = 0o160000;

/// One entry of a tree object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Unix mode, parsed from octal
    pub mode: u32,
    /// Entry name (raw bytes, not necessarily UTF-8)
    pub name: Vec<u8>,
    /// Referenced object
    pub id: Sha1Id,
}

impl TreeEntry {
    /// True for submodule entries, which point into another repository
    pub fn is_gitlink(&self) -> bool {
        self.mode == GITLINK_MODE
    }
}

/// The link-bearing headers of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLinks {
    pub tree: Sha1Id,
    pub parents: Vec<Sha1Id>,
}

/// The link-bearing headers of an annotated tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLinks {
    pub object: Sha1Id,
    /// Declared kind of the tagged object, when the tag names one
    pub target_kind: Option<ObjectKind>,
}

/// Extract the ids an object references, in traversal order.
///
/// - blob: nothing
/// - tree: one id per entry, in entry order
/// - commit: tree first, then parents in listed order
/// - tag: the tagged object
pub fn extract_links(kind: ObjectKind, payload: &[u8]) -> Result<LinkSet> {
    match kind {
        ObjectKind::Blob => Ok(Vec::new()),
        ObjectKind::Tree => Ok(parse_tree(payload)?.into_iter().map(|e| e.id).collect()),
        ObjectKind::Commit => {
            let commit = parse_commit(payload)?;
            let mut links = Vec::with_capacity(1 + commit.parents.len());
            links.push(commit.tree);
            links.extend(commit.parents);
            Ok(links)
        }
        ObjectKind::Tag => Ok(vec![parse_tag(payload)?.object]),
    }
}

/// Parse a tree payload: `<octal mode> <name>\0<20 byte id>` repeated
pub fn parse_tree(content: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < content.len() {
        let space = content[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| MirrorError::parse("tree", "missing space after mode"))?;
        let mode_str = std::str::from_utf8(&content[pos..pos + space])
            .map_err(|e| MirrorError::parse("tree", format!("invalid mode: {}", e)))?;
        if mode_str.is_empty() {
            return Err(MirrorError::parse("tree", "empty mode"));
        }
        let mode = u32::from_str_radix(mode_str, 8)
            .map_err(|e| MirrorError::parse("tree", format!("invalid mode '{}': {}", mode_str, e)))?;
        pos += space + 1;

        let nul = content[pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| MirrorError::parse("tree", "missing NUL after name"))?;
        let name = content[pos..pos + nul].to_vec();
        pos += nul + 1;

        if pos + SHA1_LEN > content.len() {
            return Err(MirrorError::parse("tree", "truncated entry id"));
        }
        let id = Sha1Id::from_slice(&content[pos..pos + SHA1_LEN])?;
        pos += SHA1_LEN;

        entries.push(TreeEntry { mode, name, id });
    }

    Ok(entries)
}

/// Header lines of a commit or tag, up to the first blank line.
///
/// Continuation lines (leading space, as in `gpgsig`) are skipped.
fn header_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content
        .split(|&b| b == b'\n')
        .take_while(|line| !line.is_empty())
        .filter(|line| !line.starts_with(b" "))
}

fn header_id(kind: &'static str, field: &str, value: &[u8]) -> Result<Sha1Id> {
    let hex_str = std::str::from_utf8(value)
        .map_err(|e| MirrorError::parse(kind, format!("invalid {} line: {}", field, e)))?;
    Sha1Id::from_hex(hex_str)
        .map_err(|_| MirrorError::parse(kind, format!("invalid {} id '{}'", field, hex_str)))
}

/// Parse the tree and parent headers of a commit payload
pub fn parse_commit(content: &[u8]) -> Result<CommitLinks> {
    let mut lines = header_lines(content);

    let first = lines
        .next()
        .ok_or_else(|| MirrorError::parse("commit", "missing tree line"))?;
    let tree_hex = first
        .strip_prefix(b"tree ")
        .ok_or_else(|| MirrorError::parse("commit", "first header is not a tree line"))?;
    let tree = header_id("commit", "tree", tree_hex)?;

    let mut parents = Vec::new();
    for line in lines {
        if let Some(parent_hex) = line.strip_prefix(b"parent ") {
            parents.push(header_id("commit", "parent", parent_hex)?);
        }
    }

    Ok(CommitLinks { tree, parents })
}

/// Parse the object and type headers of a tag payload
pub fn parse_tag(content: &[u8]) -> Result<TagLinks> {
    let mut object = None;
    let mut target_kind = None;

    for line in header_lines(content) {
        if let Some(object_hex) = line.strip_prefix(b"object ") {
            object = Some(header_id("tag", "object", object_hex)?);
        } else if let Some(type_name) = line.strip_prefix(b"type ") {
            target_kind = std::str::from_utf8(type_name).ok().and_then(ObjectKind::parse);
        }
    }

    let object = object.ok_or_else(|| MirrorError::parse("tag", "missing object line"))?;
    Ok(TagLinks { object, target_kind })
}
