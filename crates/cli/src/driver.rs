//! Top-level mirror run: resolve a reference, push its graph, patch the root

use crate::config::MirrorConfig;
use anyhow::{Context, Result};
use mirror_core::{
    BlockStore, ContentId, GraphPusher, ObjectSource, PushProgress, PushReport, RootUpdater,
    Sha1Id,
};
use tracing::{info, warn};

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutcome {
    /// Reference name, also the path it was linked under
    pub reference: String,
    /// Object the reference resolved to
    pub head: Sha1Id,
    /// Its identifier in the block store
    pub object: ContentId,
    /// Container that was patched
    pub base: ContentId,
    /// Container returned by the patch
    pub new_root: ContentId,
    pub report: PushReport,
}

/// Mirror `reference` from `source` into `store`.
///
/// The reference is linked under its own name inside `existing_root`, or
/// inside the configured empty container when none is given.
pub fn mirror_reference(
    source: &dyn ObjectSource,
    store: &dyn BlockStore,
    reference: &str,
    existing_root: Option<ContentId>,
    config: &MirrorConfig,
    progress: &mut dyn PushProgress,
) -> Result<MirrorOutcome> {
    // Listing is informational only
    match source.list_references() {
        Ok(refs) => {
            for (name, id) in refs {
                info!("Ref: {} -> {}", name, id);
            }
        }
        Err(e) => warn!("Could not list references: {}", e),
    }

    let head = source
        .resolve_reference(reference)
        .with_context(|| format!("Failed to resolve {}", reference))?;
    info!("Ref's hash {}", head);

    let updater = RootUpdater::new(config.empty_root()?);
    let base = updater
        .prepare_base(store, existing_root)
        .context("Failed to fetch the base container")?;

    let visited = config.visited_backend()?.open()?;
    let report = GraphPusher::new(source, store, visited.as_ref())
        .with_options(config.push_options())
        .push_with_progress(&head, progress)
        .with_context(|| format!("Failed to push {}", reference))?;
    info!("Ref should be @ {}", report.root);

    let new_root = updater
        .update(store, &base, reference, &report.root)
        .with_context(|| format!("Failed to link {} into {}", reference, base))?;
    info!("New repo should be @ {}", new_root);

    Ok(MirrorOutcome {
        reference: reference.to_string(),
        head,
        object: report.root,
        base,
        new_root,
        report,
    })
}
