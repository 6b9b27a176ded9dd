//! Persistence writer
//!
//! Applies a reconciliation plan: one read-modify-atomic-replace per
//! artifact file, then hands the firewall picture to the reload
//! collaborator. There is no multi-file transaction; a failure part-way
//! reports exactly which files were written and which were not, and nothing
//! is rolled back.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::artifact::Document;
use crate::error::{PortError, PortResult};
use crate::firewall::{FirewallReload, PortTuple};
use crate::plan::{ArtifactWrite, ReconciliationPlan};
use crate::store::ArtifactStore;

/// What one `apply` run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReport {
    /// Artifact files rewritten, in order
    pub written: Vec<PathBuf>,
    /// Port tuples handed to the firewall collaborator, sorted
    pub firewall_ports: Vec<PortTuple>,
}

/// Apply the plan's writes, then trigger the firewall reload.
///
/// Config files and firewall are independent systems of record: a reload
/// failure is reported as `FirewallReloadFailed` but does not undo the
/// already-written artifacts.
pub fn apply(
    plan: &ReconciliationPlan,
    store: &dyn ArtifactStore,
    firewall: &dyn FirewallReload,
) -> PortResult<AppliedReport> {
    let by_file = group_by_file(&plan.writes);
    let mut written: Vec<PathBuf> = Vec::new();

    for (idx, (file, writes)) in by_file.iter().enumerate() {
        if let Err(cause) = apply_file(store, file, writes) {
            return Err(PortError::PartialFailure {
                applied: written,
                remaining: by_file[idx..].iter().map(|(f, _)| f.clone()).collect(),
                cause: Box::new(cause),
            });
        }
        info!(file = %file.display(), keys = writes.len(), "artifact updated");
        written.push(file.clone());
    }

    let firewall_ports: Vec<PortTuple> = plan.firewall_ports.iter().copied().collect();
    firewall
        .reload(&firewall_ports)
        .map_err(|e| PortError::FirewallReloadFailed { message: e.message })?;
    info!(ports = firewall_ports.len(), "firewall reloaded");

    Ok(AppliedReport {
        written,
        firewall_ports,
    })
}

fn apply_file(store: &dyn ArtifactStore, file: &Path, writes: &[&ArtifactWrite]) -> PortResult<()> {
    let mut doc = Document::load(store, file)?;
    for write in writes {
        doc.set(&write.target.key, &write.value);
    }
    store.write_atomic(file, &doc.render())
}

fn group_by_file(writes: &[ArtifactWrite]) -> Vec<(PathBuf, Vec<&ArtifactWrite>)> {
    let mut groups: Vec<(PathBuf, Vec<&ArtifactWrite>)> = Vec::new();
    for write in writes {
        match groups.iter_mut().find(|(file, _)| *file == write.target.file) {
            Some((_, group)) => group.push(write),
            None => groups.push((write.target.file.clone(), vec![write])),
        }
    }
    groups
}
