//! Reconciler
//!
//! Computes the minimal set of artifact writes that moves the on-disk state
//! to the desired allocation set, plus the complete firewall picture. The
//! plan operates on a delta: services present on disk but absent from the
//! desired set are never touched.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::allocation::AllocationSet;
use crate::artifact::ArtifactRef;
use crate::catalog::Protocol;
use crate::firewall::PortTuple;

/// One pending `KEY="value"` update in one artifact file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactWrite {
    pub target: ArtifactRef,
    /// Rendered value, without quotes; empty clears the static port
    pub value: String,
}

/// The changes one run will make, and the ports the firewall must open
///
/// `firewall_ports` always reflects the FULL desired set, not just the
/// delta: the firewall has to match the complete live picture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationPlan {
    pub writes: Vec<ArtifactWrite>,
    pub firewall_ports: BTreeSet<PortTuple>,
}

impl ReconciliationPlan {
    /// Whether nothing needs to be written
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Distinct artifact files touched, in write order
    pub fn files(&self) -> Vec<&PathBuf> {
        let mut files = Vec::new();
        for write in &self.writes {
            if !files.contains(&&write.target.file) {
                files.push(&write.target.file);
            }
        }
        files
    }

    /// Merge a pattern's fixed ports (e.g. NFSv4's 2049/tcp+udp) into the
    /// firewall picture
    pub fn with_fixed_ports(mut self, fixed: &[(u16, Protocol)]) -> Self {
        for (port, protocol) in fixed {
            self.firewall_ports.insert(PortTuple::new(*port, *protocol));
        }
        self
    }
}

/// Compare on-disk state to the desired set and derive the plan.
///
/// Per (service, key): equal values produce no write; a key configured only
/// in the desired set is always a write; a key configured only on disk is
/// left untouched. A desired zero port and an absent on-disk entry are the
/// same thing ("no static port"), so disabling an already-unconfigured
/// service writes nothing. Shared-key services emit one write even though
/// two protocol assignments exist.
pub fn plan(current: &AllocationSet<'_>, desired: &AllocationSet<'_>) -> ReconciliationPlan {
    let catalog = desired.catalog();
    let mut plan = ReconciliationPlan {
        writes: Vec::new(),
        firewall_ports: desired.firewall_ports(),
    };

    for svc in catalog.services() {
        for (key, protocols) in svc.key_groups() {
            // all protocols of a key group carry the same port
            let probe = protocols[0];
            let Some(desired_port) = desired.get(svc.name, probe) else {
                continue;
            };
            let current_port = current.get(svc.name, probe);

            // zero and unconfigured both mean "no static port"
            let desired_norm = (desired_port != 0).then_some(desired_port);
            let current_norm = current_port.filter(|p| *p != 0);
            if desired_norm == current_norm {
                continue;
            }

            let value = match desired_norm {
                Some(port) => svc.syntax.render(port),
                None => String::new(),
            };
            debug!(service = svc.name, key, value = %value, "planned artifact write");
            plan.writes.push(ArtifactWrite {
                target: ArtifactRef::new(svc.file, key),
                value,
            });
        }
    }

    plan
}
