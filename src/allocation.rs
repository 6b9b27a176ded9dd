//! Allocation set
//!
//! The in-memory model of the desired service-to-port mapping for one run.
//! Built by loading the on-disk artifacts, mutated through validated
//! `propose`/`disable` calls, then handed to the reconciler. A rejected
//! mutation leaves the set untouched.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::artifact::{parse_error, Document};
use crate::catalog::{Catalog, Protocol, ServiceDescriptor};
use crate::error::{PortError, PortResult};
use crate::firewall::PortTuple;
use crate::policy::PortPolicy;
use crate::store::ArtifactStore;
use crate::validate::validate;

/// One desired port for one (service, protocol) pair
///
/// `port` 0 means "no static port" and is only recorded for services that
/// allow being disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAssignment {
    pub service: &'static str,
    pub protocol: Protocol,
    pub port: u16,
}

/// The mapping under construction, keyed by (service, protocol)
///
/// Insertion order is preserved; [`AllocationSet::snapshot`] re-sorts into
/// catalog order for deterministic display and diffing.
#[derive(Debug, Clone)]
pub struct AllocationSet<'a> {
    catalog: &'a Catalog,
    entries: Vec<PortAssignment>,
}

impl PartialEq for AllocationSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a> AllocationSet<'a> {
    /// Empty set over the given catalog
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            entries: Vec::new(),
        }
    }

    /// Build the set from the on-disk artifacts.
    ///
    /// A missing file or missing key yields no assignment for that service
    /// (unconfigured). A value that is present but not scannable as a port
    /// aborts the whole load with `ParseError`; the engine cannot reason
    /// about a half-understood on-disk state. Loaded entries are recorded
    /// verbatim without cross-validation: the disk is a fact, not a
    /// proposal.
    pub fn load(catalog: &'a Catalog, store: &dyn ArtifactStore) -> PortResult<Self> {
        let mut documents: HashMap<&'static str, Document> = HashMap::new();
        let mut set = Self::new(catalog);

        for svc in catalog.services() {
            if !documents.contains_key(svc.file) {
                documents.insert(svc.file, Document::load(store, Path::new(svc.file))?);
            }
            let doc = &documents[svc.file];

            for (key, protocols) in svc.key_groups() {
                let Some(raw) = doc.get(key) else { continue };
                let port = match svc.syntax.scan(raw) {
                    Ok(Some(port)) => port,
                    Ok(None) => continue,
                    Err(_) => return Err(parse_error(Path::new(svc.file), key, raw)),
                };
                debug!(service = svc.name, key, port, "loaded static port");
                for protocol in protocols {
                    set.entries.push(PortAssignment {
                        service: svc.name,
                        protocol,
                        port,
                    });
                }
            }
        }

        Ok(set)
    }

    /// The catalog this set was built over
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// All assignments in insertion order
    pub fn assignments(&self) -> &[PortAssignment] {
        &self.entries
    }

    /// Desired port for a (service, protocol) pair, if any
    pub fn get(&self, service: &str, protocol: Protocol) -> Option<u16> {
        self.entries
            .iter()
            .find(|a| a.service == service && a.protocol == protocol)
            .map(|a| a.port)
    }

    /// Validate and commit one port choice.
    ///
    /// For a service whose protocols share a single sysconfig key (mountd,
    /// and all the NIS daemons) proposing either protocol assigns the same
    /// port to every protocol the service registers; each is validated. On
    /// any validation failure nothing is committed.
    pub fn propose(
        &mut self,
        service: &str,
        protocol: Protocol,
        port: u16,
        policy: &PortPolicy,
    ) -> PortResult<()> {
        let svc = self.catalog.find(service)?;
        if svc.key_for(protocol).is_none() {
            return Err(PortError::NotFound {
                service: format!("{service} ({protocol})"),
            });
        }

        let targets: Vec<Protocol> = if svc.shares_key() {
            svc.protocols().collect()
        } else {
            vec![protocol]
        };

        for proto in &targets {
            validate(svc, *proto, port, self, policy)?;
        }

        for proto in targets {
            self.commit(svc, proto, port);
        }
        Ok(())
    }

    /// Record "no static port" for every protocol of the service
    pub fn disable(&mut self, service: &str, policy: &PortPolicy) -> PortResult<()> {
        let svc = self.catalog.find(service)?;
        if !svc.allows_disabled {
            return Err(PortError::CannotDisable {
                service: service.to_string(),
            });
        }
        let protocols: Vec<Protocol> = svc.protocols().collect();
        for proto in protocols {
            // port 0 always validates for an allows_disabled service
            self.propose(service, proto, 0, policy)?;
        }
        Ok(())
    }

    /// First assignable port at or above the policy floor.
    ///
    /// Skips reserved ports and ports already held by any service on
    /// `protocol`; the returned port is guaranteed to pass validation
    /// against the set it was computed from.
    pub fn next_free(&self, protocol: Protocol, policy: &PortPolicy) -> PortResult<u16> {
        let mut port = policy.floor.max(1);
        loop {
            let taken = self
                .entries
                .iter()
                .any(|a| a.protocol == protocol && a.port == port);
            if !taken && !policy.is_reserved(port) {
                return Ok(port);
            }
            port = match port.checked_add(1) {
                Some(next) => next,
                None => return Err(PortError::RangeExhausted { protocol }),
            };
        }
    }

    /// Read-only view in catalog order, then protocol order
    pub fn snapshot(&self) -> Vec<&PortAssignment> {
        let mut view: Vec<&PortAssignment> = self.entries.iter().collect();
        view.sort_by_key(|a| (self.catalog.position(a.service), a.protocol));
        view
    }

    /// The complete firewall picture of this set: one tuple per non-zero
    /// assignment
    pub fn firewall_ports(&self) -> BTreeSet<PortTuple> {
        self.entries
            .iter()
            .filter(|a| a.port != 0)
            .map(|a| PortTuple::new(a.port, a.protocol))
            .collect()
    }

    fn commit(&mut self, svc: &ServiceDescriptor, protocol: Protocol, port: u16) {
        match self
            .entries
            .iter_mut()
            .find(|a| a.service == svc.name && a.protocol == protocol)
        {
            Some(entry) => entry.port = port,
            None => self.entries.push(PortAssignment {
                service: svc.name,
                protocol,
                port,
            }),
        }
    }
}
