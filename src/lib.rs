//! Staticport - static port allocation engine for rpcbind-based services
//!
//! rpcbind services like NFSv3's mountd/statd/lockd or the NIS daemons bind
//! an arbitrary free port at startup, which a stateless perimeter firewall
//! cannot whitelist. This crate decides, validates, records, and reconciles
//! a consistent mapping from (service, protocol) pairs to fixed port
//! numbers across the sysconfig files that persist them, and derives the
//! port list the firewall must open.
//!
//! One run is a linear sequence: [`AllocationSet::load`] the on-disk state,
//! mutate it through validated [`AllocationSet::propose`] /
//! [`AllocationSet::disable`] calls, derive a [`ReconciliationPlan`] with
//! [`plan`], and [`apply`] it. The surrounding CLI and the firewall reload
//! mechanism are external collaborators behind the [`ArtifactStore`] and
//! [`FirewallReload`] traits.

pub mod allocation;
pub mod apply;
pub mod artifact;
pub mod catalog;
pub mod error;
pub mod firewall;
pub mod plan;
pub mod policy;
pub mod store;
pub mod validate;

// Re-exports for convenience
pub use allocation::{AllocationSet, PortAssignment};
pub use apply::{apply, AppliedReport};
pub use artifact::{ArtifactRef, Document};
pub use catalog::{Catalog, Pattern, Protocol, ServiceDescriptor, ValueSyntax, RPCBIND_PORT};
pub use error::{PortError, PortResult};
pub use firewall::{FirewallError, FirewallReload, NullFirewall, PortTuple, RecordingFirewall};
pub use plan::{plan, ArtifactWrite, ReconciliationPlan};
pub use policy::PortPolicy;
pub use store::{ArtifactStore, LocalStore, MemoryStore};
pub use validate::validate;
