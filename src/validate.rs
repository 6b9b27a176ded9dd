//! Port validator
//!
//! Pure checks for a candidate port: range, policy reservations, and
//! conflicts with assignments already committed to the allocation set.
//! Never mutates its inputs; callers re-validate whenever earlier
//! assignments change the picture.

use crate::allocation::AllocationSet;
use crate::catalog::{Protocol, ServiceDescriptor};
use crate::error::{PortError, PortResult};
use crate::policy::PortPolicy;

/// Check a candidate port for `service` on `protocol` against the set.
///
/// A zero port is the "no static port" sentinel: legal exactly when the
/// service allows being disabled, and exempt from reservation and conflict
/// checks.
pub fn validate(
    service: &ServiceDescriptor,
    protocol: Protocol,
    port: u16,
    set: &AllocationSet<'_>,
    policy: &PortPolicy,
) -> PortResult<()> {
    if port == 0 {
        if service.allows_disabled {
            return Ok(());
        }
        return Err(PortError::OutOfRange {
            service: service.name.to_string(),
            port,
        });
    }

    if let Some(reason) = policy.reserved_reason(port) {
        return Err(PortError::ReservedPort { port, reason });
    }

    if let Some(holder) = set
        .assignments()
        .iter()
        .find(|a| a.protocol == protocol && a.port == port && a.service != service.name)
    {
        return Err(PortError::Conflict {
            port,
            protocol,
            with_service: holder.service.to_string(),
        });
    }

    Ok(())
}
