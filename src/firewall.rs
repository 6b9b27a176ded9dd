//! Firewall reload port
//!
//! The engine decides which ports must be open; turning that list into
//! allow-rules and reloading the firewall is a collaborator's job. The
//! collaborator receives `<port>/<proto>` tuples in firewall-cmd syntax.

use std::sync::Mutex;

use thiserror::Error;

use crate::catalog::Protocol;

/// One port/protocol pair to be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortTuple {
    pub port: u16,
    pub protocol: Protocol,
}

impl PortTuple {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl std::fmt::Display for PortTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Failure reported by the firewall collaborator
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FirewallError {
    pub message: String,
}

impl FirewallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External firewall-reload collaborator
pub trait FirewallReload {
    /// Hand over the complete set of ports that must be open
    fn reload(&self, ports: &[PortTuple]) -> Result<(), FirewallError>;
}

/// Collaborator that does nothing (config-only runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFirewall;

impl FirewallReload for NullFirewall {
    fn reload(&self, _ports: &[PortTuple]) -> Result<(), FirewallError> {
        Ok(())
    }
}

/// Test double recording every reload call
#[derive(Debug, Default)]
pub struct RecordingFirewall {
    calls: Mutex<Vec<Vec<PortTuple>>>,
    fail: bool,
}

impl RecordingFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose reload always fails
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// All reload calls seen so far
    pub fn calls(&self) -> Vec<Vec<PortTuple>> {
        self.calls.lock().unwrap().clone()
    }
}

impl FirewallReload for RecordingFirewall {
    fn reload(&self, ports: &[PortTuple]) -> Result<(), FirewallError> {
        self.calls.lock().unwrap().push(ports.to_vec());
        if self.fail {
            return Err(FirewallError::new("firewalld is not running"));
        }
        Ok(())
    }
}
