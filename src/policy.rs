//! Port assignment policy
//!
//! The lower bound of the static range and the set of ports that are
//! off-limits (observed in use, or reserved by local convention) are site
//! decisions, not engine constants. They are injected as a [`PortPolicy`],
//! optionally loaded from a TOML file:
//!
//! ```toml
//! floor = 30000
//! ephemeral_start = 32768
//! ephemeral_end = 60999
//! exclusions = [20048, 20049]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::RPCBIND_PORT;
use crate::error::{PortError, PortResult};

/// Policy parameters governing which ports may be assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPolicy {
    /// First port considered by auto-assignment scans
    #[serde(default = "default_floor")]
    pub floor: u16,

    /// Start of the ephemeral range (inclusive), excluded from assignment
    #[serde(default = "default_ephemeral_start")]
    pub ephemeral_start: u16,

    /// End of the ephemeral range (inclusive), excluded from assignment
    #[serde(default = "default_ephemeral_end")]
    pub ephemeral_end: u16,

    /// Ports claimed by unrelated running services or reserved by convention
    #[serde(default)]
    pub exclusions: BTreeSet<u16>,
}

fn default_floor() -> u16 {
    30000
}

/// Linux default ephemeral range (net.ipv4.ip_local_port_range)
fn default_ephemeral_start() -> u16 {
    32768
}

fn default_ephemeral_end() -> u16 {
    60999
}

impl Default for PortPolicy {
    fn default() -> Self {
        Self {
            floor: default_floor(),
            ephemeral_start: default_ephemeral_start(),
            ephemeral_end: default_ephemeral_end(),
            exclusions: BTreeSet::new(),
        }
    }
}

impl PortPolicy {
    /// Parse a policy from TOML text
    pub fn from_toml_str(text: &str, origin: &Path) -> PortResult<Self> {
        toml::from_str(text).map_err(|e| PortError::Policy {
            file: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a policy file from disk
    pub fn load(path: &Path) -> PortResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PortError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Why a port is off-limits, or `None` if assignable
    pub fn reserved_reason(&self, port: u16) -> Option<String> {
        if port == RPCBIND_PORT {
            return Some(format!("rpcbind's own listening port ({RPCBIND_PORT})"));
        }
        if (self.ephemeral_start..=self.ephemeral_end).contains(&port) {
            return Some(format!(
                "inside the ephemeral range {}-{}",
                self.ephemeral_start, self.ephemeral_end
            ));
        }
        if self.exclusions.contains(&port) {
            return Some("on the exclusion list".to_string());
        }
        None
    }

    /// Whether a port is off-limits for static assignment
    pub fn is_reserved(&self, port: u16) -> bool {
        self.reserved_reason(port).is_some()
    }
}
