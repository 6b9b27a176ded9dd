//! Service catalog
//!
//! Describes every rpcbind-dependent service the engine knows how to pin to
//! a static port: its name, its protocols, the sysconfig artifact (file +
//! key) that persists its port, the syntax the value uses, and whether a
//! zero port is a legal "no static port" sentinel.
//!
//! The catalog is an explicitly constructed, immutable, process-lifetime
//! object passed by reference into every component that needs it. There is
//! no ambient global table.

use serde::{Deserialize, Serialize};

use crate::error::{PortError, PortResult};

/// Fixed listening port of rpcbind itself, never assignable to a service.
pub const RPCBIND_PORT: u16 = 111;

/// Transport protocol of a port registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Why a raw artifact value could not be interpreted as a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Value carries flag/argument text but no parseable number
    NotANumber,
    /// Numeric value outside the 16-bit port space
    OutOfPortSpace(u32),
}

/// How a port number is embedded in a sysconfig value.
///
/// `MOUNTD_PORT="20100"` is [`ValueSyntax::Bare`]; option-string variables
/// like `YPBIND_OPTIONS="-p 20100"` carry the port behind a command-line
/// flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSyntax {
    Bare,
    Flag(&'static str),
}

impl ValueSyntax {
    /// Extract the configured port from a raw (unquoted) artifact value.
    ///
    /// Returns `Ok(None)` when no port is configured: an empty value, or a
    /// flag-style value where the flag is absent (e.g. `YPBIND_OPTIONS`
    /// holding only `broadcast`). A present-but-unparseable port is a
    /// [`ScanError`], never a silent default.
    pub fn scan(&self, raw: &str) -> Result<Option<u16>, ScanError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        match self {
            ValueSyntax::Bare => Some(parse_port(raw)).transpose(),
            ValueSyntax::Flag(flag) => {
                let mut tokens = raw.split_whitespace();
                while let Some(token) = tokens.next() {
                    if token == *flag {
                        let arg = tokens.next().ok_or(ScanError::NotANumber)?;
                        return parse_port(arg).map(Some);
                    }
                }
                // flag not present: no static port configured
                Ok(None)
            }
        }
    }

    /// Render a non-zero port as the value to store, without quotes.
    pub fn render(&self, port: u16) -> String {
        match self {
            ValueSyntax::Bare => port.to_string(),
            ValueSyntax::Flag(flag) => format!("{flag} {port}"),
        }
    }
}

fn parse_port(token: &str) -> Result<u16, ScanError> {
    let n: u32 = token.parse().map_err(|_| ScanError::NotANumber)?;
    u16::try_from(n).map_err(|_| ScanError::OutOfPortSpace(n))
}

/// One supported rpcbind-dependent service
///
/// `entries` maps each protocol the service registers to the sysconfig key
/// persisting its port. Several services use one shared key for both
/// protocols (`MOUNTD_PORT` covers tcp and udp); lockd uses a distinct key
/// per protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    /// Artifact file name, resolved against the caller-supplied config root
    pub file: &'static str,
    pub entries: &'static [(Protocol, &'static str)],
    pub syntax: ValueSyntax,
    /// Whether port 0 is a legal "no static port" sentinel
    pub allows_disabled: bool,
}

impl ServiceDescriptor {
    /// Protocols this service registers, in catalog order
    pub fn protocols(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.entries.iter().map(|(proto, _)| *proto)
    }

    /// Sysconfig key persisting the port for `protocol`, if registered
    pub fn key_for(&self, protocol: Protocol) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(proto, _)| *proto == protocol)
            .map(|(_, key)| *key)
    }

    /// Whether all protocols share a single sysconfig key (and therefore a
    /// single port number)
    pub fn shares_key(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].1 == pair[1].1)
    }

    /// Distinct `(key, protocols)` groups in entry order
    pub fn key_groups(&self) -> Vec<(&'static str, Vec<Protocol>)> {
        let mut groups: Vec<(&'static str, Vec<Protocol>)> = Vec::new();
        for (proto, key) in self.entries {
            match groups.iter_mut().find(|(k, _)| k == key) {
                Some((_, protos)) => protos.push(*proto),
                None => groups.push((key, vec![*proto])),
            }
        }
        groups
    }
}

/// A deployment role grouping the services it needs
///
/// Patterns mirror the installable sysconfig profiles: an NFS server needs
/// mountd, statd, lockd and rquotad pinned, and additionally always has
/// NFSv4's fixed 2049 open on both protocols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub services: &'static [&'static str],
    /// Ports that are always open for this role, independent of allocation
    pub fixed_ports: &'static [(u16, Protocol)],
}

use Protocol::{Tcp, Udp};

const SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor {
        name: "mountd",
        file: "nfs",
        entries: &[(Tcp, "MOUNTD_PORT"), (Udp, "MOUNTD_PORT")],
        syntax: ValueSyntax::Bare,
        allows_disabled: true,
    },
    ServiceDescriptor {
        name: "status",
        file: "nfs",
        entries: &[(Tcp, "STATD_PORT"), (Udp, "STATD_PORT")],
        syntax: ValueSyntax::Bare,
        allows_disabled: false,
    },
    ServiceDescriptor {
        name: "nlockmgr",
        file: "nfs",
        entries: &[(Tcp, "LOCKD_TCPPORT"), (Udp, "LOCKD_UDPPORT")],
        syntax: ValueSyntax::Bare,
        allows_disabled: false,
    },
    ServiceDescriptor {
        name: "rquotad",
        file: "nfs",
        entries: &[(Tcp, "RQUOTAD_PORT"), (Udp, "RQUOTAD_PORT")],
        syntax: ValueSyntax::Bare,
        allows_disabled: true,
    },
    ServiceDescriptor {
        name: "ypbind",
        file: "ypbind",
        entries: &[(Tcp, "YPBIND_OPTIONS"), (Udp, "YPBIND_OPTIONS")],
        syntax: ValueSyntax::Flag("-p"),
        allows_disabled: true,
    },
    ServiceDescriptor {
        name: "ypserv",
        file: "ypserv",
        entries: &[(Tcp, "YPSERV_ARGS"), (Udp, "YPSERV_ARGS")],
        syntax: ValueSyntax::Flag("-p"),
        allows_disabled: true,
    },
    ServiceDescriptor {
        name: "yppasswdd",
        file: "ypserv",
        entries: &[(Tcp, "YPPASSWDD_ARGS"), (Udp, "YPPASSWDD_ARGS")],
        syntax: ValueSyntax::Flag("--port"),
        allows_disabled: true,
    },
    ServiceDescriptor {
        name: "ypxfrd",
        file: "ypserv",
        entries: &[(Tcp, "YPXFRD_ARGS"), (Udp, "YPXFRD_ARGS")],
        syntax: ValueSyntax::Flag("-p"),
        allows_disabled: true,
    },
];

const NFS_FIXED: &[(u16, Protocol)] = &[(2049, Tcp), (2049, Udp)];

const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "nfs-server",
        services: &["mountd", "status", "nlockmgr", "rquotad"],
        fixed_ports: NFS_FIXED,
    },
    Pattern {
        name: "nfs-client",
        services: &["status", "nlockmgr"],
        fixed_ports: NFS_FIXED,
    },
    Pattern {
        name: "yp-server",
        services: &["ypserv", "yppasswdd", "ypxfrd"],
        fixed_ports: &[],
    },
    Pattern {
        name: "yp-client",
        services: &["ypbind"],
        fixed_ports: &[],
    },
];

/// The immutable catalog of supported services and patterns
#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<ServiceDescriptor>,
    patterns: Vec<Pattern>,
}

impl Catalog {
    /// Build the catalog from the compiled-in service table
    pub fn new() -> Self {
        Self {
            services: SERVICES.to_vec(),
            patterns: PATTERNS.to_vec(),
        }
    }

    /// All supported services, in stable catalog order
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Look up a service by name
    pub fn find(&self, name: &str) -> PortResult<&ServiceDescriptor> {
        self.services
            .iter()
            .find(|svc| svc.name == name)
            .ok_or_else(|| PortError::NotFound {
                service: name.to_string(),
            })
    }

    /// Position of a service in catalog order (used for stable snapshots)
    pub fn position(&self, name: &str) -> Option<usize> {
        self.services.iter().position(|svc| svc.name == name)
    }

    /// All deployment patterns, in stable order
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Look up a pattern by name
    pub fn find_pattern(&self, name: &str) -> PortResult<&Pattern> {
        self.patterns
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PortError::NotFound {
                service: name.to_string(),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
