//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;

use staticport::{Catalog, LocalStore, PortPolicy};
use tempfile::TempDir;

/// Realistic sysconfig content for `/etc/sysconfig/nfs`, ports unset
pub const NFS_SYSCONFIG: &str = "\
## Path:	Network/File systems/NFS server
## Description:	NFS server settings
# Comment above the mountd port
MOUNTD_PORT=\"\"

STATD_PORT=\"\"
LOCKD_TCPPORT=\"\"
LOCKD_UDPPORT=\"\"
RQUOTAD_PORT=\"\"
USE_KERNEL_NFSD_NUMBER=\"4\"
";

pub const YPBIND_SYSCONFIG: &str = "\
## Description: ypbind options
YPBIND_OPTIONS=\"\"
";

pub const YPSERV_SYSCONFIG: &str = "\
## Description: NIS server options
YPSERV_ARGS=\"\"
YPPASSWDD_ARGS=\"\"
YPXFRD_ARGS=\"\"
";

/// A config directory on disk seeded with all three sysconfig files
pub struct ConfigDir {
    pub dir: TempDir,
    pub store: LocalStore,
}

impl ConfigDir {
    pub fn seeded() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nfs"), NFS_SYSCONFIG).unwrap();
        std::fs::write(dir.path().join("ypbind"), YPBIND_SYSCONFIG).unwrap();
        std::fs::write(dir.path().join("ypserv"), YPSERV_SYSCONFIG).unwrap();
        let store = LocalStore::new(dir.path());
        Self { dir, store }
    }

    pub fn content(&self, file: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(file)).unwrap()
    }
}

pub fn catalog() -> Catalog {
    Catalog::new()
}

pub fn policy() -> PortPolicy {
    PortPolicy::default()
}

/// Assert a file contains a `KEY="value"` line
pub fn assert_entry(content: &str, key: &str, value: &str) {
    let needle = format!("{key}=\"{value}\"");
    assert!(
        content.lines().any(|l| l.trim() == needle),
        "expected {needle} in:\n{content}"
    );
}

/// Catalog-relative artifact path helper
pub fn file(name: &str) -> &Path {
    Path::new(name)
}
