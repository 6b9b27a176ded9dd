//! End-to-end static configuration journeys against a real directory.

use staticport::{apply, plan, AllocationSet, PortTuple, Protocol, RecordingFirewall};

use crate::common::{assert_entry, catalog, policy, ConfigDir};

#[test]
fn configure_nfs_server_pattern_end_to_end() {
    let catalog = catalog();
    let policy = policy();
    let cfg = ConfigDir::seeded();

    let current = AllocationSet::load(&catalog, &cfg.store).unwrap();
    assert!(current.assignments().is_empty(), "seeded files have no ports");

    // auto-assign every service of the nfs-server pattern
    let mut desired = current.clone();
    let pattern = catalog.find_pattern("nfs-server").unwrap();
    for name in pattern.services {
        let svc = catalog.find(name).unwrap();
        for proto in svc.protocols().collect::<Vec<_>>() {
            if desired.get(name, proto).is_some() {
                continue; // shared-key propose already covered this protocol
            }
            let port = desired.next_free(proto, &policy).unwrap();
            desired.propose(name, proto, port, &policy).unwrap();
        }
    }

    let plan = plan(&current, &desired).with_fixed_ports(pattern.fixed_ports);
    // one write per sysconfig key: mountd, statd, lockd tcp, lockd udp, rquotad
    assert_eq!(plan.writes.len(), 5);

    let fw = RecordingFirewall::new();
    let report = apply(&plan, &cfg.store, &fw).unwrap();
    assert_eq!(report.written.len(), 1, "all keys live in the nfs file");

    let content = cfg.content("nfs");
    assert_entry(&content, "MOUNTD_PORT", "30000");
    // unrelated content survives the rewrite untouched
    assert!(content.contains("## Path:	Network/File systems/NFS server"));
    assert!(content.contains("# Comment above the mountd port"));
    assert_entry(&content, "USE_KERNEL_NFSD_NUMBER", "4");

    // the collaborator saw the full picture including the fixed NFSv4 ports
    let calls = fw.calls();
    let handed = &calls[0];
    assert!(handed.contains(&PortTuple::new(2049, Protocol::Tcp)));
    assert!(handed.contains(&PortTuple::new(2049, Protocol::Udp)));
    assert!(handed.contains(&PortTuple::new(30000, Protocol::Tcp)));

    // a second run over the now-written state plans nothing
    let reloaded = AllocationSet::load(&catalog, &cfg.store).unwrap();
    assert_eq!(reloaded, desired);
    let second = staticport::plan(&reloaded, &desired);
    assert!(second.is_empty());
    assert_eq!(second.firewall_ports, desired.firewall_ports());
}

#[test]
fn freshly_loaded_set_round_trips_to_an_empty_plan() {
    let catalog = catalog();
    let cfg = ConfigDir::seeded();

    let mut desired = AllocationSet::load(&catalog, &cfg.store).unwrap();
    desired.propose("mountd", Protocol::Tcp, 20100, &policy()).unwrap();
    let fw = RecordingFirewall::new();
    apply(
        &plan(&AllocationSet::load(&catalog, &cfg.store).unwrap(), &desired),
        &cfg.store,
        &fw,
    )
    .unwrap();

    // load -> plan against itself -> nothing to write
    let loaded = AllocationSet::load(&catalog, &cfg.store).unwrap();
    assert!(plan(&loaded, &loaded).is_empty());
}

#[test]
fn changing_one_service_touches_only_its_key() {
    let catalog = catalog();
    let policy = policy();
    let cfg = ConfigDir::seeded();

    // on disk: mountd pinned to 4000
    let mut bootstrap = AllocationSet::load(&catalog, &cfg.store).unwrap();
    bootstrap.propose("mountd", Protocol::Tcp, 4000, &policy).unwrap();
    let fw = RecordingFirewall::new();
    apply(
        &plan(&AllocationSet::new(&catalog), &bootstrap),
        &cfg.store,
        &fw,
    )
    .unwrap();

    // desired changes only statd
    let current = AllocationSet::load(&catalog, &cfg.store).unwrap();
    let mut desired = current.clone();
    desired.propose("status", Protocol::Tcp, 4001, &policy).unwrap();

    let plan = plan(&current, &desired);
    assert_eq!(plan.writes.len(), 1);
    assert_eq!(plan.writes[0].target.key, "STATD_PORT");
    // the firewall picture covers the unchanged mountd port too
    assert!(plan.firewall_ports.contains(&PortTuple::new(4000, Protocol::Tcp)));
    assert!(plan.firewall_ports.contains(&PortTuple::new(4001, Protocol::Tcp)));

    apply(&plan, &cfg.store, &fw).unwrap();
    let content = cfg.content("nfs");
    assert_entry(&content, "MOUNTD_PORT", "4000");
    assert_entry(&content, "STATD_PORT", "4001");
}

#[test]
fn conflicting_proposal_is_rejected_without_side_effects() {
    let catalog = catalog();
    let policy = policy();
    let cfg = ConfigDir::seeded();

    let mut set = AllocationSet::load(&catalog, &cfg.store).unwrap();
    set.propose("mountd", Protocol::Tcp, 4000, &policy).unwrap();

    let before = set.clone();
    let err = set.propose("status", Protocol::Tcp, 4000, &policy).unwrap_err();
    assert!(err.to_string().contains("mountd"));
    assert_eq!(set, before);
    assert_eq!(set.get("mountd", Protocol::Tcp), Some(4000));
    assert_eq!(set.get("status", Protocol::Tcp), None);

    // and on disk nothing has happened at all
    assert_eq!(cfg.content("nfs"), crate::common::NFS_SYSCONFIG);
}

#[test]
fn disable_and_reenable_cycle() {
    let catalog = catalog();
    let policy = policy();
    let cfg = ConfigDir::seeded();
    let fw = RecordingFirewall::new();

    let current = AllocationSet::load(&catalog, &cfg.store).unwrap();
    let mut desired = current.clone();
    desired.propose("rquotad", Protocol::Tcp, 20400, &policy).unwrap();
    apply(&plan(&current, &desired), &cfg.store, &fw).unwrap();
    assert_entry(&cfg.content("nfs"), "RQUOTAD_PORT", "20400");

    let current = AllocationSet::load(&catalog, &cfg.store).unwrap();
    let mut desired = current.clone();
    desired.disable("rquotad", &policy).unwrap();
    let plan = plan(&current, &desired);
    assert_eq!(plan.writes.len(), 1);
    assert!(plan.firewall_ports.is_empty());
    apply(&plan, &cfg.store, &fw).unwrap();
    assert_entry(&cfg.content("nfs"), "RQUOTAD_PORT", "");
}

#[test]
fn nis_flag_values_round_trip_through_disk() {
    let catalog = catalog();
    let policy = policy();
    let cfg = ConfigDir::seeded();
    let fw = RecordingFirewall::new();

    let current = AllocationSet::load(&catalog, &cfg.store).unwrap();
    let mut desired = current.clone();
    desired.propose("ypserv", Protocol::Tcp, 20500, &policy).unwrap();
    desired.propose("yppasswdd", Protocol::Tcp, 20600, &policy).unwrap();

    apply(&plan(&current, &desired), &cfg.store, &fw).unwrap();
    let content = cfg.content("ypserv");
    assert_entry(&content, "YPSERV_ARGS", "-p 20500");
    assert_entry(&content, "YPPASSWDD_ARGS", "--port 20600");

    let reloaded = AllocationSet::load(&catalog, &cfg.store).unwrap();
    assert_eq!(reloaded.get("ypserv", Protocol::Udp), Some(20500));
    assert_eq!(reloaded.get("yppasswdd", Protocol::Tcp), Some(20600));
}
