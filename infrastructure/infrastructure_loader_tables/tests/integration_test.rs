//! Integration tests for infrastructure_loader_tables crate
//!
//! These tests combine the tables the way a loader node uses them: the lock
//! policy comes from the parallel-capable registry, and certificate
//! reservations are taken while the name's loading lock is held.

use std::sync::{Arc, Barrier};
use std::thread;

use entities_module_loading::{Certificate, CertificateSet, LoaderKind, BASE_LOADER_KIND};
use infrastructure_loader_tables::*;

static PARALLEL_KIND: LoaderKind = LoaderKind::extending("TablesItParallel", &BASE_LOADER_KIND);
static COARSE_KIND: LoaderKind = LoaderKind::extending("TablesItCoarse", &BASE_LOADER_KIND);

#[test]
fn test_registry_drives_lock_policy() {
    let registry = ParallelCapableRegistry::new();
    assert!(registry.register(&PARALLEL_KIND));

    let parallel = LockTable::new(registry.note_instance(&PARALLEL_KIND));
    let coarse = LockTable::new(registry.note_instance(&COARSE_KIND));
    assert!(parallel.is_parallel());
    assert!(!coarse.is_parallel());
    assert!(!Arc::ptr_eq(&parallel.lock_for("A"), &parallel.lock_for("B")));
    assert!(Arc::ptr_eq(&coarse.lock_for("A"), &coarse.lock_for("B")));
}

#[test]
fn test_concurrent_reservations_under_name_locks() {
    let locks = Arc::new(LockTable::new(true));
    let registry = Arc::new(CertificateRegistry::new());
    let signer: CertificateSet = vec![Certificate::new("vendor")].into_iter().collect();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let locks = locks.clone();
            let registry = registry.clone();
            let signer = signer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let name = format!("shared.Module{}", i);
                barrier.wait();
                let lock = locks.lock_for(&name);
                let _guard = lock.lock();
                registry.reserve(&name, &signer).map(|r| r.commit()).is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.certificates_for("shared"), Some(signer));
    assert_eq!(locks.name_lock_count(), 8);
}

#[test]
fn test_assertion_table_round() {
    let mut table = AssertionStatusTable::new(false);
    table.set_package("com.example", true);
    table.set_module("com.example.internal.Noisy", false);
    assert!(table.desired_status("com.example.Main"));
    assert!(!table.desired_status("com.example.internal.Noisy"));
    assert!(!table.desired_status("org.other.Main"));
}
