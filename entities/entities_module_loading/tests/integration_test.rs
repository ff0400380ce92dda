//! Integration tests for entities_module_loading crate
//!
//! These tests exercise the data model types together: modules carrying
//! protection domains whose code sources carry certificate sets.

use std::sync::Arc;

use entities_module_loading::*;

#[test]
fn test_module_carries_domain_certificates() {
    let certs: CertificateSet = vec![Certificate::new("alice"), Certificate::new("bob")]
        .into_iter()
        .collect();
    let source = CodeSource::new(Some("/srv/app.jar".to_string()), certs.clone());
    let domain = Arc::new(ProtectionDomain::new(Some(source)));
    let loader = LoaderId::next();

    let module = Module::new("com.example.Main", loader, domain.clone(), 128);
    assert_eq!(module.defining_loader(), loader);
    assert_eq!(module.package(), "com.example");
    assert!(module.protection_domain().certificates().matches(&certs));
    assert!(Arc::ptr_eq(module.protection_domain(), &domain));
}

#[test]
fn test_package_rules_and_certificate_matching_together() {
    let rules = NameRules::default();
    let first = "com.example.A";
    let second = "com.example.B";
    rules.validate_for_definition(first).unwrap();
    rules.validate_for_definition(second).unwrap();
    assert_eq!(package_name(first), package_name(second));

    let c1: CertificateSet = vec![Certificate::new("c1")].into_iter().collect();
    let c2: CertificateSet = vec![Certificate::new("c2")].into_iter().collect();
    assert!(!c1.matches(&c2));
    assert!(c1.matches(&c1.clone()));
}

#[test]
fn test_scope_display_uses_loader_id() {
    let id = LoaderId::next();
    assert_eq!(LibraryScope::Loader(id).to_string(), id.to_string());
}
