//! Registry lookup and registration semantics.

use crate::common::passthru;
use deflater::{default_registry, Registry};

#[test]
fn default_registry_has_builtin_methods() {
    let registry = default_registry();
    assert!(registry.contains("deflate"));
    assert!(registry.contains("gzip"));
}

#[test]
fn method_names_are_case_sensitive() {
    let registry = default_registry();
    assert!(registry.find("DEFLATE").is_none());
    assert!(registry.find("Gzip").is_none());
}

#[test]
fn unknown_method_is_absent() {
    assert!(default_registry().find("zstd").is_none());
}

#[test]
fn find_returns_the_descriptor() {
    let method = default_registry().find("deflate").unwrap();
    assert_eq!(method.name, "deflate");
    assert!(method.capabilities.can_encode());
    assert!(method.capabilities.can_decode());
}

#[test]
fn explicit_registry_starts_empty() {
    let registry = Registry::new();
    assert!(!registry.contains("deflate"));
}

#[test]
fn registration_is_idempotent() {
    let registry = Registry::new();
    registry.register(&passthru::METHOD).unwrap();
    registry.register(&passthru::METHOD).unwrap();
    assert!(registry.contains("passthru"));
}

#[test]
fn concurrent_lookups() {
    let registry = default_registry();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    assert!(registry.find("deflate").is_some());
                    assert!(registry.find("gzip").is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
