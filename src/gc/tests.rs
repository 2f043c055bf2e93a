//! Tests for reference and opaque-slot plumbing.

use super::*;
use crate::host::ScriptHost;
use crate::runtime::{JsValue, Runtime};

#[test]
fn test_opaque_table_insert_get() {
    let mut table = OpaqueTable::new();
    let a = table.insert("a");
    let b = table.insert("b");

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(a), Some(&"a"));
    assert_eq!(table.get(b), Some(&"b"));
}

#[test]
fn test_opaque_table_stale_key() {
    let mut table = OpaqueTable::new();
    let old = table.insert(1u32);

    assert_eq!(table.remove(old), Some(1));
    assert!(table.is_empty());

    // The slot is reused with a new generation
    let new = table.insert(2u32);
    assert_ne!(old, new);

    assert_eq!(table.get(old), None);
    assert_eq!(table.remove(old), None);
    assert_eq!(table.get(new), Some(&2));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_opaque_table_double_remove() {
    let mut table = OpaqueTable::new();
    let key = table.insert("state");

    assert!(table.remove(key).is_some());
    assert!(table.remove(key).is_none());
    assert!(!table.contains(key));
}

#[test]
fn test_opaque_key_bits() {
    let mut table = OpaqueTable::new();
    let first = table.insert(());
    table.remove(first);
    let key = table.insert(());

    assert_eq!(OpaqueKey::from_bits(key.to_bits()), key);
    assert_ne!(key.to_bits(), first.to_bits());
}

#[test]
fn test_opaque_table_drain() {
    let mut table = OpaqueTable::new();
    let a = table.insert(10);
    table.insert(20);

    assert_eq!(table.drain(), vec![10, 20]);
    assert!(table.is_empty());
    assert_eq!(table.get(a), None);
}

#[test]
fn test_strong_ref_balances() {
    let runtime = Runtime::new();
    let obj = runtime.new_object();

    let held = StrongRef::new(&runtime, &obj);
    assert_eq!(runtime.ref_count(&obj), Some(2));
    assert_eq!(held.get(), &obj);

    drop(held);
    assert_eq!(runtime.ref_count(&obj), Some(1));
}

#[test]
fn test_strong_ref_keeps_value_alive() {
    let runtime = Runtime::new();
    let obj = runtime.new_object();

    let held = StrongRef::new(&runtime, &obj);
    runtime.free_value(obj.clone());
    assert!(runtime.is_alive(&obj));

    held.release();
    assert!(!runtime.is_alive(&obj));
}

#[test]
fn test_strong_ref_primitive() {
    let runtime = Runtime::new();
    let held = StrongRef::new(&runtime, &JsValue::Int(7));

    assert_eq!(held.get(), &JsValue::Int(7));
    held.release();
    assert_eq!(runtime.live_objects(), 0);
}

#[test]
fn test_strong_ref_outlives_host() {
    let runtime = Runtime::new();
    let obj = runtime.new_object();
    let held = StrongRef::new(&runtime, &obj);

    drop(runtime);

    // Nothing to release into; must not panic
    drop(held);
}
