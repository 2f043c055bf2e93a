mod common;

use common::{is_empty, setup, setup_with_mode};
use signal_bridge::{BridgeConfig, ErrorClass, JsValue, ReclaimMode, ScriptHost, SignalBridge};

#[test]
fn test_finalize_releases_callback_once() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let baseline = runtime.live_objects();

    let link = runtime.new_object();
    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[link.clone()]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();

    assert_eq!(runtime.ref_count(&callback), Some(2));
    assert_eq!(runtime.ref_count(&link), Some(2));

    runtime.free_value(signal.clone());

    assert!(!runtime.is_alive(&signal));
    assert_eq!(runtime.ref_count(&callback), Some(1));
    assert_eq!(runtime.ref_count(&link), Some(1));
    assert_eq!(bridge.live_states(), 0);

    runtime.free_value(callback);
    runtime.free_value(link);
    assert_eq!(runtime.live_objects(), baseline);
}

#[test]
fn test_callback_dies_with_signal() {
    let (runtime, _bridge) = setup(BridgeConfig::default());
    let signal = runtime.construct("Signal", &[]).unwrap();
    let callback = runtime.new_function("cb");

    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();
    // The script forgets the callback; only the Signal holds it now
    runtime.free_value(callback.clone());
    assert!(runtime.is_alive(&callback));

    runtime.free_value(signal);
    assert!(!runtime.is_alive(&callback));
}

#[test]
fn test_duplicate_finalize_is_noop() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();

    runtime.finalize_now(&signal);
    assert_eq!(runtime.ref_count(&callback), Some(1));
    assert_eq!(bridge.live_states(), 0);

    runtime.finalize_now(&signal);
    bridge.finalize(&runtime, &signal);
    assert_eq!(runtime.ref_count(&callback), Some(1));

    // Operations after finalization fail safely
    let err = runtime.call_method(&signal, "isEmpty", &[]).unwrap_err();
    assert_eq!(err.class, ErrorClass::Internal);

    // The collector's own finalization later is also a no-op
    runtime.free_value(signal.clone());
    assert!(!runtime.is_alive(&signal));
    assert_eq!(runtime.ref_count(&callback), Some(1));
}

#[test]
fn test_finalize_unbound_handle() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let plain = runtime.new_object();

    bridge.finalize(&runtime, &plain);
    bridge.finalize(&runtime, &JsValue::Int(3));

    assert!(runtime.is_alive(&plain));
    assert_eq!(bridge.live_states(), 0);
}

#[test]
fn test_failed_connect_keeps_counts() {
    let (runtime, _bridge) = setup(BridgeConfig::default());
    let signal = runtime.construct("Signal", &[]).unwrap();
    let first = runtime.new_function("first");
    let second = runtime.new_function("second");
    let plain = runtime.new_object();

    runtime
        .call_method(&signal, "connect", &[first.clone()])
        .unwrap();

    let before = (
        runtime.ref_count(&first),
        runtime.ref_count(&second),
        runtime.ref_count(&plain),
    );

    assert!(runtime.call_method(&signal, "connect", &[second.clone()]).is_err());
    assert!(runtime.call_method(&signal, "connect", &[plain.clone()]).is_err());
    assert!(
        runtime
            .call_method(&signal, "connect", &[second.clone(), plain.clone()])
            .is_err()
    );

    let after = (
        runtime.ref_count(&first),
        runtime.ref_count(&second),
        runtime.ref_count(&plain),
    );
    assert_eq!(before, after);
}

#[test]
fn test_deferred_reclaim_waits_for_gc() {
    let (runtime, bridge) = setup_with_mode(BridgeConfig::default(), ReclaimMode::Deferred);
    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();

    runtime.free_value(signal.clone());

    // Unreachable but not yet finalized
    assert!(runtime.is_alive(&signal));
    assert_eq!(runtime.pending_finalizations(), 1);
    assert_eq!(runtime.ref_count(&callback), Some(2));
    assert_eq!(bridge.live_states(), 1);

    runtime.run_gc();

    assert!(!runtime.is_alive(&signal));
    assert_eq!(runtime.ref_count(&callback), Some(1));
    assert_eq!(bridge.live_states(), 0);
    assert_eq!(runtime.pending_finalizations(), 0);
}

#[test]
fn test_deferred_gc_keeps_signal_revived_while_queued() {
    let (runtime, bridge) = setup_with_mode(BridgeConfig::default(), ReclaimMode::Deferred);
    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();

    runtime.free_value(signal.clone());
    let revived = runtime.dup_value(&signal);

    assert_eq!(runtime.run_gc(), 0);
    assert_eq!(bridge.live_states(), 1);
    assert!(!is_empty(&runtime, &revived));
    assert_eq!(runtime.ref_count(&callback), Some(2));

    runtime.free_value(revived);
    assert_eq!(runtime.run_gc(), 1);
    assert_eq!(bridge.live_states(), 0);
    assert_eq!(runtime.ref_count(&callback), Some(1));
}

#[test]
fn test_deferred_gc_collects_cascade() {
    let (runtime, _bridge) = setup_with_mode(BridgeConfig::default(), ReclaimMode::Deferred);
    let baseline = runtime.live_objects();

    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback.clone()])
        .unwrap();
    runtime.free_value(callback.clone());
    runtime.free_value(signal);

    // Signal first, then the callback it released
    assert_eq!(runtime.run_gc(), 2);
    assert!(!runtime.is_alive(&callback));
    assert_eq!(runtime.live_objects(), baseline);
}

#[test]
fn test_signal_as_link_of_signal() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let baseline = runtime.live_objects();

    let inner = runtime.construct("Signal", &[]).unwrap();
    let inner_callback = runtime.new_function("inner");
    runtime
        .call_method(&inner, "connect", &[inner_callback.clone()])
        .unwrap();

    let outer = runtime.construct("Signal", &[inner.clone()]).unwrap();
    runtime.free_value(inner.clone());
    assert!(runtime.is_alive(&inner));
    assert_eq!(bridge.live_states(), 2);

    // Finalizing outer releases inner's last reference, finalizing it too
    runtime.free_value(outer);
    assert!(!runtime.is_alive(&inner));
    assert_eq!(bridge.live_states(), 0);
    assert_eq!(runtime.ref_count(&inner_callback), Some(1));

    runtime.free_value(inner_callback);
    assert_eq!(runtime.live_objects(), baseline);
}

#[test]
fn test_many_signals_reuse_slots() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let callback = runtime.new_function("shared");

    for _ in 0..16 {
        let signal = runtime.construct("Signal", &[]).unwrap();
        runtime
            .call_method(&signal, "connect", &[callback.clone()])
            .unwrap();
        assert!(!is_empty(&runtime, &signal));
        runtime.free_value(signal);
    }

    assert_eq!(bridge.live_states(), 0);
    assert_eq!(runtime.ref_count(&callback), Some(1));
}

#[test]
fn test_runtime_teardown_with_live_signals() {
    let (runtime, bridge) = setup(BridgeConfig::default());
    let callback = runtime.new_function("cb");
    let signal = runtime.construct("Signal", &[]).unwrap();
    runtime
        .call_method(&signal, "connect", &[callback])
        .unwrap();

    drop(bridge);
    drop(runtime);
}

#[test]
fn test_install_twice_gives_distinct_classes() {
    let (runtime, first) = setup(BridgeConfig::default());
    let second = SignalBridge::install(&runtime, BridgeConfig::legacy()).unwrap();
    assert_ne!(first.class_id(), second.class_id());

    // A handle of the second class is not a Signal of the first
    let signal = first
        .construct(&runtime, &JsValue::Undefined, &[])
        .unwrap();
    let err = second
        .is_empty(&runtime, &signal, &[])
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Internal);

    assert_eq!(
        first.is_empty(&runtime, &signal, &[]).unwrap(),
        JsValue::Bool(true)
    );
}
