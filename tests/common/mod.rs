#![allow(dead_code)]

use signal_bridge::{BridgeConfig, JsValue, ReclaimMode, Runtime, SignalBridge};
use std::rc::Rc;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Runtime with the Signal class installed.
pub fn setup(config: BridgeConfig) -> (Rc<Runtime>, Rc<SignalBridge<Runtime>>) {
    setup_with_mode(config, ReclaimMode::Immediate)
}

pub fn setup_with_mode(
    config: BridgeConfig,
    mode: ReclaimMode,
) -> (Rc<Runtime>, Rc<SignalBridge<Runtime>>) {
    init_tracing();

    let runtime = Runtime::with_mode(mode);
    let bridge = SignalBridge::install(&runtime, config).expect("install Signal class");
    (runtime, bridge)
}

pub fn is_empty(runtime: &Runtime, signal: &JsValue) -> bool {
    runtime
        .call_method(signal, "isEmpty", &[])
        .expect("isEmpty")
        .as_bool()
        .expect("isEmpty returns a boolean")
}
