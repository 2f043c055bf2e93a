pub mod config;
pub mod error;
pub mod gc;
pub mod host;
pub mod runtime;
pub mod signal;

// Core API
pub use config::{BridgeConfig, DisconnectMode, LinkPolicy};
pub use error::{BridgeError, ErrorClass};
pub use host::{ClassDef, ClassId, MethodDef, ScriptHost};
pub use runtime::{Exception, JsValue, ReclaimMode, Runtime};
pub use signal::{CONNECTION_TOKEN, NativeState, SIGNAL_CLASS_NAME, SignalBridge};
