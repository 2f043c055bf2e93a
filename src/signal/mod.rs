//! The Signal class: a single-slot connection point exposed to script.
//!
//! ## Lifecycle
//!
//! ```text
//!   construct ──► Empty ──connect──► Connected
//!                   ▲                    │
//!                   └──── disconnect ────┘   (ClearSlot mode only)
//!
//!   Empty | Connected ──finalize──► Finalized (opaque slot cleared)
//! ```
//!
//! A Signal holds at most one callback. Connecting a connected Signal is a
//! state error, never an overwrite.

#[macro_use]
mod macros;

mod bridge;
mod state;

pub use bridge::SignalBridge;
pub use state::NativeState;

/// Class name, and what `toString()` returns.
pub const SIGNAL_CLASS_NAME: &str = "Signal";

/// Token returned by `connect`; names the one slot a Signal has.
pub const CONNECTION_TOKEN: i32 = 0;

pub const ERR_ARITY: &str = "Unsupported number of arguments";
pub const ERR_EXPECTED_FUNCTION: &str = "Expected one argument of function type";
pub const ERR_ARGUMENT_TYPE: &str = "Unsupported argument type";
pub const ERR_NO_CONTEXT: &str = "Could not find signal context";
pub const ERR_ALREADY_CONNECTED: &str = "Signal already contains a connected function";
pub const ERR_LINK_NOT_OBJECT: &str = "Signal link must be an object";
pub const ERR_NO_LINK: &str = "Signal has no link object";
