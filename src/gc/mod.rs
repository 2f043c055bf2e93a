//! Lifetime plumbing for script values held by native state.
//!
//! This module provides the pieces that let native code keep script values
//! alive, find its own state from a script object, and cope with a collector
//! that finalizes on its own schedule.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StrongRef (RAII)                                           │
//! │  ├── dup_value() on creation                                │
//! │  ├── free_value() exactly once on drop                      │
//! │  └── Weak host: no release after engine teardown            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  OpaqueTable                                                │
//! │  ├── Native state stored bridge-side, not behind a pointer  │
//! │  ├── Script object's opaque slot holds an OpaqueKey         │
//! │  └── Generation bump on remove: stale keys resolve to None  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  DeferredFinalizationQueue                                  │
//! │  ├── Unreachable objects queued in deferred reclaim mode    │
//! │  └── Drained by the host's run_gc()                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crate::gc::{OpaqueTable, StrongRef};
//!
//! struct State<H: ScriptHost> {
//!     callback: Option<StrongRef<H>>,
//! }
//!
//! let mut table = OpaqueTable::new();
//! let key = table.insert(State { callback: None });
//! host.set_opaque(&obj, class_id, Some(key));
//! ```

mod deferred_finalization;
mod opaque_table;
mod strong_ref;

pub use deferred_finalization::DeferredFinalizationQueue;
pub use opaque_table::{OpaqueKey, OpaqueTable};
pub use strong_ref::StrongRef;

#[cfg(test)]
mod tests;
