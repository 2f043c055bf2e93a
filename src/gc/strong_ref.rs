//! Owned references to script values held by native code.

use crate::host::ScriptHost;
use std::fmt;
use std::rc::{Rc, Weak};

/// An owned, counted reference to a script value.
///
/// Creating a `StrongRef` duplicates the value through the host; dropping it
/// frees that duplicate. Each acquire therefore has exactly one matching
/// release on every path, including early returns and unwinding.
///
/// The host is held weakly. If the engine has already been torn down when the
/// reference drops, there is nothing left to release and the drop is a no-op.
///
/// # Example
///
/// ```ignore
/// // `callback` is borrowed from the call's arguments
/// let held = StrongRef::new(&host, callback);
/// // ... later, release explicitly or just drop it
/// held.release();
/// ```
pub struct StrongRef<H: ScriptHost> {
    host: Weak<H>,
    value: Option<H::Value>,
}

impl<H: ScriptHost> StrongRef<H> {
    /// Duplicate `value` and hold the duplicate.
    pub fn new(host: &Rc<H>, value: &H::Value) -> Self {
        let value = host.dup_value(value);
        tracing::trace!(?value, "acquired strong reference");

        Self {
            host: Rc::downgrade(host),
            value: Some(value),
        }
    }

    /// Borrow the held value. The returned handle does not own a reference.
    pub fn get(&self) -> &H::Value {
        // Only `Drop` takes the value out.
        match &self.value {
            Some(value) => value,
            None => unreachable!("StrongRef accessed after release"),
        }
    }

    /// Release the held reference now.
    pub fn release(self) {
        drop(self);
    }
}

impl<H: ScriptHost> Drop for StrongRef<H> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };

        match self.host.upgrade() {
            Some(host) => {
                tracing::trace!(?value, "released strong reference");
                host.free_value(value);
            }
            None => {
                tracing::trace!(?value, "host gone, strong reference dropped without release");
            }
        }
    }
}

impl<H: ScriptHost> fmt::Debug for StrongRef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrongRef")
            .field("value", &self.value)
            .finish()
    }
}
