use super::ERR_ALREADY_CONNECTED;
use crate::error::{BridgeError, Result};
use crate::gc::StrongRef;
use crate::host::ScriptHost;
use std::fmt;
use std::rc::Rc;

/// Native half of one Signal.
///
/// Holds the connected callback (at most one) and the link object supplied at
/// construction. Both are owned references; dropping the state releases them,
/// callback first.
pub struct NativeState<H: ScriptHost> {
    callback: Option<StrongRef<H>>,
    link: Option<StrongRef<H>>,
}

impl<H: ScriptHost> NativeState<H> {
    /// Fresh, empty state. `link` is absent when the constructor got no argument.
    pub fn initialize(link: Option<StrongRef<H>>) -> Self {
        Self {
            callback: None,
            link,
        }
    }

    /// Connect `callback`, taking a reference of our own to it.
    ///
    /// Fails without touching any reference count when a callback is already
    /// connected.
    pub fn set_callback(&mut self, host: &Rc<H>, callback: &H::Value) -> Result<()> {
        if self.callback.is_some() {
            return Err(BridgeError::State(ERR_ALREADY_CONNECTED));
        }

        self.callback = Some(StrongRef::new(host, callback));
        Ok(())
    }

    /// Detach the callback. Its reference is released when the returned
    /// handle drops, which lets callers release outside of any borrow.
    pub fn clear_callback(&mut self) -> Option<StrongRef<H>> {
        self.callback.take()
    }

    pub fn is_empty(&self) -> bool {
        self.callback.is_none()
    }

    pub fn callback(&self) -> Option<&H::Value> {
        self.callback.as_ref().map(StrongRef::get)
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }

    /// Tear down: release the callback (if any), then the link.
    pub fn release(mut self) {
        if let Some(callback) = self.callback.take() {
            callback.release();
        }

        if let Some(link) = self.link.take() {
            link.release();
        }
    }
}

impl<H: ScriptHost> fmt::Debug for NativeState<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeState")
            .field("callback", &self.callback)
            .field("link", &self.link)
            .finish()
    }
}
