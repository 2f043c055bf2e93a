//! Bridge behavior knobs.

use std::fmt;

/// What `disconnect(token)` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectMode {
    /// Clear the single slot; any numeric token names it (default).
    #[default]
    ClearSlot,
    /// Legacy stub: never disconnects and never reads `this`, always returns false.
    AlwaysFalse,
}

/// Whether a Signal needs a link object before it may be connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Signals constructed without a link connect normally (default).
    #[default]
    Optional,
    /// `connect` on a Signal without a link fails with a state error.
    Required,
}

/// Bridge configuration
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Disconnect protocol (default: ClearSlot)
    pub disconnect: DisconnectMode,
    /// Link requirement at connect time (default: Optional)
    pub link: LinkPolicy,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disconnect(mut self, disconnect: DisconnectMode) -> Self {
        self.disconnect = disconnect;
        self
    }

    pub fn with_link(mut self, link: LinkPolicy) -> Self {
        self.link = link;
        self
    }

    /// Configuration matching the legacy bindings: disconnect never succeeds.
    pub fn legacy() -> Self {
        Self::default().with_disconnect(DisconnectMode::AlwaysFalse)
    }
}

impl fmt::Display for DisconnectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectMode::ClearSlot => write!(f, "clear-slot"),
            DisconnectMode::AlwaysFalse => write!(f, "always-false"),
        }
    }
}
