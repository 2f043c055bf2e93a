//! Errors raised by bridge entry points.

use std::fmt;

/// Host-visible exception class an error is thrown as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Wrong argument count or an operation invalid in the current state.
    Range,
    /// Argument of the wrong kind.
    Type,
    /// Native state missing behind a script handle.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Range => write!(f, "RangeError"),
            ErrorClass::Type => write!(f, "TypeError"),
            ErrorClass::Internal => write!(f, "InternalError"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Wrong number of arguments.
    #[error("{0}")]
    Arity(&'static str),

    /// Argument has the wrong kind (e.g. a non-callable passed to `connect`).
    #[error("{0}")]
    ArgumentType(&'static str),

    /// Operation not valid in the current state (e.g. connecting twice).
    #[error("{0}")]
    State(&'static str),

    /// The opaque slot is unbound: the handle was never constructed as a Signal
    /// or has already been finalized.
    #[error("{0}")]
    Internal(&'static str),

    /// Failure reported by the host itself, such as a conversion that threw.
    #[error("{class}: {message}")]
    Host { class: ErrorClass, message: String },
}

impl BridgeError {
    /// The class the host should throw this error as.
    pub fn class(&self) -> ErrorClass {
        match self {
            BridgeError::Arity(_) | BridgeError::State(_) => ErrorClass::Range,
            BridgeError::ArgumentType(_) => ErrorClass::Type,
            BridgeError::Internal(_) => ErrorClass::Internal,
            BridgeError::Host { class, .. } => *class,
        }
    }

    /// Message without the class prefix.
    pub fn message(&self) -> &str {
        match self {
            BridgeError::Arity(msg)
            | BridgeError::ArgumentType(msg)
            | BridgeError::State(msg)
            | BridgeError::Internal(msg) => msg,
            BridgeError::Host { message, .. } => message,
        }
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
