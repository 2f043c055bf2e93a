use crate::error::{BridgeError, ErrorClass};
use std::fmt;
use std::rc::Rc;

/// Identity of a heap object. Ids are never reused, so a freed id stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A script value.
///
/// Cloning a `JsValue` copies the handle only. Ownership of an object
/// reference moves through [`Runtime::dup_value`](super::Runtime) and
/// [`Runtime::free_value`](super::Runtime).
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    String(Rc<str>),
    Object(ObjectId),
}

impl JsValue {
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            JsValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            JsValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }
}

impl From<i32> for JsValue {
    fn from(value: i32) -> Self {
        JsValue::Int(value)
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        JsValue::Float(value)
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        JsValue::Bool(value)
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(Rc::from(value))
    }
}

/// ECMAScript ToInt32 for a finite or non-finite double.
pub(crate) fn f64_to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }

    let truncated = value.trunc();
    let modulo = truncated.rem_euclid(4_294_967_296.0);
    (modulo as u32) as i32
}

/// Exception thrown back to script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub class: ErrorClass,
    pub message: String,
}

impl Exception {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

impl std::error::Error for Exception {}

impl From<BridgeError> for Exception {
    fn from(error: BridgeError) -> Self {
        Self {
            class: error.class(),
            message: error.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int32() {
        assert_eq!(f64_to_int32(0.0), 0);
        assert_eq!(f64_to_int32(-1.5), -1);
        assert_eq!(f64_to_int32(3.9), 3);
        assert_eq!(f64_to_int32(f64::NAN), 0);
        assert_eq!(f64_to_int32(f64::INFINITY), 0);
        assert_eq!(f64_to_int32(4_294_967_296.0), 0);
        assert_eq!(f64_to_int32(2_147_483_648.0), i32::MIN);
    }

    #[test]
    fn test_exception_from_bridge_error() {
        let exception = Exception::from(BridgeError::Arity("Unsupported number of arguments"));
        assert_eq!(exception.class, ErrorClass::Range);
        assert_eq!(
            exception.to_string(),
            "RangeError: Unsupported number of arguments"
        );
    }
}
