//! The capabilities the bridge consumes from its script engine.
//!
//! Everything engine-specific sits behind [`ScriptHost`]: object allocation,
//! the per-instance opaque slot, reference counting of script values, value
//! kind queries, and exception translation. The bridge never sees raw engine
//! pointers; the opaque slot carries an [`OpaqueKey`] into a bridge-owned
//! side table instead.
//!
//! ## Ownership convention
//!
//! Arguments handed to native functions are borrowed (`&H::Value`). A native
//! function that wants to keep one past the call must duplicate it (see
//! [`StrongRef`](crate::gc::StrongRef)). Values returned from host methods
//! that create or look up objects are owned and must be freed by the caller.

use crate::error::{BridgeError, Result};
use crate::gc::OpaqueKey;
use std::fmt;
use std::rc::Rc;

/// Engine-assigned identity of a native class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Native function callable from script: `(host, this, args) -> value`.
///
/// For constructors `this` is `new.target`, or undefined when the class is
/// constructed directly by the host.
pub type NativeFn<H> = Rc<
    dyn Fn(
        &Rc<H>,
        &<H as ScriptHost>::Value,
        &[<H as ScriptHost>::Value],
    ) -> std::result::Result<<H as ScriptHost>::Value, <H as ScriptHost>::Exception>,
>;

/// Called by the host's reclamation process with the dying object.
pub type Finalizer<H> = Rc<dyn Fn(&Rc<H>, &<H as ScriptHost>::Value)>;

/// A named native function with its declared `length`.
pub struct MethodDef<H: ScriptHost> {
    pub name: &'static str,
    pub length: u32,
    pub call: NativeFn<H>,
}

impl<H: ScriptHost> Clone for MethodDef<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            length: self.length,
            call: Rc::clone(&self.call),
        }
    }
}

/// Everything needed to install a native class into an engine.
pub struct ClassDef<H: ScriptHost> {
    pub name: &'static str,
    pub constructor: MethodDef<H>,
    /// Installed on the class prototype.
    pub methods: Vec<MethodDef<H>>,
    pub finalizer: Finalizer<H>,
}

/// Script engine capabilities.
///
/// Implementations are single-threaded: a host and every value it hands out
/// stay on the thread that created them.
pub trait ScriptHost: Sized + 'static {
    /// A script value. Cloning copies the handle without touching its
    /// reference count; use [`dup_value`](Self::dup_value) to take a reference.
    type Value: Clone + fmt::Debug;

    /// What native functions return to the engine on failure.
    type Exception: fmt::Debug;

    /// Allocate a fresh class identity.
    fn new_class_id(&self) -> ClassId;

    /// Install a class: prototype with its methods, constructor and finalizer.
    fn define_class(&self, id: ClassId, def: ClassDef<Self>) -> Result<()>;

    /// Owned reference to the prototype registered for `id`.
    fn class_proto(&self, id: ClassId) -> Result<Self::Value>;

    /// Owned result of reading `obj[key]`.
    fn get_property(&self, obj: &Self::Value, key: &str) -> Result<Self::Value>;

    /// Allocate an instance of `id` with the given prototype. Its opaque slot
    /// starts unbound.
    fn new_object_class(&self, proto: &Self::Value, id: ClassId) -> Result<Self::Value>;

    /// Bind or clear the opaque slot. Ignored when `obj` is not an instance of `id`.
    fn set_opaque(&self, obj: &Self::Value, id: ClassId, key: Option<OpaqueKey>);

    /// Read the opaque slot. `None` when unbound or when `obj` is not an instance of `id`.
    fn get_opaque(&self, obj: &Self::Value, id: ClassId) -> Option<OpaqueKey>;

    /// Strengthen: returns an owned reference to the same value.
    fn dup_value(&self, value: &Self::Value) -> Self::Value;

    /// Release an owned reference.
    fn free_value(&self, value: Self::Value);

    fn is_undefined(&self, value: &Self::Value) -> bool;

    fn is_object(&self, value: &Self::Value) -> bool;

    fn is_function(&self, value: &Self::Value) -> bool;

    fn is_number(&self, value: &Self::Value) -> bool;

    /// Convert a number to a 32-bit integer with the engine's semantics.
    fn to_int32(&self, value: &Self::Value) -> Result<i32>;

    fn new_int32(&self, value: i32) -> Self::Value;

    fn new_bool(&self, value: bool) -> Self::Value;

    fn new_string(&self, value: &str) -> Self::Value;

    /// Turn a bridge error into an engine exception of the matching class.
    fn raise(&self, error: BridgeError) -> Self::Exception;
}
