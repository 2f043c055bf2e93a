//! Reference script host.
//!
//! `Runtime` is a small single-threaded object heap with explicit reference
//! counting, native classes with an opaque slot per instance, and two
//! reclamation strategies. It implements [`ScriptHost`] so the bridge can be
//! driven end to end without an external engine, and it exposes enough
//! instrumentation (reference counts, live objects, finalization counters) to
//! check that every reference the bridge takes is given back.
//!
//! Finalizers always run with no heap borrow held, so they are free to call
//! back into the runtime, including releasing the last reference to another
//! instance of their own class.

mod heap;
mod value;

pub use value::{Exception, JsValue, ObjectId};

use crate::error::{BridgeError, ErrorClass, Result};
use crate::gc::{DeferredFinalizationQueue, OpaqueKey};
use crate::host::{ClassDef, ClassId, Finalizer, MethodDef, ScriptHost};
use heap::{Heap, ObjectKind};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// When an object whose reference count reached zero is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReclaimMode {
    /// Deterministic reference counting: finalize on the last release.
    #[default]
    Immediate,
    /// Collector-scheduled: queue the object and finalize on [`Runtime::run_gc`].
    Deferred,
}

struct ClassRecord {
    name: &'static str,
    constructor: MethodDef<Runtime>,
    methods: HashMap<&'static str, MethodDef<Runtime>>,
    finalizer: Finalizer<Runtime>,
    /// Owned by the class.
    proto: ObjectId,
}

pub struct Runtime {
    self_ref: Weak<Runtime>,
    heap: RefCell<Heap>,
    classes: RefCell<Vec<Option<ClassRecord>>>,
    class_names: RefCell<HashMap<&'static str, ClassId>>,
    mode: ReclaimMode,
    pending: DeferredFinalizationQueue<ObjectId>,
    finalized: Cell<u64>,
}

impl Runtime {
    pub fn new() -> Rc<Self> {
        Self::with_mode(ReclaimMode::default())
    }

    pub fn with_mode(mode: ReclaimMode) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            heap: RefCell::new(Heap::default()),
            classes: RefCell::new(Vec::new()),
            class_names: RefCell::new(HashMap::new()),
            mode,
            pending: DeferredFinalizationQueue::new(),
            finalized: Cell::new(0),
        })
    }

    /// New plain object, owned by the caller.
    pub fn new_object(&self) -> JsValue {
        let id = self.heap.borrow_mut().alloc(ObjectKind::Plain, None);
        JsValue::Object(id)
    }

    /// New function object, owned by the caller.
    pub fn new_function(&self, name: &str) -> JsValue {
        let kind = ObjectKind::Function {
            name: name.to_string(),
        };
        let id = self.heap.borrow_mut().alloc(kind, None);
        JsValue::Object(id)
    }

    /// `obj[key] = value`, taking ownership of `value`.
    pub fn set_property(
        &self,
        obj: &JsValue,
        key: &str,
        value: JsValue,
    ) -> std::result::Result<(), Exception> {
        let Some(id) = obj.as_object() else {
            self.free_value(value);
            return Err(Exception::new(
                ErrorClass::Type,
                "cannot set property of non-object",
            ));
        };

        let outcome = {
            let mut heap = self.heap.borrow_mut();
            match heap.get_mut(id) {
                Some(entry) => Ok(entry.properties.insert(key.to_string(), value)),
                None => Err(value),
            }
        };

        match outcome {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.free_value(previous);
                }
                Ok(())
            }
            Err(value) => {
                self.free_value(value);
                Err(Exception::new(ErrorClass::Type, "object has been freed"))
            }
        }
    }

    /// Non-owning handle to the prototype of `value`.
    pub fn prototype_of(&self, value: &JsValue) -> Option<JsValue> {
        let id = value.as_object()?;
        let heap = self.heap.borrow();
        heap.get(id)?.proto.map(JsValue::Object)
    }

    /// Name of a function object.
    pub fn function_name(&self, value: &JsValue) -> Option<String> {
        let id = value.as_object()?;
        let heap = self.heap.borrow();
        match &heap.get(id)?.kind {
            ObjectKind::Function { name } => Some(name.clone()),
            _ => None,
        }
    }

    /// Class of a native instance.
    pub fn class_of(&self, value: &JsValue) -> Option<ClassId> {
        let id = value.as_object()?;
        let heap = self.heap.borrow();
        match heap.get(id)?.kind {
            ObjectKind::Instance { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.borrow().get(name).copied()
    }

    /// `new Name(...args)`
    pub fn construct(
        &self,
        class_name: &str,
        args: &[JsValue],
    ) -> std::result::Result<JsValue, Exception> {
        self.construct_with_target(class_name, &JsValue::Undefined, args)
    }

    /// Construct with an explicit `new.target`, as a subclass constructor would.
    pub fn construct_with_target(
        &self,
        class_name: &str,
        new_target: &JsValue,
        args: &[JsValue],
    ) -> std::result::Result<JsValue, Exception> {
        let call = {
            let id = self.class_id(class_name).ok_or_else(|| {
                Exception::new(ErrorClass::Type, format!("{class_name} is not defined"))
            })?;
            let classes = self.classes.borrow();
            let record = classes
                .get(id.0 as usize)
                .and_then(Option::as_ref)
                .ok_or_else(|| Exception::new(ErrorClass::Internal, "class not installed"))?;
            Rc::clone(&record.constructor.call)
        };

        let host = self.strong()?;
        call(&host, new_target, args)
    }

    /// `this.name(...args)`, resolved through the class of `this`.
    pub fn call_method(
        &self,
        this: &JsValue,
        name: &str,
        args: &[JsValue],
    ) -> std::result::Result<JsValue, Exception> {
        let class = self.class_of(this).ok_or_else(|| {
            Exception::new(ErrorClass::Type, format!("{name} is not a function"))
        })?;

        let call = self.lookup_method(class, name)?;
        let host = self.strong()?;
        call(&host, this, args)
    }

    /// `ClassName.prototype.name.call(this, ...args)`: `this` may be any value.
    pub fn call_class_method(
        &self,
        class_name: &str,
        name: &str,
        this: &JsValue,
        args: &[JsValue],
    ) -> std::result::Result<JsValue, Exception> {
        let class = self.class_id(class_name).ok_or_else(|| {
            Exception::new(ErrorClass::Type, format!("{class_name} is not defined"))
        })?;

        let call = self.lookup_method(class, name)?;
        let host = self.strong()?;
        call(&host, this, args)
    }

    /// Run pending finalizations. Returns how many objects were reclaimed.
    pub fn run_gc(&self) -> u64 {
        let before = self.finalized.get();
        self.pending.process_all(|id| self.reclaim(id));
        let reclaimed = self.finalized.get() - before;
        if reclaimed > 0 {
            tracing::debug!(reclaimed, live = self.live_objects(), "gc cycle");
        }
        reclaimed
    }

    /// Invoke the class finalizer of a live instance without reclaiming it,
    /// as a collector delivering a duplicate finalization signal would.
    pub fn finalize_now(&self, value: &JsValue) {
        if let Some(id) = value.as_object() {
            self.run_finalizer(id);
        }
    }

    /// Current reference count of an object, `None` for primitives and freed objects.
    pub fn ref_count(&self, value: &JsValue) -> Option<u32> {
        let id = value.as_object()?;
        self.heap.borrow().get(id).map(|entry| entry.ref_count)
    }

    /// Whether an object is still allocated (possibly awaiting finalization).
    pub fn is_alive(&self, value: &JsValue) -> bool {
        match value.as_object() {
            Some(id) => self.heap.borrow().get(id).is_some(),
            None => false,
        }
    }

    /// Number of allocated objects, class prototypes included.
    pub fn live_objects(&self) -> usize {
        self.heap.borrow().len()
    }

    /// Number of objects reclaimed so far.
    pub fn finalized_count(&self) -> u64 {
        self.finalized.get()
    }

    pub fn pending_finalizations(&self) -> u64 {
        self.pending.len()
    }

    fn strong(&self) -> std::result::Result<Rc<Runtime>, Exception> {
        self.self_ref
            .upgrade()
            .ok_or_else(|| Exception::new(ErrorClass::Internal, "runtime is shutting down"))
    }

    fn lookup_method(
        &self,
        class: ClassId,
        name: &str,
    ) -> std::result::Result<crate::host::NativeFn<Runtime>, Exception> {
        let classes = self.classes.borrow();
        classes
            .get(class.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|record| record.methods.get(name))
            .map(|method| Rc::clone(&method.call))
            .ok_or_else(|| Exception::new(ErrorClass::Type, format!("{name} is not a function")))
    }

    fn release_object(&self, id: ObjectId) {
        let reached_zero = {
            let mut heap = self.heap.borrow_mut();
            match heap.get_mut(id) {
                Some(entry) if entry.ref_count > 0 => {
                    entry.ref_count -= 1;
                    entry.ref_count == 0
                }
                Some(_) => {
                    tracing::warn!(%id, "release of object with no references");
                    false
                }
                None => {
                    tracing::warn!(%id, "release of unknown object");
                    false
                }
            }
        };

        if !reached_zero {
            return;
        }

        match self.mode {
            ReclaimMode::Immediate => self.reclaim(id),
            ReclaimMode::Deferred => self.pending.defer(id),
        }
    }

    fn run_finalizer(&self, id: ObjectId) {
        let finalizer = {
            let heap = self.heap.borrow();
            match heap.get(id).map(|entry| &entry.kind) {
                Some(ObjectKind::Instance { class, .. }) => {
                    let classes = self.classes.borrow();
                    classes
                        .get(class.0 as usize)
                        .and_then(Option::as_ref)
                        .map(|record| Rc::clone(&record.finalizer))
                }
                _ => None,
            }
        };

        if let Some(finalizer) = finalizer
            && let Some(host) = self.self_ref.upgrade()
        {
            finalizer(&host, &JsValue::Object(id));
        }
    }

    fn reclaim(&self, id: ObjectId) {
        // Revived while queued: the next release to zero queues it again.
        match self.heap.borrow().get(id) {
            Some(entry) if entry.ref_count == 0 => {}
            Some(entry) => {
                tracing::trace!(%id, refs = entry.ref_count, "skipping reclaim of revived object");
                return;
            }
            None => return,
        }

        self.run_finalizer(id);

        let entry = self.heap.borrow_mut().remove(id);
        let Some(entry) = entry else {
            return;
        };

        self.finalized.set(self.finalized.get() + 1);
        log::trace!("Reclaimed object {}", id);

        for owned in entry.into_owned_values() {
            self.free_value(owned);
        }
    }
}

impl ScriptHost for Runtime {
    type Value = JsValue;
    type Exception = Exception;

    fn new_class_id(&self) -> ClassId {
        let mut classes = self.classes.borrow_mut();
        classes.push(None);
        ClassId((classes.len() - 1) as u32)
    }

    fn define_class(&self, id: ClassId, def: ClassDef<Self>) -> Result<()> {
        {
            let classes = self.classes.borrow();
            match classes.get(id.0 as usize) {
                None => return Err(BridgeError::Internal("unknown class id")),
                Some(Some(_)) => return Err(BridgeError::State("class already defined")),
                Some(None) => {}
            }
        }

        let proto = self.heap.borrow_mut().alloc(ObjectKind::Plain, None);
        let methods = def
            .methods
            .into_iter()
            .map(|method| (method.name, method))
            .collect();

        let record = ClassRecord {
            name: def.name,
            constructor: def.constructor,
            methods,
            finalizer: def.finalizer,
            proto,
        };

        tracing::debug!(class = record.name, %id, "class defined");
        self.class_names.borrow_mut().insert(record.name, id);
        self.classes.borrow_mut()[id.0 as usize] = Some(record);

        Ok(())
    }

    fn class_proto(&self, id: ClassId) -> Result<JsValue> {
        let proto = {
            let classes = self.classes.borrow();
            classes
                .get(id.0 as usize)
                .and_then(Option::as_ref)
                .map(|record| JsValue::Object(record.proto))
                .ok_or(BridgeError::Internal("unknown class id"))?
        };

        Ok(self.dup_value(&proto))
    }

    fn get_property(&self, obj: &JsValue, key: &str) -> Result<JsValue> {
        let Some(id) = obj.as_object() else {
            return Err(BridgeError::Host {
                class: ErrorClass::Type,
                message: format!("cannot read property '{key}' of non-object"),
            });
        };

        let found = self.heap.borrow().lookup(id, key).cloned();
        Ok(match found {
            Some(value) => self.dup_value(&value),
            None => JsValue::Undefined,
        })
    }

    fn new_object_class(&self, proto: &JsValue, id: ClassId) -> Result<JsValue> {
        if self
            .classes
            .borrow()
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .is_none()
        {
            return Err(BridgeError::Internal("unknown class id"));
        }

        // Non-object prototypes give a null prototype.
        let proto = match proto {
            JsValue::Object(_) if self.is_alive(proto) => {
                self.dup_value(proto);
                proto.as_object()
            }
            _ => None,
        };

        let kind = ObjectKind::Instance {
            class: id,
            opaque: None,
        };
        let obj = self.heap.borrow_mut().alloc(kind, proto);

        Ok(JsValue::Object(obj))
    }

    fn set_opaque(&self, obj: &JsValue, id: ClassId, key: Option<OpaqueKey>) {
        let Some(object_id) = obj.as_object() else {
            return;
        };

        let mut heap = self.heap.borrow_mut();
        if let Some(entry) = heap.get_mut(object_id)
            && let ObjectKind::Instance { class, opaque } = &mut entry.kind
            && *class == id
        {
            *opaque = key.map(OpaqueKey::to_bits);
        }
    }

    fn get_opaque(&self, obj: &JsValue, id: ClassId) -> Option<OpaqueKey> {
        let object_id = obj.as_object()?;
        let heap = self.heap.borrow();
        match heap.get(object_id)?.kind {
            ObjectKind::Instance { class, opaque } if class == id => opaque.map(OpaqueKey::from_bits),
            _ => None,
        }
    }

    fn dup_value(&self, value: &JsValue) -> JsValue {
        if let JsValue::Object(id) = value {
            let mut heap = self.heap.borrow_mut();
            match heap.get_mut(*id) {
                Some(entry) => entry.ref_count += 1,
                None => tracing::warn!(%id, "dup of unknown object"),
            }
        }
        value.clone()
    }

    fn free_value(&self, value: JsValue) {
        if let JsValue::Object(id) = value {
            self.release_object(id);
        }
    }

    fn is_undefined(&self, value: &JsValue) -> bool {
        value.is_undefined()
    }

    fn is_object(&self, value: &JsValue) -> bool {
        matches!(value, JsValue::Object(_))
    }

    fn is_function(&self, value: &JsValue) -> bool {
        let Some(id) = value.as_object() else {
            return false;
        };
        matches!(
            self.heap.borrow().get(id).map(|entry| &entry.kind),
            Some(ObjectKind::Function { .. })
        )
    }

    fn is_number(&self, value: &JsValue) -> bool {
        matches!(value, JsValue::Int(_) | JsValue::Float(_))
    }

    fn to_int32(&self, value: &JsValue) -> Result<i32> {
        match value {
            JsValue::Int(number) => Ok(*number),
            JsValue::Float(number) => Ok(value::f64_to_int32(*number)),
            _ => Err(BridgeError::Host {
                class: ErrorClass::Type,
                message: "cannot convert value to int32".to_string(),
            }),
        }
    }

    fn new_int32(&self, value: i32) -> JsValue {
        JsValue::Int(value)
    }

    fn new_bool(&self, value: bool) -> JsValue {
        JsValue::Bool(value)
    }

    fn new_string(&self, value: &str) -> JsValue {
        JsValue::from(value)
    }

    fn raise(&self, error: BridgeError) -> Exception {
        Exception::from(error)
    }
}
