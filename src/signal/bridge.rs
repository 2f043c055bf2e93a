use super::state::NativeState;
use super::{
    CONNECTION_TOKEN, ERR_ARGUMENT_TYPE, ERR_ARITY, ERR_EXPECTED_FUNCTION, ERR_LINK_NOT_OBJECT,
    ERR_NO_CONTEXT, ERR_NO_LINK, SIGNAL_CLASS_NAME,
};
use crate::config::{BridgeConfig, DisconnectMode, LinkPolicy};
use crate::error::{BridgeError, Result};
use crate::gc::{OpaqueKey, OpaqueTable, StrongRef};
use crate::host::{ClassDef, ClassId, Finalizer, MethodDef, ScriptHost};
use std::cell::RefCell;
use std::rc::Rc;

/// Arguments accepted by `disconnect`, after kind dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisconnectArgs {
    /// `disconnect(slot: number)`
    Slot(i32),
}

impl DisconnectArgs {
    fn parse<H: ScriptHost>(host: &H, args: &[H::Value]) -> Result<Self> {
        expect_args!(args, 1, ERR_ARITY);

        let arg = &args[0];
        if host.is_number(arg) {
            return Ok(DisconnectArgs::Slot(host.to_int32(arg)?));
        }

        Err(BridgeError::ArgumentType(ERR_ARGUMENT_TYPE))
    }
}

/// Script-facing side of the Signal class.
///
/// Each script handle's opaque slot holds an [`OpaqueKey`] into `states`; the
/// bridge owns every [`NativeState`] and is the only code that reaches one.
/// All entry points validate before mutating, so a failed call leaves both the
/// state and every reference count as they were.
///
/// No `RefCell` borrow of `states` is held while a script reference is
/// released: releasing can finalize other objects, including other Signals.
pub struct SignalBridge<H: ScriptHost> {
    class_id: ClassId,
    config: BridgeConfig,
    states: RefCell<OpaqueTable<NativeState<H>>>,
}

impl<H: ScriptHost> SignalBridge<H> {
    pub fn new(class_id: ClassId, config: BridgeConfig) -> Self {
        Self {
            class_id,
            config,
            states: RefCell::new(OpaqueTable::new()),
        }
    }

    /// Allocate the Signal class in `host` and install its constructor,
    /// prototype methods and finalizer.
    pub fn install(host: &Rc<H>, config: BridgeConfig) -> Result<Rc<Self>> {
        let class_id = host.new_class_id();
        let bridge = Rc::new(Self::new(class_id, config));

        host.define_class(class_id, Self::class_def(&bridge))?;

        tracing::debug!(
            %class_id,
            disconnect = %bridge.config.disconnect,
            "Signal class installed"
        );

        Ok(bridge)
    }

    fn class_def(bridge: &Rc<Self>) -> ClassDef<H> {
        let finalizer: Finalizer<H> = {
            let bridge = Rc::clone(bridge);
            Rc::new(move |host: &Rc<H>, handle: &H::Value| bridge.finalize(host, handle))
        };

        ClassDef {
            name: SIGNAL_CLASS_NAME,
            constructor: MethodDef {
                name: SIGNAL_CLASS_NAME,
                length: 1,
                call: native_method!(bridge, construct),
            },
            methods: vec![
                MethodDef {
                    name: "connect",
                    length: 1,
                    call: native_method!(bridge, connect),
                },
                MethodDef {
                    name: "disconnect",
                    length: 1,
                    call: native_method!(bridge, disconnect),
                },
                MethodDef {
                    name: "isEmpty",
                    length: 0,
                    call: native_method!(bridge, is_empty),
                },
                MethodDef {
                    name: "toString",
                    length: 0,
                    call: native_method!(bridge, to_string),
                },
            ],
            finalizer,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Number of Signals constructed and not yet finalized.
    pub fn live_states(&self) -> usize {
        self.states.borrow().len()
    }

    /// `new Signal(link?)`
    ///
    /// `new_target` is undefined for a direct construction; otherwise the new
    /// object takes `new_target.prototype`. An undefined link argument counts
    /// as no link.
    pub fn construct(
        &self,
        host: &Rc<H>,
        new_target: &H::Value,
        args: &[H::Value],
    ) -> Result<H::Value> {
        expect_args!(args, ..=1, ERR_ARITY);

        let link = match args.first() {
            Some(link) if host.is_undefined(link) => None,
            Some(link) if host.is_object(link) => Some(StrongRef::new(host, link)),
            Some(_) => return Err(BridgeError::ArgumentType(ERR_LINK_NOT_OBJECT)),
            None => None,
        };

        let proto = if host.is_undefined(new_target) {
            host.class_proto(self.class_id)?
        } else {
            host.get_property(new_target, "prototype")?
        };

        let handle = host.new_object_class(&proto, self.class_id);
        host.free_value(proto);
        let handle = handle?;

        let has_link = link.is_some();
        let key = self
            .states
            .borrow_mut()
            .insert(NativeState::initialize(link));
        host.set_opaque(&handle, self.class_id, Some(key));

        tracing::debug!(?key, has_link, "Signal constructed");

        Ok(handle)
    }

    /// `signal.connect(callback)`: store the single subscriber.
    pub fn connect(&self, host: &Rc<H>, this: &H::Value, args: &[H::Value]) -> Result<H::Value> {
        expect_args!(args, 1, ERR_EXPECTED_FUNCTION);

        let callback = &args[0];
        if !host.is_function(callback) {
            return Err(BridgeError::ArgumentType(ERR_ARGUMENT_TYPE));
        }

        let key = self.lookup(host, this)?;

        {
            let mut states = self.states.borrow_mut();
            let state = states
                .get_mut(key)
                .ok_or(BridgeError::Internal(ERR_NO_CONTEXT))?;

            if self.config.link == LinkPolicy::Required && !state.has_link() {
                return Err(BridgeError::State(ERR_NO_LINK));
            }

            state.set_callback(host, callback)?;
        }

        tracing::debug!(?key, "Signal connected");

        Ok(host.new_int32(CONNECTION_TOKEN))
    }

    /// `signal.disconnect(slot)`
    pub fn disconnect(
        &self,
        host: &Rc<H>,
        this: &H::Value,
        args: &[H::Value],
    ) -> Result<H::Value> {
        let disconnected = match DisconnectArgs::parse(&**host, args)? {
            DisconnectArgs::Slot(token) => self.disconnect_slot(host, this, token)?,
        };

        Ok(host.new_bool(disconnected))
    }

    /// A Signal has a single slot, so any token names it.
    fn disconnect_slot(&self, host: &H, this: &H::Value, token: i32) -> Result<bool> {
        // The legacy bindings never read the opaque slot here.
        if self.config.disconnect == DisconnectMode::AlwaysFalse {
            return Ok(false);
        }

        let key = self.lookup(host, this)?;
        tracing::trace!(?key, token, "disconnect");

        let detached = self
            .states
            .borrow_mut()
            .get_mut(key)
            .ok_or(BridgeError::Internal(ERR_NO_CONTEXT))?
            .clear_callback();

        let Some(callback) = detached else {
            return Ok(false);
        };

        // Released here, after the table borrow ended.
        callback.release();
        tracing::debug!(?key, "Signal disconnected");

        Ok(true)
    }

    /// `signal.isEmpty()`
    pub fn is_empty(&self, host: &Rc<H>, this: &H::Value, args: &[H::Value]) -> Result<H::Value> {
        expect_args!(args, 0, ERR_ARITY);

        let key = self.lookup(host, this)?;
        let empty = self
            .states
            .borrow()
            .get(key)
            .map(NativeState::is_empty)
            .ok_or(BridgeError::Internal(ERR_NO_CONTEXT))?;

        Ok(host.new_bool(empty))
    }

    /// `signal.toString()`
    pub fn to_string(
        &self,
        host: &Rc<H>,
        _this: &H::Value,
        _args: &[H::Value],
    ) -> Result<H::Value> {
        Ok(host.new_string(SIGNAL_CLASS_NAME))
    }

    /// Finalizer: release what the Signal owns and unbind its handle.
    ///
    /// Safe to call any number of times and on handles that were never bound;
    /// only the first call on a bound handle does anything.
    pub fn finalize(&self, host: &Rc<H>, handle: &H::Value) {
        let Some(key) = host.get_opaque(handle, self.class_id) else {
            tracing::trace!("finalize on unbound Signal handle");
            return;
        };

        host.set_opaque(handle, self.class_id, None);

        let state = self.states.borrow_mut().remove(key);
        match state {
            Some(state) => {
                tracing::debug!(?key, connected = !state.is_empty(), "Signal finalized");
                state.release();
            }
            None => {
                tracing::warn!(?key, "finalize with stale Signal key");
            }
        }
    }

    /// Whether `handle` is a Signal whose native state is still bound.
    pub fn is_bound(&self, host: &H, handle: &H::Value) -> bool {
        self.lookup(host, handle)
            .map(|key| self.states.borrow().contains(key))
            .unwrap_or(false)
    }

    fn lookup(&self, host: &H, this: &H::Value) -> Result<OpaqueKey> {
        host.get_opaque(this, self.class_id)
            .ok_or(BridgeError::Internal(ERR_NO_CONTEXT))
    }
}

impl<H: ScriptHost> Drop for SignalBridge<H> {
    fn drop(&mut self) {
        let remaining = self.states.get_mut().drain();
        if !remaining.is_empty() {
            tracing::trace!(
                remaining = remaining.len(),
                "Signal bridge dropped with live states"
            );
        }
    }
}
