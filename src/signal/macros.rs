//! Argument-checking and glue macros for native Signal methods.

/// Return an arity error unless `args` has the expected length.
///
/// # Example
/// ```ignore
/// expect_args!(args, 1, "Expected one argument of function type");
/// expect_args!(args, ..=1, "Unsupported number of arguments");
/// ```
macro_rules! expect_args {
    ($args:expr, $count:literal, $message:expr) => {
        if $args.len() != $count {
            return Err($crate::error::BridgeError::Arity($message));
        }
    };
    ($args:expr, $range:expr, $message:expr) => {
        if !($range).contains(&$args.len()) {
            return Err($crate::error::BridgeError::Arity($message));
        }
    };
}

/// Wrap a bridge method as a host native function, translating errors into
/// host exceptions.
///
/// # Example
/// ```ignore
/// let connect: NativeFn<H> = native_method!(bridge, connect);
/// ```
macro_rules! native_method {
    ($bridge:expr, $method:ident) => {{
        let bridge = std::rc::Rc::clone(&$bridge);
        std::rc::Rc::new(
            move |host: &std::rc::Rc<H>, this: &H::Value, args: &[H::Value]| {
                bridge
                    .$method(host, this, args)
                    .map_err(|error| host.raise(error))
            },
        ) as $crate::host::NativeFn<H>
    }};
}
