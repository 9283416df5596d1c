//! Call context bridging the dispatcher and native Rust callables.

use std::fmt;

use crate::convert::{FromDynamic, IntoDynamic};
use crate::{Instance, NativeError};

use super::{Callable, Dynamic, Host};

/// Context for one callable invocation.
///
/// Holds the arguments (receiver first for accessors and methods), the
/// number of outputs the caller asked for, the outputs produced so far, and
/// the [`Host`] the call runs against.
///
/// ## Typed Argument Access
///
/// ```ignore
/// let amount: i64 = ctx.arg(1)?;
/// ```
///
/// ## Forwarding
///
/// Decorators usually call the callable they wrap with the same arguments:
///
/// ```ignore
/// let outputs = ctx.forward(&wrapped)?;
/// ctx.set_outputs(outputs);
/// ```
pub struct CallContext<'h> {
    args: Vec<Dynamic>,
    nargout: usize,
    outputs: Vec<Dynamic>,
    host: &'h mut dyn Host,
}

impl<'h> CallContext<'h> {
    pub fn new(args: Vec<Dynamic>, nargout: usize, host: &'h mut dyn Host) -> Self {
        Self {
            args,
            nargout,
            outputs: Vec::new(),
            host,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Number of outputs requested by the caller.
    pub fn nargout(&self) -> usize {
        self.nargout
    }

    pub fn args(&self) -> &[Dynamic] {
        &self.args
    }

    /// Get a raw reference to an argument.
    pub fn arg_slot(&self, index: usize) -> Result<&Dynamic, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Get a typed argument value.
    pub fn arg<T: FromDynamic>(&self, index: usize) -> Result<T, NativeError> {
        let slot = self.arg_slot(index)?;
        T::from_dynamic(slot).map_err(NativeError::Conversion)
    }

    /// The receiver: argument 0 of accessor and method calls.
    pub fn receiver(&self) -> Result<&Dynamic, NativeError> {
        self.args
            .first()
            .ok_or_else(|| NativeError::invalid_receiver("call has no receiver"))
    }

    /// Read access to the receiver instance, whichever semantics it has.
    pub fn with_instance<R>(&self, f: impl FnOnce(&Instance) -> R) -> Result<R, NativeError> {
        match self.receiver()? {
            Dynamic::Object(handle) => self
                .host
                .heap()
                .instance(*handle)
                .map(f)
                .ok_or(NativeError::StaleHandle {
                    index: handle.index,
                }),
            Dynamic::Instance(instance) => Ok(f(instance)),
            other => Err(NativeError::invalid_receiver(format!(
                "expected an instance, got {}",
                other.type_name()
            ))),
        }
    }

    /// Append one output.
    pub fn push_output(&mut self, value: Dynamic) {
        self.outputs.push(value);
    }

    /// Set a single typed return value, replacing earlier outputs.
    pub fn set_return<T: IntoDynamic>(&mut self, value: T) {
        self.outputs.clear();
        self.outputs.push(value.into_dynamic());
    }

    /// Replace all outputs.
    pub fn set_outputs(&mut self, outputs: Vec<Dynamic>) {
        self.outputs = outputs;
    }

    /// Call another callable against the same host.
    pub fn invoke(
        &mut self,
        callable: &Callable,
        args: Vec<Dynamic>,
        nargout: usize,
    ) -> Result<Vec<Dynamic>, NativeError> {
        callable.call(&mut *self.host, args, nargout)
    }

    /// Call `callable` with this call's arguments and output count.
    pub fn forward(&mut self, callable: &Callable) -> Result<Vec<Dynamic>, NativeError> {
        let args = self.args.clone();
        callable.call(&mut *self.host, args, self.nargout)
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    pub fn host_ref(&self) -> &dyn Host {
        &*self.host
    }

    pub(crate) fn into_outputs(self) -> Vec<Dynamic> {
        self.outputs
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.arg_count())
            .field("nargout", &self.nargout)
            .finish()
    }
}
