use crate::BindingKind;
use derive_more::{Display, Error};

#[cfg(feature = "arc")]
mod types {
    use crate::InjectError;
    use std::{
        any::Any,
        sync::{Arc, Mutex, PoisonError, Weak},
    };

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Arc<T>;

    /// A weak reference to a service pointer.
    pub type WeakSvc<T> = Weak<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Arc<dyn Any + Send + Sync>;

    /// A result from attempting to inject dependencies into a binding and
    /// construct an instance of it.
    pub type InjectResult<T> = Result<T, InjectError>;

    /// A deferred unit of work handed to a [`Scheduler`](crate::Scheduler).
    pub type Task = Box<dyn FnOnce() + Send>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any + Send + Sync {}
    impl<T: ?Sized + Any + Send + Sync> Service for T {}

    pub(crate) type Shared<T> = Arc<Mutex<T>>;

    pub(crate) trait SharedEx<T> {
        fn new(value: T) -> Self;
        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R;
        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
    }

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Arc::new(Mutex::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.lock().unwrap_or_else(PoisonError::into_inner))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }
}

#[cfg(feature = "rc")]
mod types {
    use crate::InjectError;
    use std::{
        any::Any,
        cell::RefCell,
        rc::{Rc, Weak},
    };

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Rc<T>;

    /// A weak reference to a service pointer.
    pub type WeakSvc<T> = Weak<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Rc<dyn Any>;

    /// A result from attempting to inject dependencies into a binding and
    /// construct an instance of it.
    pub type InjectResult<T> = Result<T, InjectError>;

    /// A deferred unit of work handed to a [`Scheduler`](crate::Scheduler).
    pub type Task = Box<dyn FnOnce()>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any {}
    impl<T: ?Sized + Any> Service for T {}

    pub(crate) type Shared<T> = Rc<RefCell<T>>;

    pub(crate) trait SharedEx<T> {
        fn new(value: T) -> Self;
        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R;
        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
    }

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Rc::new(RefCell::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.borrow())
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.borrow_mut())
        }
    }
}

#[allow(clippy::wildcard_imports)]
pub use types::*;

/// Downcasts a type-erased binding into a service pointer of the requested
/// type.
pub(crate) fn downcast_binding<T: Service>(
    name: &str,
    instance: DynSvc,
) -> InjectResult<Svc<T>> {
    instance.downcast::<T>().map_err(|_| InjectError::InvalidBinding {
        name: name.to_owned(),
        expected: std::any::type_name::<T>(),
    })
}

/// An error that has occurred during registration or resolution of a binding.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum InjectError {
    /// A module was declared with a dependency list under a name that is
    /// already registered.
    #[display(fmt = "a module called {} has already been registered", name)]
    DuplicateModule {
        /// The name of the module.
        name: String,
    },

    /// A dependency name could not be found in any of the values, services,
    /// factories, or modules visible to the requesting module.
    #[display(
        fmt = "unable to find injectable {} for module {} (did you forget to register it?)",
        dependency,
        module
    )]
    MissingDependency {
        /// The module that requested the dependency.
        module: String,
        /// The name of the dependency.
        dependency: String,
    },

    /// A binding was requested by name but none is registered.
    #[display(fmt = "module {} has no {} named {}", module, kind, name)]
    MissingBinding {
        /// The module the binding was requested from.
        module: String,
        /// The kind of binding that was requested.
        kind: BindingKind,
        /// The name of the binding.
        name: String,
    },

    /// The resolved binding is not of the requested type.
    #[display(fmt = "binding {} is not of type {}", name, expected)]
    InvalidBinding {
        /// The name of the binding.
        name: String,
        /// The type that was requested.
        expected: &'static str,
    },

    /// A constructor requested an argument that was not declared in its
    /// dependency list.
    #[display(fmt = "no argument was injected at position {}", index)]
    MissingArgument {
        /// The position of the argument.
        index: usize,
    },

    /// A module was requested, but a mock has been registered in its place.
    #[display(fmt = "module {} has been replaced by a mock", name)]
    MockedModule {
        /// The name of the module.
        name: String,
    },

    /// A cycle was detected during resolution of a binding.
    #[display(
        fmt = "a cycle was detected during resolution of {} [{}]",
        name,
        "cycle.join(\" -> \")"
    )]
    CycleDetected {
        /// The binding that was requested.
        name: String,
        /// The chain of bindings that were requested, ending with the binding
        /// that closed the cycle.
        cycle: Vec<String>,
    },

    /// A constructor failed to produce its instance.
    #[display(fmt = "an error occurred during activation of {}: {}", name, reason)]
    ActivationFailed {
        /// The binding that was being constructed.
        name: String,
        /// Why construction failed.
        reason: String,
    },
}

impl InjectError {
    /// Creates an [`InjectError::ActivationFailed`] for a binding.
    pub fn activation_failed(
        name: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        InjectError::ActivationFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
