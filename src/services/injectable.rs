use crate::{Arguments, DynSvc, InjectResult, Service, Shared, SharedEx, Svc};
use std::fmt::{Debug, Formatter};

/// Builds an instance from the resolved dependencies of an [`Injectable`].
/// This is automatically implemented for all closures taking [`&Arguments`]
/// and returning a [`Construction`].
///
/// [`&Arguments`]: Arguments
pub trait Constructor: Service {
    /// Invokes the constructor with the dependencies it declared, in the order
    /// they were declared.
    fn construct(&self, arguments: &Arguments) -> InjectResult<Construction>;
}

impl<F> Constructor for F
where
    F: Service + Fn(&Arguments) -> InjectResult<Construction>,
{
    fn construct(&self, arguments: &Arguments) -> InjectResult<Construction> {
        self(arguments)
    }
}

/// The outcome of invoking a [`Constructor`].
///
/// A constructor either populates the fresh receiver it was handed, or hands
/// back a different object to use in its place. When an object is returned,
/// it always wins over the receiver.
pub enum Construction {
    /// The receiver the constructor populated.
    ConstructedInstance(DynSvc),

    /// An object returned in place of the receiver.
    ReturnedObject(DynSvc),
}

impl Construction {
    /// Picks the effective instance of this construction.
    #[must_use]
    pub fn into_instance(self) -> DynSvc {
        match self {
            Construction::ReturnedObject(returned) => returned,
            Construction::ConstructedInstance(receiver) => receiver,
        }
    }

    /// Whether the constructor returned an object in place of its receiver.
    #[must_use]
    pub fn is_returned(&self) -> bool {
        matches!(self, Construction::ReturnedObject(_))
    }
}

impl Debug for Construction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Construction::ConstructedInstance(_) => {
                f.write_str("ConstructedInstance(..)")
            }
            Construction::ReturnedObject(_) => f.write_str("ReturnedObject(..)"),
        }
    }
}

/// A constructor paired with the ordered names of the bindings it depends on.
/// Nothing is constructed until the owning module resolves the binding.
///
/// ## Example
///
/// ```
/// use lazy_injector::{constant, Container, Injectable, Svc};
///
/// #[derive(Default)]
/// struct Greeter {
///     greeting: String,
/// }
///
/// let container = Container::new();
/// let module = container.module("greetings").into_module().unwrap();
/// module.value("greeting", constant("ola")).service(
///     "greeter",
///     Injectable::constructor(&["greeting"], |greeter: &mut Greeter, arguments| {
///         greeter.greeting = arguments.get::<&str>(0)?.to_string();
///         Ok(())
///     }),
/// );
///
/// let greeter: Svc<Greeter> = module.get_service("greeter").unwrap();
/// assert_eq!("ola", greeter.greeting);
/// ```
#[derive(Clone)]
pub struct Injectable {
    dependencies: Vec<String>,
    constructor: Svc<dyn Constructor>,
}

impl Injectable {
    /// Creates an injectable from a raw constructor. The constructor decides
    /// for itself whether it produced its receiver or a returned object.
    pub fn new<F>(dependencies: &[&str], constructor: F) -> Self
    where
        F: Service + Fn(&Arguments) -> InjectResult<Construction>,
    {
        Injectable {
            dependencies: dependencies.iter().map(|&name| name.to_owned()).collect(),
            constructor: Svc::new(constructor),
        }
    }

    /// Creates an injectable which constructs a fresh `T` and lets `init`
    /// populate it from its dependencies. The populated receiver is the
    /// resulting instance.
    pub fn constructor<T, F>(dependencies: &[&str], init: F) -> Self
    where
        T: Default + Service,
        F: Service + Fn(&mut T, &Arguments) -> InjectResult<()>,
    {
        Injectable::new(dependencies, move |arguments| {
            let mut receiver = T::default();
            init(&mut receiver, arguments)?;
            Ok(Construction::ConstructedInstance(Svc::new(receiver)))
        })
    }

    /// Creates an injectable whose function returns the object to use as the
    /// resulting instance.
    pub fn returning<R, F>(dependencies: &[&str], func: F) -> Self
    where
        R: Service,
        F: Service + Fn(&Arguments) -> InjectResult<R>,
    {
        Injectable::new(dependencies, move |arguments| {
            let returned = func(arguments)?;
            Ok(Construction::ReturnedObject(Svc::new(returned)))
        })
    }

    /// The names this injectable depends on, in the order they are passed to
    /// its constructor.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Invokes the constructor with already resolved dependencies.
    pub fn construct(&self, arguments: &Arguments) -> InjectResult<Construction> {
        self.constructor.construct(arguments)
    }
}

impl Debug for Injectable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injectable")
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// A named binding together with its memoized instance. Items are shared
/// between a module and every module inheriting from it.
pub(crate) struct InjectableItem {
    name: String,
    definition: crate::Definition,
    resolved: Shared<Option<DynSvc>>,
}

impl InjectableItem {
    pub fn new(name: &str, definition: crate::Definition) -> Self {
        InjectableItem {
            name: name.to_owned(),
            definition,
            resolved: SharedEx::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &crate::Definition {
        &self.definition
    }

    pub fn resolved(&self) -> Option<DynSvc> {
        self.resolved.with_inner(Clone::clone)
    }

    /// Stores the instance unless one was stored first, and returns whichever
    /// instance is kept.
    pub fn memoize(&self, instance: DynSvc) -> DynSvc {
        self.resolved
            .with_inner_mut(|resolved| resolved.get_or_insert(instance).clone())
    }
}
