use crate::{DynSvc, Injectable, Service, Svc};
use std::fmt::{Debug, Formatter};

/// How a value binding is defined: either as plain data that is handed out
/// as-is, or as an [`Injectable`] that is constructed on first resolution.
#[derive(Clone)]
pub enum Definition {
    /// Plain data. Resolving it returns this exact instance.
    Constant(DynSvc),

    /// A constructor with declared dependencies.
    Injectable(Injectable),
}

impl From<Injectable> for Definition {
    fn from(injectable: Injectable) -> Self {
        Definition::Injectable(injectable)
    }
}

impl From<DynSvc> for Definition {
    fn from(instance: DynSvc) -> Self {
        Definition::Constant(instance)
    }
}

impl Debug for Definition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Definition::Constant(_) => f.write_str("Constant(..)"),
            Definition::Injectable(injectable) => {
                f.debug_tuple("Injectable").field(injectable).finish()
            }
        }
    }
}

/// Defines a binding from a constant value. While the value itself will never
/// be exposed through a mutable reference, if it supports interior
/// mutability, its fields still can be mutated. Since the value is never
/// recreated, state can be stored in this manner.
///
/// ## Example
///
/// ```
/// use lazy_injector::{constant, Container, Svc};
///
/// let container = Container::new();
/// let module = container.module("server").into_module().unwrap();
/// module.value("port", constant(8080u16));
///
/// let port: Svc<u16> = module.get_value("port").unwrap();
/// assert_eq!(8080, *port);
/// ```
///
/// ## Interior mutability
///
/// A constant can be used to share a counter between everything that depends
/// on it:
///
/// ```
/// use lazy_injector::{constant, Container, IntoInjectable, Svc};
/// use std::sync::Mutex;
///
/// struct Connection(u32);
///
/// fn connect(counter: Svc<Mutex<u32>>) -> Connection {
///     let mut counter = counter.lock().unwrap();
///     *counter += 1;
///     Connection(*counter)
/// }
///
/// let container = Container::new();
/// let module = container.module("db").into_module().unwrap();
/// module
///     .value("counter", constant(Mutex::new(0u32)))
///     .factory("connection", connect.inject(&["counter"]));
///
/// let connection: Svc<Connection> = module.get_factory("connection").unwrap();
/// let counter: Svc<Mutex<u32>> = module.get_value("counter").unwrap();
///
/// // The resolution pass built one connection before this read did.
/// assert_eq!(2, connection.0);
/// assert_eq!(2, *counter.lock().unwrap());
/// ```
pub fn constant<T: Service>(value: T) -> Definition {
    Definition::Constant(Svc::new(value))
}
