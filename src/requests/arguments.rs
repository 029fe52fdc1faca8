use crate::{
    downcast_binding, DynSvc, InjectError, InjectResult, Module, Service, Svc,
};

/// The resolved dependencies handed to a constructor, in the order the
/// constructor declared them.
#[derive(Clone)]
pub struct Arguments {
    module: String,
    names: Vec<String>,
    values: Vec<DynSvc>,
}

impl Arguments {
    pub(crate) fn new(
        module: &str,
        names: Vec<String>,
        values: Vec<DynSvc>,
    ) -> Self {
        Arguments {
            module: module.to_owned(),
            names,
            values,
        }
    }

    /// The name of the module the arguments were resolved in.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// The number of injected arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were injected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The declared dependency names, in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Gets the type-erased argument at a position.
    pub fn get_dyn(&self, index: usize) -> InjectResult<DynSvc> {
        self.values
            .get(index)
            .cloned()
            .ok_or(InjectError::MissingArgument { index })
    }

    /// Gets the argument at a position as a service pointer of the requested
    /// type.
    pub fn get<T: Service>(&self, index: usize) -> InjectResult<Svc<T>> {
        let value = self.get_dyn(index)?;
        let name = self.names.get(index).map_or("", String::as_str);
        downcast_binding(name, value)
    }

    /// Gets the argument that was injected for a dependency name.
    pub fn by_name<T: Service>(&self, name: &str) -> InjectResult<Svc<T>> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| InjectError::MissingDependency {
                module: self.module.clone(),
                dependency: name.to_owned(),
            })?;
        self.get(index)
    }

    /// Gets the argument at a position as a module. Dependency names which
    /// match no binding fall back to the module with that name.
    pub fn module(&self, index: usize) -> InjectResult<Module> {
        self.get::<Module>(index).map(|module| (*module).clone())
    }

    /// Iterates over the arguments paired with their dependency names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynSvc)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// A parameter of an [`InjectableFn`](crate::InjectableFn). Implementations
/// pull their value out of the constructor's [`Arguments`].
pub trait Dependency: Sized {
    /// Extracts this dependency from the argument at a position.
    fn from_argument(arguments: &Arguments, index: usize) -> InjectResult<Self>;
}

/// Requests a service pointer of a concrete type.
impl<T: Service> Dependency for Svc<T> {
    #[inline]
    fn from_argument(arguments: &Arguments, index: usize) -> InjectResult<Self> {
        arguments.get(index)
    }
}

/// Requests the argument without checking its type.
impl Dependency for DynSvc {
    #[inline]
    fn from_argument(arguments: &Arguments, index: usize) -> InjectResult<Self> {
        arguments.get_dyn(index)
    }
}

/// Requests a module by name.
impl Dependency for Module {
    #[inline]
    fn from_argument(arguments: &Arguments, index: usize) -> InjectResult<Self> {
        arguments.module(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments() -> Arguments {
        Arguments::new(
            "server",
            vec!["port".to_owned(), "host".to_owned()],
            vec![Svc::new(8080_u16) as DynSvc, Svc::new("localhost") as DynSvc],
        )
    }

    #[test]
    fn arguments_are_positional() {
        let arguments = arguments();
        assert_eq!(2, arguments.len());
        assert_eq!(8080, *arguments.get::<u16>(0).unwrap());
        assert_eq!("localhost", *arguments.get::<&str>(1).unwrap());
        assert_eq!("localhost", *arguments.by_name::<&str>("host").unwrap());
    }

    #[test]
    fn missing_argument_is_an_error() {
        match arguments().get::<u16>(2) {
            Err(InjectError::MissingArgument { index: 2 }) => {}
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("an undeclared argument was injected"),
        }
    }

    #[test]
    fn wrongly_typed_argument_is_an_error() {
        match arguments().get::<String>(0) {
            Err(InjectError::InvalidBinding { name, .. }) => {
                assert_eq!("port", name);
            }
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("a u16 was injected as a String"),
        }
    }
}
