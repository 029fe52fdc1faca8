use crate::{DynSvc, Service, Svc};
use derive_more::Display;
use std::collections::HashMap;

/// The namespaces a name can be bound in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Display)]
pub enum BindingKind {
    /// A whole module.
    #[display(fmt = "module")]
    Module,

    /// A value binding.
    #[display(fmt = "value")]
    Value,

    /// A service binding, memoized once constructed.
    #[display(fmt = "service")]
    Service,

    /// A factory binding, constructed on each read.
    #[display(fmt = "factory")]
    Factory,
}

/// Constructs a fresh mock instance. Implemented for all zero-argument
/// closures returning a service.
pub(crate) trait MockConstructor: Service {
    fn construct(&self) -> DynSvc;
}

impl<F, R> MockConstructor for F
where
    F: Service + Fn() -> R,
    R: Service,
{
    fn construct(&self) -> DynSvc {
        Svc::new(self())
    }
}

#[derive(Clone)]
pub(crate) enum Override {
    Instance(DynSvc),
    Factory(Svc<dyn MockConstructor>),
}

impl Override {
    /// Produces the instance to hand out in place of the real binding.
    pub fn instance(&self) -> DynSvc {
        match self {
            Override::Instance(instance) => instance.clone(),
            Override::Factory(constructor) => constructor.construct(),
        }
    }
}

/// Container-wide overrides, consulted before any normal resolution.
#[derive(Default)]
pub(crate) struct OverrideMap {
    entries: HashMap<(BindingKind, String), Override>,
}

impl OverrideMap {
    pub fn insert(&mut self, kind: BindingKind, name: &str, value: Override) {
        self.entries.insert((kind, name.to_owned()), value);
    }

    pub fn get(&self, kind: BindingKind, name: &str) -> Option<Override> {
        self.entries.get(&(kind, name.to_owned())).cloned()
    }

    pub fn remove(&mut self, kind: BindingKind, name: &str) -> bool {
        self.entries.remove(&(kind, name.to_owned())).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_keyed_by_kind() {
        let mut overrides = OverrideMap::default();
        overrides.insert(
            BindingKind::Value,
            "PORT",
            Override::Instance(Svc::new("9999")),
        );

        assert!(overrides.get(BindingKind::Value, "PORT").is_some());
        assert!(overrides.get(BindingKind::Service, "PORT").is_none());
        assert!(overrides.remove(BindingKind::Value, "PORT"));
        assert!(overrides.get(BindingKind::Value, "PORT").is_none());
        assert!(!overrides.remove(BindingKind::Value, "PORT"));
    }

    #[test]
    fn factory_override_constructs_each_time() {
        let constructor: Svc<dyn MockConstructor> = Svc::new(|| 5_i32);
        let factory = Override::Factory(constructor);

        let first = factory.instance();
        let second = factory.instance();
        assert!(!Svc::ptr_eq(&first, &second));
        assert_eq!(Some(&5), first.downcast_ref::<i32>());
    }
}
