use crate::{
    downcast_binding, resolve_injectable, BindingKey, BindingKind, Container,
    ContainerState, Definition, DynSvc, InjectError, InjectResult, Injectable,
    InjectableItem, Lookup, OrderedMap, ResolutionPath, Service, Shared,
    SharedEx, Svc, WeakSvc,
};
use log::{error, trace};
use std::fmt::{Debug, Formatter};

/// The outcome of resolving each binding of one kind, in registration order.
pub type Resolutions = Vec<(String, InjectResult<DynSvc>)>;

/// A module another module depends on.
#[derive(Clone, Debug)]
pub enum ModuleDependency {
    /// A dependency that has not been looked up yet.
    Pending(String),

    /// A dependency that was found during the resolution pass.
    Resolved(Module),

    /// A dependency that no module was registered for during the resolution
    /// pass.
    Unresolved(String),
}

impl ModuleDependency {
    /// The name of the module depended on.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ModuleDependency::Pending(name)
            | ModuleDependency::Unresolved(name) => name,
            ModuleDependency::Resolved(module) => module.name(),
        }
    }

    /// The module depended on, if it has been resolved.
    #[must_use]
    pub fn module(&self) -> Option<&Module> {
        match self {
            ModuleDependency::Resolved(module) => Some(module),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct ModuleState {
    pub dependencies: Vec<ModuleDependency>,
    pub dependencies_initialized: bool,
    pub values: OrderedMap<Svc<InjectableItem>>,
    pub services: OrderedMap<Svc<InjectableItem>>,
    pub factories: OrderedMap<Injectable>,
}

/// A named collection of value, service, and factory bindings. Modules are
/// created through [`Container::module`] and are cheap to clone; clones refer
/// to the same module.
///
/// Registering a binding never constructs anything. Reading one triggers the
/// container's resolution pass if it has not run yet, then returns the mock
/// registered for that name if there is one, or the resolved binding.
///
/// - **Values** are handed out as-is, or constructed once if they are defined
///   by an [`Injectable`].
/// - **Services** are always constructed, and only once per module.
/// - **Factories** are constructed again on every read.
///
/// ```
/// use lazy_injector::{constant, Container, IntoInjectable, Svc};
///
/// struct Connection {
///     port: u16,
/// }
///
/// let container = Container::new();
/// let module = container.module("db").into_module().unwrap();
/// module
///     .value("port", constant(5432u16))
///     .service("pool", (|port: Svc<u16>| Connection { port: *port }).inject(&["port"]))
///     .factory("connection", (|port: Svc<u16>| Connection { port: *port }).inject(&["port"]));
///
/// let pool1: Svc<Connection> = module.get_service("pool").unwrap();
/// let pool2: Svc<Connection> = module.get_service("pool").unwrap();
/// assert!(Svc::ptr_eq(&pool1, &pool2));
///
/// let connection1: Svc<Connection> = module.get_factory("connection").unwrap();
/// let connection2: Svc<Connection> = module.get_factory("connection").unwrap();
/// assert!(!Svc::ptr_eq(&connection1, &connection2));
/// assert_eq!(5432, connection1.port);
/// ```
#[derive(Clone)]
pub struct Module {
    name: Svc<str>,
    container: WeakSvc<ContainerState>,
    state: Shared<ModuleState>,
}

impl Module {
    pub(crate) fn new(
        name: &str,
        dependencies: Vec<String>,
        container: WeakSvc<ContainerState>,
    ) -> Self {
        let state = ModuleState {
            dependencies: dependencies
                .into_iter()
                .map(ModuleDependency::Pending)
                .collect(),
            ..ModuleState::default()
        };

        Module {
            name: Svc::from(name),
            container,
            state: SharedEx::new(state),
        }
    }

    pub(crate) fn state(&self) -> &Shared<ModuleState> {
        &self.state
    }

    /// The name this module is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The modules this module depends on, in declaration order. Before the
    /// resolution pass these are [`ModuleDependency::Pending`].
    #[must_use]
    pub fn dependencies(&self) -> Vec<ModuleDependency> {
        self.state.with_inner(|state| state.dependencies.clone())
    }

    /// The container this module belongs to, if it is still alive.
    #[must_use]
    pub fn container(&self) -> Option<Container> {
        self.container.upgrade().map(Container::from_state)
    }

    /// Whether two handles refer to the same module.
    #[must_use]
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Svc::ptr_eq(&self.state, &other.state)
    }

    /// Binds a value. Plain data is defined with [`constant`](crate::constant);
    /// an [`Injectable`] is constructed on first read. Replaces any value
    /// previously bound under the same name in this module.
    pub fn value(&self, name: &str, definition: impl Into<Definition>) -> &Self {
        let item = Svc::new(InjectableItem::new(name, definition.into()));
        self.state.with_inner_mut(|state| {
            state.values.insert(name, item);
        });
        self
    }

    /// Binds a service. Services are constructed once, then shared by every
    /// read from this module. Replaces any service previously bound under the
    /// same name in this module.
    pub fn service(&self, name: &str, injectable: Injectable) -> &Self {
        let item = Svc::new(InjectableItem::new(name, injectable.into()));
        self.state.with_inner_mut(|state| {
            state.services.insert(name, item);
        });
        self
    }

    /// Binds a factory. Factories are constructed again on every read.
    /// Replaces any factory previously bound under the same name in this
    /// module.
    pub fn factory(&self, name: &str, injectable: Injectable) -> &Self {
        self.state.with_inner_mut(|state| {
            state.factories.insert(name, injectable);
        });
        self
    }

    /// Whether a value is bound under a name, either locally or inherited.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.state.with_inner(|state| state.values.contains_key(name))
    }

    /// Whether a service is bound under a name, either locally or inherited.
    #[must_use]
    pub fn has_service(&self, name: &str) -> bool {
        self.state.with_inner(|state| state.services.contains_key(name))
    }

    /// Whether a factory is bound under a name, either locally or inherited.
    #[must_use]
    pub fn has_factory(&self, name: &str) -> bool {
        self.state.with_inner(|state| state.factories.contains_key(name))
    }

    /// Reads a value as the requested type.
    pub fn get_value<T: Service>(&self, name: &str) -> InjectResult<Svc<T>> {
        let value = self.get_dyn_value(name)?;
        self.expect_binding(BindingKind::Value, name, value)
    }

    /// Reads a service as the requested type.
    pub fn get_service<T: Service>(&self, name: &str) -> InjectResult<Svc<T>> {
        let service = self.get_dyn_service(name)?;
        self.expect_binding(BindingKind::Service, name, service)
    }

    /// Constructs a new instance from a factory as the requested type.
    pub fn get_factory<T: Service>(&self, name: &str) -> InjectResult<Svc<T>> {
        let instance = self.get_dyn_factory(name)?;
        self.expect_binding(BindingKind::Factory, name, instance)
    }

    /// Reads a value without checking its type. Returns `Ok(None)` if no
    /// value is bound under the name.
    pub fn get_dyn_value(&self, name: &str) -> InjectResult<Option<DynSvc>> {
        self.find_value(name, &ResolutionPath::new())
    }

    /// Reads a service without checking its type. Returns `Ok(None)` if no
    /// service is bound under the name.
    pub fn get_dyn_service(&self, name: &str) -> InjectResult<Option<DynSvc>> {
        self.find_service(name, &ResolutionPath::new())
    }

    /// Constructs a new instance from a factory without checking its type.
    /// Returns `Ok(None)` if no factory is bound under the name.
    pub fn get_dyn_factory(&self, name: &str) -> InjectResult<Option<DynSvc>> {
        self.find_factory(name, &ResolutionPath::new())
    }

    /// Resolves every value bound in this module, in the order the values
    /// were bound. Inherited values follow the module's own.
    pub fn get_values(&self) -> Resolutions {
        self.run();
        let items = self.state.with_inner(|state| {
            state.values.values().cloned().collect::<Vec<_>>()
        });
        self.resolve_items(BindingKind::Value, items)
    }

    /// Resolves every service bound in this module, in the order the
    /// services were bound.
    pub fn get_services(&self) -> Resolutions {
        self.run();
        let items = self.state.with_inner(|state| {
            state.services.values().cloned().collect::<Vec<_>>()
        });
        self.resolve_items(BindingKind::Service, items)
    }

    /// Constructs an instance from every factory bound in this module, in the
    /// order the factories were bound.
    pub fn get_factories(&self) -> Resolutions {
        self.run();
        let names = self.state.with_inner(|state| {
            state.factories.names().map(str::to_owned).collect::<Vec<_>>()
        });
        names
            .into_iter()
            .map(|name| {
                let instance = self.get_dyn_factory(&name).and_then(|instance| {
                    instance.ok_or_else(|| self.missing(BindingKind::Factory, &name))
                });
                (name, instance)
            })
            .collect()
    }

    /// Runs the container's resolution pass if it has not run yet.
    pub fn run(&self) -> &Self {
        if let Some(container) = self.container.upgrade() {
            container.ensure_resolved();
        }
        self
    }

    /// Runs the container's resolution pass if it has not run yet, then
    /// invokes the callback. The callback is invoked even if the pass had
    /// already run.
    pub fn run_with<F: FnOnce()>(&self, callback: F) -> &Self {
        self.run();
        callback();
        self
    }

    /// Resolves every binding in this module, logging the bindings that fail.
    pub(crate) fn resolve_eagerly(&self) {
        let results = [
            (BindingKind::Value, self.get_values()),
            (BindingKind::Service, self.get_services()),
            (BindingKind::Factory, self.get_factories()),
        ];

        for (kind, results) in results {
            for (name, result) in results {
                if let Err(error) = result {
                    error!(
                        "Unable to resolve {} {} for module {}: {}",
                        kind,
                        name,
                        self.name(),
                        error
                    );
                }
            }
        }
    }

    /// Fills in every binding of `dependency` that this module does not bind
    /// itself.
    pub(crate) fn inherit_from(&self, dependency: &Module) {
        let (values, services, factories) =
            dependency.state.with_inner(|state| {
                (
                    state.values.clone(),
                    state.services.clone(),
                    state.factories.clone(),
                )
            });

        self.state.with_inner_mut(|state| {
            for (name, item) in values.iter() {
                state.values.insert_if_absent(name, item.clone());
            }
            for (name, item) in services.iter() {
                state.services.insert_if_absent(name, item.clone());
            }
            for (name, injectable) in factories.iter() {
                state.factories.insert_if_absent(name, injectable.clone());
            }
        });
    }

    fn expect_binding<T: Service>(
        &self,
        kind: BindingKind,
        name: &str,
        instance: Option<DynSvc>,
    ) -> InjectResult<Svc<T>> {
        let instance = instance.ok_or_else(|| self.missing(kind, name))?;
        downcast_binding(name, instance)
    }

    fn missing(&self, kind: BindingKind, name: &str) -> InjectError {
        InjectError::MissingBinding {
            module: self.name().to_owned(),
            kind,
            name: name.to_owned(),
        }
    }

    /// Triggers the resolution pass and checks for a mock of the binding.
    fn prepare(&self, kind: BindingKind, name: &str) -> Option<DynSvc> {
        let container = self.container.upgrade()?;
        container.ensure_resolved();
        let mock = container.mock(kind, name);
        if mock.is_some() {
            trace!("using mock {} {} in module {}", kind, name, self.name());
        }
        mock
    }

    fn resolve_items(
        &self,
        kind: BindingKind,
        items: Vec<Svc<InjectableItem>>,
    ) -> Resolutions {
        items
            .into_iter()
            .map(|item| {
                let result = match self.prepare(kind, item.name()) {
                    Some(mock) => Ok(mock),
                    None => self.resolve_item(kind, &item, &ResolutionPath::new()),
                };
                (item.name().to_owned(), result)
            })
            .collect()
    }

    fn resolve_item(
        &self,
        kind: BindingKind,
        item: &InjectableItem,
        path: &ResolutionPath,
    ) -> InjectResult<DynSvc> {
        if let Some(instance) = item.resolved() {
            return Ok(instance);
        }

        let instance = match item.definition() {
            Definition::Constant(instance) => instance.clone(),
            Definition::Injectable(injectable) => {
                let path = path.with_request(BindingKey::new(
                    self.name(),
                    kind,
                    item.name(),
                ))?;
                trace!("resolving {} {} in module {}", kind, item.name(), self.name());
                resolve_injectable(injectable, self, &path)?
            }
        };

        Ok(item.memoize(instance))
    }

    fn find_item(
        &self,
        kind: BindingKind,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>> {
        if let Some(mock) = self.prepare(kind, name) {
            return Ok(Some(mock));
        }

        let item = self.state.with_inner(|state| match kind {
            BindingKind::Value => state.values.get(name).cloned(),
            BindingKind::Service => state.services.get(name).cloned(),
            BindingKind::Module | BindingKind::Factory => None,
        });

        match item {
            Some(item) => self.resolve_item(kind, &item, path).map(Some),
            None => Ok(None),
        }
    }
}

impl Lookup for Module {
    fn module_name(&self) -> &str {
        self.name()
    }

    fn find_value(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>> {
        self.find_item(BindingKind::Value, name, path)
    }

    fn find_service(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>> {
        self.find_item(BindingKind::Service, name, path)
    }

    fn find_factory(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>> {
        if let Some(mock) = self.prepare(BindingKind::Factory, name) {
            return Ok(Some(mock));
        }

        let injectable =
            self.state.with_inner(|state| state.factories.get(name).cloned());
        let injectable = match injectable {
            Some(injectable) => injectable,
            None => return Ok(None),
        };

        let path = path.with_request(BindingKey::new(
            self.name(),
            BindingKind::Factory,
            name,
        ))?;
        trace!("constructing factory {} in module {}", name, self.name());
        resolve_injectable(&injectable, self, &path).map(Some)
    }

    fn find_module(&self, name: &str) -> Option<DynSvc> {
        let container = self.container.upgrade()?;
        if let Some(mock) = container.mock(BindingKind::Module, name) {
            return Some(mock);
        }
        container
            .module_named(name)
            .map(|module| Svc::new(module) as DynSvc)
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let dependencies = self.state.with_inner(|state| {
            state
                .dependencies
                .iter()
                .map(|dependency| dependency.name().to_owned())
                .collect::<Vec<_>>()
        });
        f.debug_struct("Module")
            .field("name", &self.name())
            .field("dependencies", &dependencies)
            .finish()
    }
}
