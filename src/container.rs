use crate::{
    merge_all, BindingKind, ContainerBuilder, DynSvc, InjectError,
    InjectResult, Module, OrderedMap, Override, OverrideMap, Scheduler,
    Service, Shared, SharedEx, Svc,
};
use log::debug;
use std::fmt::{Debug, Formatter};

/// Whether the bindings registered so far have been merged and resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ResolutionState {
    Pending,
    Resolved,
}

pub(crate) struct Registry {
    modules: OrderedMap<Module>,
    resolution: ResolutionState,
}

pub(crate) struct ContainerState {
    registry: Shared<Registry>,
    overrides: Shared<OverrideMap>,
    scheduler: Box<dyn Scheduler>,
}

impl ContainerState {
    /// Runs the resolution pass unless it has already run since the last
    /// module was registered. The state is marked resolved before the pass
    /// starts, so bindings read while it runs do not start it again.
    ///
    /// Modules are merged and resolved in registration order. An inherited
    /// binding shares its memo slot with the module it came from, so the
    /// earliest registered module that binds it decides what it captures.
    pub(crate) fn ensure_resolved(&self) {
        let modules = self.registry.with_inner_mut(|registry| {
            match registry.resolution {
                ResolutionState::Resolved => None,
                ResolutionState::Pending => {
                    registry.resolution = ResolutionState::Resolved;
                    Some(registry.modules.clone())
                }
            }
        });
        let modules = match modules {
            Some(modules) => modules,
            None => return,
        };

        debug!("resolving {} module(s)", modules.len());
        merge_all(&modules);
        for module in modules.values() {
            module.resolve_eagerly();
        }
        debug!("resolution pass complete");
    }

    /// Produces the mock registered for a binding, if there is one.
    pub(crate) fn mock(&self, kind: BindingKind, name: &str) -> Option<DynSvc> {
        self.overrides
            .with_inner(|overrides| overrides.get(kind, name))
            .map(|mock| mock.instance())
    }

    /// Gets the module registered under a name, ignoring mocks.
    pub(crate) fn module_named(&self, name: &str) -> Option<Module> {
        self.registry
            .with_inner(|registry| registry.modules.get(name).cloned())
    }

    fn set_mock(&self, kind: BindingKind, name: &str, mock: Override) {
        debug!("mocking {} {}", kind, name);
        self.overrides
            .with_inner_mut(|overrides| overrides.insert(kind, name, mock));
    }
}

/// A module, or the mock registered in its place.
#[derive(Clone)]
pub enum ModuleRef {
    /// A registered module.
    Module(Module),

    /// A mock registered with [`Container::set_mock_module`].
    Mock {
        /// The name the mock was registered under.
        name: String,
        /// The mock itself.
        instance: DynSvc,
    },
}

impl ModuleRef {
    /// Gets the module, failing if a mock was returned in its place.
    pub fn into_module(self) -> InjectResult<Module> {
        match self {
            ModuleRef::Module(module) => Ok(module),
            ModuleRef::Mock { name, .. } => Err(InjectError::MockedModule { name }),
        }
    }

    /// Gets the module, if this is not a mock.
    #[must_use]
    pub fn as_module(&self) -> Option<&Module> {
        match self {
            ModuleRef::Module(module) => Some(module),
            ModuleRef::Mock { .. } => None,
        }
    }

    /// Whether a mock was returned in place of the module.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        matches!(self, ModuleRef::Mock { .. })
    }

    /// Gets the mock as the requested type. Returns `None` if this is not a
    /// mock or if the mock is of a different type.
    #[must_use]
    pub fn mock<T: Service>(&self) -> Option<Svc<T>> {
        match self {
            ModuleRef::Mock { instance, .. } => instance.clone().downcast().ok(),
            ModuleRef::Module(_) => None,
        }
    }
}

impl Debug for ModuleRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleRef::Module(module) => {
                f.debug_tuple("Module").field(module).finish()
            }
            ModuleRef::Mock { name, .. } => {
                f.debug_struct("Mock").field("name", name).finish()
            }
        }
    }
}

/// A registry of modules and the mocks that override their bindings.
///
/// Modules can be registered in any order. Nothing is merged or constructed
/// until the first binding is read, [`run`](Container::run) is called, or the
/// resolution pass deferred through the container's [`Scheduler`] runs,
/// whichever happens first.
///
/// With the "arc" feature a container can be shared between threads, but
/// resolution is not synchronized across them. The container is marked
/// resolved as soon as a pass starts, so a read on another thread while that
/// pass is still merging modules may not see inherited bindings yet. Finish
/// registering and call [`run`](Container::run) before sharing the container.
///
/// ```
/// use lazy_injector::{constant, Container, IntoInjectable, Svc};
///
/// struct Greeter {
///     greeting: Svc<&'static str>,
/// }
///
/// let container = Container::new();
///
/// // "app" is declared before the module it depends on.
/// let app = container.module_with("app", &["greetings"]).unwrap().into_module().unwrap();
/// app.service(
///     "greeter",
///     (|greeting: Svc<&'static str>| Greeter { greeting }).inject(&["greeting"]),
/// );
/// container
///     .module("greetings")
///     .into_module()
///     .unwrap()
///     .value("greeting", constant("ola"));
///
/// let greeter: Svc<Greeter> = app.get_service("greeter").unwrap();
/// assert_eq!("ola", *greeter.greeting);
/// ```
#[derive(Clone)]
pub struct Container {
    state: Svc<ContainerState>,
}

impl Container {
    /// Creates a container that defers its resolution pass to a
    /// [`TickQueue`](crate::TickQueue).
    #[must_use]
    pub fn new() -> Self {
        ContainerBuilder::default().build()
    }

    /// Creates a builder for configuring a container.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    pub(crate) fn from_scheduler(scheduler: Box<dyn Scheduler>) -> Self {
        let registry = Registry {
            modules: OrderedMap::default(),
            resolution: ResolutionState::Resolved,
        };

        Container {
            state: Svc::new(ContainerState {
                registry: SharedEx::new(registry),
                overrides: SharedEx::new(OverrideMap::default()),
                scheduler,
            }),
        }
    }

    pub(crate) fn from_state(state: Svc<ContainerState>) -> Self {
        Container { state }
    }

    /// Gets the module registered under a name, registering it first if it
    /// does not exist yet. If a module mock has been registered under the
    /// name, the mock is returned instead.
    pub fn module(&self, name: &str) -> ModuleRef {
        if let Some(mock) = self.state.mock(BindingKind::Module, name) {
            return Container::mocked_module(name, mock);
        }

        let (module, _) = self.get_or_register(name, Vec::new());
        ModuleRef::Module(module)
    }

    /// Registers a module which inherits the bindings of the named modules.
    /// If a module mock has been registered under the name, the mock is
    /// returned instead.
    ///
    /// This always declares a new module: it fails with
    /// [`InjectError::DuplicateModule`] if a module is already registered
    /// under the name, even when `dependencies` is empty. Use
    /// [`module`](Container::module) to get an existing module.
    pub fn module_with(
        &self,
        name: &str,
        dependencies: &[&str],
    ) -> InjectResult<ModuleRef> {
        if let Some(mock) = self.state.mock(BindingKind::Module, name) {
            return Ok(Container::mocked_module(name, mock));
        }

        let dependencies = dependencies
            .iter()
            .map(|&dependency| dependency.to_owned())
            .collect();
        match self.get_or_register(name, dependencies) {
            (module, true) => Ok(ModuleRef::Module(module)),
            (_, false) => Err(InjectError::DuplicateModule {
                name: name.to_owned(),
            }),
        }
    }

    /// Gets the module registered under a name without registering it.
    /// Mocks are ignored.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<Module> {
        self.state.module_named(name)
    }

    /// Gets every registered module, in registration order.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        self.state
            .registry
            .with_inner(|registry| registry.modules.values().cloned().collect())
    }

    /// Merges every module with its dependencies and resolves every binding,
    /// unless that has already happened since the last module was
    /// registered.
    pub fn run(&self) -> &Self {
        self.state.ensure_resolved();
        self
    }

    /// Runs the resolution pass if needed, then invokes the callback. The
    /// callback is invoked even if the pass had already run.
    pub fn run_with<F: FnOnce()>(&self, callback: F) -> &Self {
        self.run();
        callback();
        self
    }

    /// Runs the tasks the container's scheduler is holding, returning how
    /// many ran. With the default [`TickQueue`](crate::TickQueue), this is
    /// what runs the deferred resolution pass.
    pub fn tick(&self) -> usize {
        self.state.scheduler.run_pending()
    }

    /// Whether the resolution pass has run since the last module was
    /// registered.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.registry.with_inner(|registry| {
            registry.resolution == ResolutionState::Resolved
        })
    }

    /// Replaces the module registered under a name with a mock, returning
    /// the mock.
    pub fn set_mock_module<T: Service>(&self, name: &str, module: T) -> Svc<T> {
        let module = Svc::new(module);
        self.state.set_mock(
            BindingKind::Module,
            name,
            Override::Instance(module.clone()),
        );
        module
    }

    /// Replaces every value bound under a name, in every module, with a
    /// mock, returning the mock.
    pub fn set_mock_value<T: Service>(&self, name: &str, value: T) -> Svc<T> {
        let value = Svc::new(value);
        self.state.set_mock(
            BindingKind::Value,
            name,
            Override::Instance(value.clone()),
        );
        value
    }

    /// Replaces every service bound under a name, in every module, with a
    /// mock. The mock is constructed once, now, and returned.
    pub fn set_mock_service<F, R>(&self, name: &str, constructor: F) -> Svc<R>
    where
        F: FnOnce() -> R,
        R: Service,
    {
        let service = Svc::new(constructor());
        self.state.set_mock(
            BindingKind::Service,
            name,
            Override::Instance(service.clone()),
        );
        service
    }

    /// Replaces every factory bound under a name, in every module, with a
    /// mock. The constructor is invoked again on each read of the factory;
    /// the instance returned here is the first of those.
    pub fn set_mock_factory<F, R>(&self, name: &str, constructor: F) -> Svc<R>
    where
        F: Service + Fn() -> R,
        R: Service,
    {
        let instance = Svc::new(constructor());
        self.state.set_mock(
            BindingKind::Factory,
            name,
            Override::Factory(Svc::new(constructor)),
        );
        instance
    }

    /// Whether a mock is registered for a binding.
    #[must_use]
    pub fn has_mock(&self, kind: BindingKind, name: &str) -> bool {
        self.state
            .overrides
            .with_inner(|overrides| overrides.get(kind, name).is_some())
    }

    /// Removes the mock registered for a binding, returning whether there was
    /// one. Values and services that were resolved before the mock was
    /// registered are handed out again.
    pub fn remove_mock(&self, kind: BindingKind, name: &str) -> bool {
        self.state
            .overrides
            .with_inner_mut(|overrides| overrides.remove(kind, name))
    }

    /// Removes every mock.
    pub fn clear_mocks(&self) {
        debug!("clearing mocks");
        self.state.overrides.with_inner_mut(OverrideMap::clear);
    }

    fn mocked_module(name: &str, instance: DynSvc) -> ModuleRef {
        ModuleRef::Mock {
            name: name.to_owned(),
            instance,
        }
    }

    /// Gets the module registered under a name, or registers a new one and
    /// schedules a resolution pass. Returns whether the module was created.
    fn get_or_register(
        &self,
        name: &str,
        dependencies: Vec<String>,
    ) -> (Module, bool) {
        let weak = Svc::downgrade(&self.state);
        let (module, created) =
            self.state.registry.with_inner_mut(|registry| {
                if let Some(module) = registry.modules.get(name) {
                    return (module.clone(), false);
                }

                let module = Module::new(name, dependencies, weak);
                registry.modules.insert(name, module.clone());
                registry.resolution = ResolutionState::Pending;
                (module, true)
            });
        if !created {
            return (module, false);
        }

        debug!(
            "registered module {} with dependencies {:?}",
            name,
            module.dependencies()
        );
        let weak = Svc::downgrade(&self.state);
        self.state.scheduler.schedule(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.ensure_resolved();
            }
        }));

        (module, true)
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let modules = self.state.registry.with_inner(|registry| {
            registry.modules.names().map(str::to_owned).collect::<Vec<_>>()
        });
        f.debug_struct("Container")
            .field("modules", &modules)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{constant, BindingKind, Container, InjectError, Svc, Task};
    use std::sync::{Arc, Mutex};

    #[test]
    fn registering_module_marks_container_pending() {
        let container = Container::new();
        assert!(container.is_resolved());

        container.module("module");
        assert!(!container.is_resolved());

        container.run();
        assert!(container.is_resolved());
    }

    #[test]
    fn reading_existing_module_does_not_reschedule() {
        let container = Container::new();
        let first = container.module("module").into_module().unwrap();
        assert_eq!(1, container.tick());

        let second = container.module("module").into_module().unwrap();
        assert!(first.ptr_eq(&second));
        assert!(container.is_resolved());
        assert_eq!(0, container.tick());
    }

    #[test]
    fn module_with_rejects_existing_name() {
        let container = Container::new();
        container.module("module");

        for dependencies in [&[][..], &["other"][..]] {
            match container.module_with("module", dependencies) {
                Err(InjectError::DuplicateModule { name }) => {
                    assert_eq!("module", name);
                }
                Err(error) => Err(error).unwrap(),
                Ok(_) => panic!("a module was registered twice"),
            }
        }
    }

    #[test]
    fn mock_module_is_returned_verbatim() {
        struct FakeModule;

        let container = Container::new();
        let mock = container.set_mock_module("module", FakeModule);

        let module = container.module("module");
        assert!(module.is_mock());
        assert!(Svc::ptr_eq(&mock, &module.mock::<FakeModule>().unwrap()));
        assert!(container.module_with("module", &["other"]).unwrap().is_mock());
        assert!(container.get_module("module").is_none());
        match module.into_module() {
            Err(InjectError::MockedModule { name }) => assert_eq!("module", name),
            Err(error) => Err(error).unwrap(),
            Ok(_) => panic!("a mocked module was unwrapped"),
        }
    }

    #[test]
    fn removing_mock_restores_binding() {
        let container = Container::new();
        let module = container.module("module").into_module().unwrap();
        module.value("PORT", constant(8080_u16));
        container.set_mock_value("PORT", 9999_u16);

        assert_eq!(9999, *module.get_value::<u16>("PORT").unwrap());
        assert!(container.has_mock(BindingKind::Value, "PORT"));
        assert!(container.remove_mock(BindingKind::Value, "PORT"));
        assert_eq!(8080, *module.get_value::<u16>("PORT").unwrap());

        container.set_mock_value("PORT", 1_u16);
        container.clear_mocks();
        assert!(!container.has_mock(BindingKind::Value, "PORT"));
        assert_eq!(8080, *module.get_value::<u16>("PORT").unwrap());
    }

    #[test]
    fn deferred_pass_is_a_no_op_after_drop() {
        let deferred: Arc<Mutex<Vec<Task>>> = Arc::default();
        let mut builder = Container::builder();
        builder.with_scheduler({
            let deferred = deferred.clone();
            move |task: Task| deferred.lock().unwrap().push(task)
        });

        let container = builder.build();
        container.module("module");
        drop(container);

        let tasks = std::mem::take(&mut *deferred.lock().unwrap());
        assert_eq!(1, tasks.len());
        for task in tasks {
            task();
        }
    }
}
