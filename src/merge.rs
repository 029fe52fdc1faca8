use crate::{Module, ModuleDependency, OrderedMap, SharedEx};
use log::error;

/// Merges every registered module with the modules it depends on, in
/// registration order. Modules that were merged by an earlier pass are
/// skipped.
pub(crate) fn merge_all(modules: &OrderedMap<Module>) {
    for module in modules.values() {
        merge_module(module, modules);
    }
}

/// Fills a module with the bindings of each module it depends on, without
/// replacing any binding the module already has. Dependencies are merged
/// first, so bindings are inherited transitively.
fn merge_module(module: &Module, modules: &OrderedMap<Module>) {
    let pending = module.state().with_inner_mut(|state| {
        if state.dependencies_initialized {
            return None;
        }

        state.dependencies_initialized = true;
        Some(state.dependencies.clone())
    });
    let pending = match pending {
        Some(pending) => pending,
        None => return,
    };

    let resolved = pending
        .into_iter()
        .map(|dependency| {
            let name = match dependency {
                ModuleDependency::Pending(name) => name,
                resolved => return resolved,
            };

            match modules.get(&name) {
                Some(dependency) => {
                    merge_module(dependency, modules);
                    module.inherit_from(dependency);
                    ModuleDependency::Resolved(dependency.clone())
                }
                None => {
                    error!(
                        "Unable to resolve dependency {} for module {}",
                        name,
                        module.name()
                    );
                    ModuleDependency::Unresolved(name)
                }
            }
        })
        .collect();

    module
        .state()
        .with_inner_mut(|state| state.dependencies = resolved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constant, Container, Svc};

    fn modules(container: &Container) -> OrderedMap<Module> {
        let mut modules = OrderedMap::default();
        for module in container.modules() {
            let name = module.name().to_owned();
            modules.insert(&name, module);
        }
        modules
    }

    #[test]
    fn own_bindings_are_never_overwritten() {
        let container = Container::new();
        let base = container.module_with("base", &[]).unwrap().into_module().unwrap();
        let app = container
            .module_with("app", &["base"])
            .unwrap()
            .into_module()
            .unwrap();
        app.value("name", constant("app"));
        base.value("name", constant("base"))
            .value("inherited", constant("base"));

        merge_all(&modules(&container));

        assert_eq!("app", *app.get_value::<&str>("name").unwrap());
        assert_eq!("base", *app.get_value::<&str>("inherited").unwrap());
    }

    #[test]
    fn bindings_are_inherited_transitively() {
        let container = Container::new();
        let a = container.module("a").into_module().unwrap();
        let b = container.module_with("b", &["a"]).unwrap().into_module().unwrap();
        let c = container.module_with("c", &["b"]).unwrap().into_module().unwrap();
        a.value("depth", constant(0_u8));

        merge_all(&modules(&container));

        assert!(b.has_value("depth"));
        assert!(c.has_value("depth"));
        let from_a: Svc<u8> = a.get_value("depth").unwrap();
        let from_c: Svc<u8> = c.get_value("depth").unwrap();
        assert!(Svc::ptr_eq(&from_a, &from_c));
    }

    #[test]
    fn missing_dependency_is_left_unresolved() {
        let container = Container::new();
        let module = container
            .module_with("module", &["missing"])
            .unwrap()
            .into_module()
            .unwrap();

        merge_all(&modules(&container));

        match module.dependencies().as_slice() {
            [ModuleDependency::Unresolved(name)] => assert_eq!("missing", name),
            dependencies => panic!("unexpected dependencies: {:?}", dependencies),
        }
    }

    #[test]
    fn merging_twice_is_a_no_op() {
        let container = Container::new();
        let base = container.module("base").into_module().unwrap();
        let app = container.module_with("app", &["base"]).unwrap().into_module().unwrap();
        base.value("first", constant(1_i32));

        let modules = modules(&container);
        merge_all(&modules);
        base.value("second", constant(2_i32));
        merge_all(&modules);

        assert!(app.has_value("first"));
        assert!(!app.has_value("second"));
    }
}
