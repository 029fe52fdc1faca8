use crate::{
    Arguments, DynSvc, InjectError, InjectResult, Injectable, ResolutionPath,
};
use log::trace;

/// The bindings visible while resolving the dependencies of an
/// [`Injectable`]. A [`Module`](crate::Module) exposes its own (and inherited)
/// bindings through this trait.
pub trait Lookup {
    /// The name of the module dependencies are resolved for.
    fn module_name(&self) -> &str;

    /// Resolves a value binding, if one exists.
    fn find_value(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>>;

    /// Resolves a service binding, if one exists.
    fn find_service(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>>;

    /// Constructs a factory binding, if one exists.
    fn find_factory(
        &self,
        name: &str,
        path: &ResolutionPath,
    ) -> InjectResult<Option<DynSvc>>;

    /// Gets a module registered under a name, if one exists.
    fn find_module(&self, name: &str) -> Option<DynSvc>;
}

/// Resolves every dependency an [`Injectable`] declares, then constructs it.
///
/// Each dependency name is searched for among values, then services, then
/// factories, then modules; the first match wins. A match which is itself an
/// unconstructed [`Injectable`] is resolved first.
pub fn resolve_injectable(
    injectable: &Injectable,
    lookup: &dyn Lookup,
    path: &ResolutionPath,
) -> InjectResult<DynSvc> {
    let values = injectable
        .dependencies()
        .iter()
        .map(|dependency| find_injectable(dependency, lookup, path))
        .collect::<InjectResult<Vec<_>>>()?;

    let arguments = Arguments::new(
        lookup.module_name(),
        injectable.dependencies().to_vec(),
        values,
    );
    let construction = injectable.construct(&arguments)?;
    trace!(
        "constructed injectable in module {} ({:?})",
        lookup.module_name(),
        construction
    );
    Ok(construction.into_instance())
}

fn find_injectable(
    name: &str,
    lookup: &dyn Lookup,
    path: &ResolutionPath,
) -> InjectResult<DynSvc> {
    let found = match lookup.find_value(name, path)? {
        Some(found) => Some(found),
        None => match lookup.find_service(name, path)? {
            Some(found) => Some(found),
            None => match lookup.find_factory(name, path)? {
                Some(found) => Some(found),
                None => lookup.find_module(name),
            },
        },
    };

    let found = found.ok_or_else(|| InjectError::MissingDependency {
        module: lookup.module_name().to_owned(),
        dependency: name.to_owned(),
    })?;

    match (*found).downcast_ref::<Injectable>() {
        Some(nested) => resolve_injectable(nested, lookup, path),
        None => Ok(found),
    }
}
