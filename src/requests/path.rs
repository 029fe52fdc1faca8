use crate::{BindingKind, InjectError, InjectResult};
use std::fmt::{Display, Formatter};

/// A binding that is currently being resolved.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct BindingKey {
    module: String,
    kind: BindingKind,
    name: String,
}

impl BindingKey {
    /// Creates a key for a binding in a module.
    #[must_use]
    pub fn new(module: &str, kind: BindingKind, name: &str) -> Self {
        BindingKey {
            module: module.to_owned(),
            kind,
            name: name.to_owned(),
        }
    }

    /// The module the binding is resolved in.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The kind of binding.
    #[must_use]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// The name of the binding.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for BindingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}({})", self.module, self.name, self.kind)
    }
}

/// The chain of bindings being resolved by an active request. Each nested
/// resolution extends the path, so a binding that shows up twice means the
/// request has come back around to itself.
#[derive(Clone, Debug, Default)]
pub struct ResolutionPath {
    bindings: Vec<BindingKey>,
}

impl ResolutionPath {
    /// Creates a new, empty path.
    #[must_use]
    pub fn new() -> Self {
        ResolutionPath::default()
    }

    /// Creates a child path with the given binding appended to the end. Fails
    /// if the binding is already being resolved further up the path.
    pub fn with_request(&self, binding: BindingKey) -> InjectResult<Self> {
        if let Some(start) = self.bindings.iter().position(|b| b == &binding) {
            let cycle = self.bindings[start..]
                .iter()
                .chain(std::iter::once(&binding))
                .map(ToString::to_string)
                .collect();
            return Err(InjectError::CycleDetected {
                name: binding.name,
                cycle,
            });
        }

        let mut child = self.clone();
        child.bindings.push(binding);
        Ok(child)
    }

    /// Gets the bindings of the current request, outermost first.
    #[must_use]
    pub fn bindings(&self) -> &[BindingKey] {
        &self.bindings
    }
}
