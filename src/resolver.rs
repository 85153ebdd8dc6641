use alloc::sync::Arc;

use crate::{container::Container, errors::ResolveErrorKind, scope::Scope};

/// Resolution context handed to instantiators.
///
/// Dependencies of a singleton are resolved through [`Resolver::Container`], which can reach singletons only.
/// Dependencies of scoped and transient services are resolved through [`Resolver::Scope`],
/// so transient dependencies are tracked by the same scope as the outer resolution.
#[derive(Clone)]
pub enum Resolver {
    Container(Container),
    Scope(Scope),
}

impl Resolver {
    /// Resolves a dependency following its registered lifetime
    #[allow(clippy::missing_errors_doc)]
    pub fn get<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        match self {
            Resolver::Container(container) => container.get_singleton(),
            Resolver::Scope(scope) => scope.get(),
        }
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        match self {
            Resolver::Container(container) => container,
            Resolver::Scope(scope) => scope.container(),
        }
    }
}
