use alloc::sync::Arc;

use crate::{dependency_resolver::DependencyResolver, errors::ResolveErrorKind, resolver::Resolver};

/// Instantiator argument resolved by the registered lifetime of `Dep`
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    fn resolve(resolver: &Resolver) -> Result<Self, Self::Error> {
        resolver.get().map(Self)
    }
}
