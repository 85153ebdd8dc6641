use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{
    cell::RefCell,
    sync::atomic::{AtomicU64, Ordering},
};
use parking_lot::ReentrantMutex;
use tracing::{debug, error, info_span};

use super::cache::Cache;
use crate::{
    any::TypeInfo,
    errors::{InstantiatorErrorKind, ResolveErrorKind},
    instantiator::BoxedCloneInstantiator,
    lifetime::Lifetime,
    registry::{InstantiatorData, Registry},
    resolver::Resolver,
    scope::{Scope, ScopeGuard},
    service::Service as _,
};

/// Root of the resolution: owns the registry and the singleton store and creates scopes.
///
/// Cloning is cheap, all clones share the same singletons.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry,
                singletons: ReentrantMutex::new(RefCell::new(ResolveState::default())),
                next_scope_id: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a new scope bound to this container.
    ///
    /// # Warning
    /// The scope is closed when its last handle is dropped or [`Scope::close`] is called.
    /// Use [`Self::enter`] to get a guard that closes the scope on drop regardless of other handles.
    #[must_use]
    pub fn create_scope(&self) -> Scope {
        let id = self.inner.next_scope_id.fetch_add(1, Ordering::Relaxed);
        debug!(scope = id, "Scope created");
        Scope::new(id, self.clone())
    }

    /// Creates a new scope wrapped in a [`ScopeGuard`]
    #[inline]
    #[must_use]
    pub fn enter(&self) -> ScopeGuard {
        ScopeGuard::new(self.create_scope())
    }

    /// Gets a singleton from the container, instantiating it on the first call.
    ///
    /// Dependencies of the singleton are resolved with [`Resolver::Container`], so only singletons are reachable.
    /// Concurrent first calls are serialized: the instantiator is called at most once per container.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnknownService`] if `Dep` isn't registered
    /// - Returns [`ResolveErrorKind::LifetimeMismatch`] if `Dep` isn't registered as [`Lifetime::Singleton`]
    /// - Returns [`ResolveErrorKind::CyclicDependency`] if `Dep` depends on itself
    /// - Returns [`ResolveErrorKind::Instantiator`] if the instantiator or one of its dependencies fails
    pub fn get_singleton<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        let type_info = TypeInfo::of::<Dep>();
        let span = info_span!("get_singleton", dependency = type_info.short_name());
        let _guard = span.enter();

        let Some(InstantiatorData {
            instantiator, lifetime, ..
        }) = self.inner.registry.get(&type_info)
        else {
            let err = ResolveErrorKind::UnknownService { type_info };
            error!("{}", err);
            return Err(err);
        };
        if *lifetime != Lifetime::Singleton {
            let err = ResolveErrorKind::LifetimeMismatch {
                type_info,
                expected: Lifetime::Singleton,
                actual: *lifetime,
            };
            error!("{}", err);
            return Err(err);
        }

        let singletons = self.inner.singletons.lock();
        if let Some(dependency) = singletons.borrow().cache.get(&type_info) {
            debug!("Found in cache");
            return Ok(dependency);
        }
        debug!("Not found in cache");

        let resolving = ResolvingGuard::enter(&*singletons, |state: &mut ResolveState| state, type_info)?;
        let result = instantiate::<Dep>(instantiator, Resolver::Container(self.clone()), type_info);
        drop(resolving);
        let dependency = result?;

        singletons.borrow_mut().cache.insert_rc(type_info, dependency.clone());
        debug!("Cached");

        Ok(dependency)
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Count of scopes created by this container and its clones
    #[inline]
    #[must_use]
    pub fn scopes_created(&self) -> u64 {
        self.inner.next_scope_id.load(Ordering::Relaxed)
    }
}

pub(crate) struct ContainerInner {
    pub(crate) registry: Registry,
    singletons: ReentrantMutex<RefCell<ResolveState>>,
    next_scope_id: AtomicU64,
}

/// Cache with the stack of types being instantiated, shared by the container and scopes
#[derive(Default)]
pub(crate) struct ResolveState {
    pub(crate) cache: Cache,
    resolving: Vec<TypeInfo>,
}

impl ResolveState {
    /// Marks the type as being instantiated
    fn enter(&mut self, type_info: TypeInfo) -> Result<(), ResolveErrorKind> {
        if self.resolving.contains(&type_info) {
            let err = ResolveErrorKind::CyclicDependency { type_info };
            error!("{}", err);
            return Err(err);
        }
        self.resolving.push(type_info);
        Ok(())
    }

    fn leave(&mut self) {
        self.resolving.pop();
    }
}

/// Keeps a type on the resolution stack while its instantiator runs.
///
/// The type is popped on drop, so a panicking instantiator doesn't leave it behind.
pub(crate) struct ResolvingGuard<'a, T> {
    state: &'a RefCell<T>,
    project: fn(&mut T) -> &mut ResolveState,
}

impl<'a, T> ResolvingGuard<'a, T> {
    pub(crate) fn enter(
        state: &'a RefCell<T>,
        project: fn(&mut T) -> &mut ResolveState,
        type_info: TypeInfo,
    ) -> Result<Self, ResolveErrorKind> {
        project(&mut state.borrow_mut()).enter(type_info)?;
        Ok(Self { state, project })
    }
}

impl<T> Drop for ResolvingGuard<'_, T> {
    fn drop(&mut self) {
        // Borrows of outer frames are released before this guard while unwinding
        if let Ok(mut state) = self.state.try_borrow_mut() {
            (self.project)(&mut state).leave();
        }
    }
}

pub(crate) fn instantiate<Dep: Send + Sync + 'static>(
    instantiator: &BoxedCloneInstantiator,
    resolver: Resolver,
    type_info: TypeInfo,
) -> Result<Arc<Dep>, ResolveErrorKind> {
    match instantiator.clone().call(resolver) {
        Ok(dependency) => match dependency.downcast::<Dep>() {
            Ok(dependency) => Ok(Arc::new(*dependency)),
            Err(incorrect_type) => {
                let err = ResolveErrorKind::IncorrectType {
                    expected: type_info,
                    actual: (*incorrect_type).type_id(),
                };
                error!("{}", err);
                Err(err)
            }
        },
        Err(InstantiatorErrorKind::Deps(err)) => {
            error!("{}", err);
            Err(ResolveErrorKind::Instantiator(InstantiatorErrorKind::Deps(Box::new(err))))
        }
        Err(InstantiatorErrorKind::Factory(err)) => {
            error!("{}", err);
            Err(ResolveErrorKind::Instantiator(InstantiatorErrorKind::Factory(err)))
        }
    }
}
