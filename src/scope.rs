use alloc::sync::Arc;
use core::{cell::RefCell, ops::Deref};
use parking_lot::ReentrantMutex;
use tracing::{debug, error, info_span};

use crate::{
    any::TypeInfo,
    cache::Resolved,
    container::{instantiate, Container, ResolveState, ResolvingGuard},
    errors::ResolveErrorKind,
    lifetime::Lifetime,
    registry::InstantiatorData,
    resolver::Resolver,
    service::Service as _,
};

/// Bounded resolution context with its own cache of scoped instances.
///
/// Cloning is cheap, clones share the same state.
/// The scope is closed by [`Self::close`], by dropping its last handle, or by dropping the [`ScopeGuard`] that owns it.
#[derive(Clone)]
pub struct Scope {
    pub(crate) inner: Arc<ScopeInner>,
}

impl Scope {
    #[inline]
    #[must_use]
    pub(crate) fn new(id: u64, container: Container) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id,
                container,
                state: ReentrantMutex::new(RefCell::new(ScopeState::default())),
            }),
        }
    }

    /// Gets a dependency following its registered lifetime:
    /// - [`Lifetime::Singleton`] is delegated to [`Container::get_singleton`]
    /// - [`Lifetime::Scoped`] is instantiated once per scope and cached
    /// - [`Lifetime::Transient`] is instantiated on every call
    ///
    /// Scoped and transient instances with a finalizer are tracked and released on [`Self::close`].
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::ScopeClosed`] if the scope is closed
    /// - Returns [`ResolveErrorKind::UnknownService`] if `Dep` isn't registered
    /// - Returns [`ResolveErrorKind::CyclicDependency`] if `Dep` depends on itself
    /// - Returns [`ResolveErrorKind::Instantiator`] if the instantiator or one of its dependencies fails
    pub fn get<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        let type_info = TypeInfo::of::<Dep>();
        let span = info_span!("get", dependency = type_info.short_name(), scope = self.inner.id);
        let _guard = span.enter();

        let state = self.inner.state.lock();
        if state.borrow().closed {
            return Err(self.closed_error());
        }

        let Some(InstantiatorData {
            instantiator,
            finalizer,
            lifetime,
        }) = self.inner.container.inner.registry.get(&type_info)
        else {
            let err = ResolveErrorKind::UnknownService { type_info };
            error!("{}", err);
            return Err(err);
        };

        match lifetime {
            Lifetime::Singleton => return self.inner.container.get_singleton(),
            Lifetime::Scoped => {
                if let Some(dependency) = state.borrow().resolve.cache.get(&type_info) {
                    debug!("Found in cache");
                    return Ok(dependency);
                }
                debug!("Not found in cache");
            }
            Lifetime::Transient => {}
        }

        let resolving = ResolvingGuard::enter(&*state, |state: &mut ScopeState| &mut state.resolve, type_info)?;
        let result = instantiate::<Dep>(instantiator, Resolver::Scope(self.clone()), type_info);
        drop(resolving);
        let dependency = result?;

        let mut guard = state.borrow_mut();
        if guard.closed {
            drop(guard);
            // Closed by the instantiator itself, nothing would release the instance
            return Err(self.closed_error());
        }
        if *lifetime == Lifetime::Scoped {
            guard.resolve.cache.insert_rc(type_info, dependency.clone());
            debug!("Cached");
        }
        if finalizer.is_some() {
            guard.resolve.cache.push_resolved(Resolved {
                type_info,
                dependency: dependency.clone(),
            });
            debug!("Pushed to resolved set");
        }

        Ok(dependency)
    }

    /// Closes the scope, calling finalizers of tracked instances in LIFO order of their creation.
    ///
    /// Only the first call has an effect, resolution from a closed scope fails with [`ResolveErrorKind::ScopeClosed`].
    pub fn close(&self) {
        self.inner.close();
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().borrow().closed
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    fn closed_error(&self) -> ResolveErrorKind {
        let err = ResolveErrorKind::ScopeClosed { scope_id: self.inner.id };
        error!("{}", err);
        err
    }
}

pub(crate) struct ScopeInner {
    id: u64,
    container: Container,
    state: ReentrantMutex<RefCell<ScopeState>>,
}

#[derive(Default)]
struct ScopeState {
    resolve: ResolveState,
    closed: bool,
}

impl ScopeInner {
    fn close(&self) {
        let state = self.state.lock();
        let mut resolved_set = {
            let mut inner = state.borrow_mut();
            if inner.closed {
                debug!(scope = self.id, "Scope already closed");
                return;
            }
            inner.closed = true;
            inner.resolve.cache.take_resolved_set()
        };

        while let Some(Resolved { type_info, dependency }) = resolved_set.pop_last() {
            let Some(InstantiatorData {
                finalizer: Some(finalizer), ..
            }) = self.container.inner.registry.get(&type_info)
            else {
                continue;
            };

            let _ = finalizer.clone().call(dependency);
            debug!(scope = self.id, dependency = type_info.short_name(), "Finalizer called");
        }

        state.borrow_mut().resolve.cache.clear();
        debug!(scope = self.id, "Scope closed");
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.close();
    }
}

/// Owner of an acquired scope.
///
/// Closes the scope when dropped, so the scope is released on every exit path of the block that holds the guard:
/// normal return, early return with `?` and panic unwinding.
#[must_use = "the scope is closed as soon as the guard is dropped"]
pub struct ScopeGuard {
    scope: Scope,
}

impl ScopeGuard {
    #[inline]
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl From<Scope> for ScopeGuard {
    #[inline]
    fn from(scope: Scope) -> Self {
        Self::new(scope)
    }
}

impl Deref for ScopeGuard {
    type Target = Scope;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scope.close();
    }
}
