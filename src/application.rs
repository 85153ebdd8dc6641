//! Process-wide access to the application container from code that isn't built by the container itself.
//!
//! The container is set once at startup with [`set_container`]. After that any code can acquire a scope
//! with [`acquire_scope`] or a single service with [`acquire_required_service`].
//! Both return a [`ScopeGuard`] which must be kept alive while the resolved services are used.

use alloc::sync::Arc;
use parking_lot::{const_rwlock, RwLock};
use tracing::{debug, error};

use crate::{container::Container, errors::ApplicationErrorKind, scope::ScopeGuard, Scope};

static APPLICATION: ApplicationHandle = ApplicationHandle::new();

/// Holder of at most one [`Container`], set exactly once
pub struct ApplicationHandle {
    container: RwLock<Option<Container>>,
}

impl Default for ApplicationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandle {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            container: const_rwlock(None),
        }
    }

    /// Sets the container from which services are resolved.
    /// It should be called once the container is fully built and before any resolution.
    ///
    /// # Errors
    /// Returns [`ApplicationErrorKind::AlreadySet`] if the container is already set, the set container is kept
    pub fn set_container(&self, container: Container) -> Result<(), ApplicationErrorKind> {
        let mut guard = self.container.write();
        if guard.is_some() {
            let err = ApplicationErrorKind::AlreadySet;
            error!("{}", err);
            return Err(err);
        }
        *guard = Some(container);
        debug!("Application container set");
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.container.read().is_some()
    }

    /// Creates a new scope of the application container.
    /// The returned guard closes the scope when dropped and releases the scoped and transient services.
    ///
    /// # Errors
    /// Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
    pub fn acquire_scope(&self) -> Result<ScopeGuard, ApplicationErrorKind> {
        let guard = self.container.read();
        let Some(container) = guard.as_ref() else {
            let err = ApplicationErrorKind::HandleNotSet;
            error!("{}", err);
            return Err(err);
        };
        Ok(container.enter())
    }

    /// Creates a new scope and resolves a single service from it.
    ///
    /// The service must not be used after the returned guard is dropped.
    /// If the resolution fails, the scope is closed before the error is returned.
    ///
    /// # Errors
    /// - Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
    /// - Returns [`ApplicationErrorKind::Resolve`] if the service can't be resolved
    pub fn acquire_required_service<Dep: Send + Sync + 'static>(&self) -> Result<(ScopeGuard, Arc<Dep>), ApplicationErrorKind> {
        let scope = self.acquire_scope()?;
        let service = scope.get::<Dep>()?;
        Ok((scope, service))
    }

    /// Runs `f` within a new scope and closes the scope afterwards
    ///
    /// # Errors
    /// Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
    pub fn with_scope<T>(&self, f: impl FnOnce(&Scope) -> T) -> Result<T, ApplicationErrorKind> {
        let scope = self.acquire_scope()?;
        Ok(f(&scope))
    }
}

/// Sets the process-wide application container, see [`ApplicationHandle::set_container`]
///
/// # Errors
/// Returns [`ApplicationErrorKind::AlreadySet`] if the container is already set
#[inline]
pub fn set_container(container: Container) -> Result<(), ApplicationErrorKind> {
    APPLICATION.set_container(container)
}

#[inline]
#[must_use]
pub fn is_set() -> bool {
    APPLICATION.is_set()
}

/// Creates a new scope of the process-wide application container, see [`ApplicationHandle::acquire_scope`]
///
/// # Errors
/// Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
#[inline]
pub fn acquire_scope() -> Result<ScopeGuard, ApplicationErrorKind> {
    APPLICATION.acquire_scope()
}

/// Resolves a single service from a new scope of the process-wide application container,
/// see [`ApplicationHandle::acquire_required_service`]
///
/// # Errors
/// - Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
/// - Returns [`ApplicationErrorKind::Resolve`] if the service can't be resolved
#[inline]
pub fn acquire_required_service<Dep: Send + Sync + 'static>() -> Result<(ScopeGuard, Arc<Dep>), ApplicationErrorKind> {
    APPLICATION.acquire_required_service()
}

/// Runs `f` within a new scope of the process-wide application container, see [`ApplicationHandle::with_scope`]
///
/// # Errors
/// Returns [`ApplicationErrorKind::HandleNotSet`] if the container isn't set
#[inline]
pub fn with_scope<T>(f: impl FnOnce(&Scope) -> T) -> Result<T, ApplicationErrorKind> {
    APPLICATION.with_scope(f)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    use super::ApplicationHandle;
    use crate::{errors::ResolveErrorKind, ApplicationErrorKind, Container, Lifetime::*, Registry};

    struct Session;

    fn container(finalizer_call_count: Arc<AtomicU8>) -> Container {
        Container::new(
            Registry::new()
                .provide_with_finalizer(
                    || Ok(Session),
                    move |_: Arc<Session>| {
                        finalizer_call_count.fetch_add(1, Ordering::SeqCst);
                    },
                    Scoped,
                )
                .unwrap(),
        )
    }

    #[test]
    #[traced_test]
    fn test_not_set() {
        let handle = ApplicationHandle::new();

        assert!(!handle.is_set());
        assert!(matches!(handle.acquire_scope(), Err(ApplicationErrorKind::HandleNotSet)));
        assert!(matches!(
            handle.acquire_required_service::<Session>(),
            Err(ApplicationErrorKind::HandleNotSet)
        ));
        assert!(matches!(handle.with_scope(|_| ()), Err(ApplicationErrorKind::HandleNotSet)));
    }

    #[test]
    #[traced_test]
    fn test_already_set() {
        let handle = ApplicationHandle::new();
        let first = container(Arc::default());

        handle.set_container(first.clone()).unwrap();
        assert!(matches!(
            handle.set_container(container(Arc::default())),
            Err(ApplicationErrorKind::AlreadySet)
        ));

        // The first container is kept
        let _ = handle.acquire_scope().unwrap();
        assert_eq!(first.scopes_created(), 1);
    }

    #[test]
    #[traced_test]
    fn test_acquire_scope() {
        let finalizer_call_count = Arc::new(AtomicU8::new(0));
        let handle = ApplicationHandle::default();
        handle.set_container(container(finalizer_call_count.clone())).unwrap();

        let scope = handle.acquire_scope().unwrap();
        let session_1 = scope.get::<Session>().unwrap();
        let session_2 = scope.get::<Session>().unwrap();
        assert!(Arc::ptr_eq(&session_1, &session_2));
        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 0);

        drop(scope);
        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_acquire_required_service() {
        let finalizer_call_count = Arc::new(AtomicU8::new(0));
        let handle = ApplicationHandle::new();
        handle.set_container(container(finalizer_call_count.clone())).unwrap();

        {
            let (scope, _session) = handle.acquire_required_service::<Session>().unwrap();
            assert!(!scope.is_closed());
        }
        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 1);

        assert!(matches!(
            handle.acquire_required_service::<u8>(),
            Err(ApplicationErrorKind::Resolve(ResolveErrorKind::UnknownService { .. }))
        ));
    }

    #[test]
    #[traced_test]
    fn test_with_scope_releases_on_early_return() {
        fn use_session(handle: &ApplicationHandle) -> Result<(), ApplicationErrorKind> {
            let scope = handle.acquire_scope()?;
            let _ = scope.get::<Session>()?;
            // Fails and returns early, the guard still closes the scope
            let _ = scope.get::<u8>()?;
            Ok(())
        }

        let finalizer_call_count = Arc::new(AtomicU8::new(0));
        let handle = ApplicationHandle::new();
        handle.set_container(container(finalizer_call_count.clone())).unwrap();

        assert!(use_session(&handle).is_err());
        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 1);

        let closed = handle
            .with_scope(|scope| {
                let _ = scope.get::<Session>().unwrap();
                scope.clone()
            })
            .unwrap();
        assert!(closed.is_closed());
        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 2);
    }
}
