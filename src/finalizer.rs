use alloc::sync::Arc;
use tracing::error;

use crate::{
    any::{RcAny, TypeInfo},
    service::{service_fn, BoxCloneService},
};

/// Release hook called by a scope when it's closed.
///
/// Finalizers run in LIFO order of resolution (not the order of registration),
/// once per tracked instance.
pub trait Finalizer<Dep>: Clone + 'static {
    fn finalize(&mut self, dependency: Arc<Dep>);
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) + Clone + 'static,
{
    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) {
        self(dependency);
    }
}

/// Capability of a service that holds resources to be released when its scope is closed
pub trait Release {
    fn release(&self);
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<RcAny, (), ()>;

#[must_use]
pub(crate) fn boxed_finalizer<Dep, Fin>(mut finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep> + Send + Sync,
{
    BoxCloneService::new(service_fn(move |dependency: RcAny| -> Result<(), ()> {
        let Ok(dependency) = dependency.downcast::<Dep>() else {
            error!(dependency = TypeInfo::of::<Dep>().short_name(), "Incorrect finalizer dependency type");
            return Err(());
        };
        finalizer.finalize(dependency);
        Ok(())
    }))
}

/// Finalizer which forwards to [`Release::release`]
#[inline]
#[must_use]
pub(crate) fn release_finalizer<Dep>() -> impl Finalizer<Dep> + Send + Sync
where
    Dep: Release + Send + Sync + 'static,
{
    |dependency: Arc<Dep>| dependency.release()
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};

    use super::{boxed_finalizer, release_finalizer, Release};
    use crate::{any::RcAny, service::Service as _};

    struct Connection(AtomicU8);

    impl Release for Connection {
        fn release(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_finalizer() {
        let connection = Arc::new(Connection(AtomicU8::new(0)));
        let mut finalizer = boxed_finalizer(release_finalizer::<Connection>());

        finalizer.call(connection.clone() as RcAny).unwrap();

        assert_eq!(connection.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_incorrect_type() {
        let mut finalizer = boxed_finalizer(release_finalizer::<Connection>());

        assert!(finalizer.call(Arc::new(()) as RcAny).is_err());
    }
}
