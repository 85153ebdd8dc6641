//! Sample services, one per lifetime plus a composite one.
//!
//! Each service logs when it's initialized, when it makes a sound and when it's released,
//! so the lifetime rules can be followed in the logs.

use alloc::{format, string::String, sync::Arc};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

use crate::{
    errors::RegistryErrorKind,
    finalizer::Release,
    inject::Inject,
    lifetime::Lifetime::{Scoped, Singleton, Transient},
    registry::Registry,
};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

pub trait Sound {
    fn name(&self) -> &'static str;

    fn make_sound(&self) -> String {
        let sound = format!("{}: Wuff", self.name());
        info!("{}", sound);
        sound
    }
}

/// State shared by the sample services: a process-unique instance id and the released flag
struct InstanceState {
    id: u64,
    released: AtomicBool,
}

impl InstanceState {
    fn new(name: &'static str) -> Self {
        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        info!(instance = id, "{}: initialized", name);
        Self {
            id,
            released: AtomicBool::new(false),
        }
    }

    fn release(&self, name: &'static str) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(instance = self.id, "{}: Released", name);
    }
}

macro_rules! sample_service {
    ($($name:ident),+) => {
        $(
            pub struct $name {
                state: InstanceState,
            }

            impl $name {
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        state: InstanceState::new(stringify!($name)),
                    }
                }

                #[inline]
                #[must_use]
                pub fn id(&self) -> u64 {
                    self.state.id
                }

                #[inline]
                #[must_use]
                pub fn is_released(&self) -> bool {
                    self.state.released.load(Ordering::SeqCst)
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl Sound for $name {
                #[inline]
                fn name(&self) -> &'static str {
                    stringify!($name)
                }
            }

            impl Release for $name {
                fn release(&self) {
                    self.state.release(stringify!($name));
                }
            }
        )+
    };
}

sample_service!(SingletonService, ScopedService, TransientService);

/// Composite service, makes its own sound and then the sounds of its dependencies
pub struct NestedService {
    state: InstanceState,
    singleton: Arc<SingletonService>,
    scoped: Arc<ScopedService>,
    transient: Arc<TransientService>,
}

impl NestedService {
    #[must_use]
    pub fn new(singleton: Arc<SingletonService>, scoped: Arc<ScopedService>, transient: Arc<TransientService>) -> Self {
        Self {
            state: InstanceState::new("NestedService"),
            singleton,
            scoped,
            transient,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.state.id
    }

    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state.released.load(Ordering::SeqCst)
    }

    #[inline]
    #[must_use]
    pub fn singleton(&self) -> &Arc<SingletonService> {
        &self.singleton
    }

    #[inline]
    #[must_use]
    pub fn scoped(&self) -> &Arc<ScopedService> {
        &self.scoped
    }

    #[inline]
    #[must_use]
    pub fn transient(&self) -> &Arc<TransientService> {
        &self.transient
    }
}

impl Sound for NestedService {
    #[inline]
    fn name(&self) -> &'static str {
        "NestedService"
    }

    fn make_sound(&self) -> String {
        let sound = format!("{}: Wuff", self.name());
        info!("{}", sound);

        let mut sounds = sound;
        for dependency_sound in [
            self.singleton.make_sound(),
            self.scoped.make_sound(),
            self.transient.make_sound(),
        ] {
            sounds.push('\n');
            sounds.push_str(&dependency_sound);
        }
        sounds
    }
}

impl Release for NestedService {
    fn release(&self) {
        self.state.release("NestedService");
    }
}

/// Registry of the sample services:
/// - [`SingletonService`] as [`crate::Lifetime::Singleton`]
/// - [`ScopedService`] and [`NestedService`] as [`crate::Lifetime::Scoped`]
/// - [`TransientService`] as [`crate::Lifetime::Transient`]
///
/// Scoped and transient services are released when their scope is closed.
///
/// # Errors
/// Never fails in practice, the error is kept to compose with other registrations
pub fn registry() -> Result<Registry, RegistryErrorKind> {
    Registry::new()
        .provide(|| Ok(SingletonService::new()), Singleton)?
        .provide_releasable(|| Ok(ScopedService::new()), Scoped)?
        .provide_releasable(|| Ok(TransientService::new()), Transient)?
        .provide_releasable(
            |Inject(singleton): Inject<SingletonService>, Inject(scoped): Inject<ScopedService>, Inject(transient): Inject<TransientService>| {
                Ok(NestedService::new(singleton, scoped, transient))
            },
            Scoped,
        )
}
