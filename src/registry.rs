use alloc::collections::{btree_map::Entry, BTreeMap};
use tracing::{debug, error, warn};

use super::{
    errors::{InstantiateErrorKind, RegistryErrorKind},
    instantiator::BoxedCloneInstantiator,
};
use crate::{
    any::TypeInfo,
    dependency_resolver::DependencyResolver,
    finalizer::{boxed_finalizer, release_finalizer, BoxedCloneFinalizer, Finalizer, Release},
    instantiator::{boxed_instantiator, Instantiator},
    lifetime::Lifetime,
};

#[derive(Clone)]
pub(crate) struct InstantiatorData {
    pub(crate) instantiator: BoxedCloneInstantiator,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
    pub(crate) lifetime: Lifetime,
}

/// Service descriptors keyed by the provided type.
///
/// Filled once at startup and moved into [`crate::Container`], it can't be changed afterwards.
#[derive(Default, Clone)]
pub struct Registry {
    instantiators: BTreeMap<TypeInfo, InstantiatorData>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instantiators: BTreeMap::new(),
        }
    }

    /// Registers an instantiator of `Inst::Provides` with the lifetime.
    ///
    /// # Errors
    /// Returns [`RegistryErrorKind::DuplicateRegistration`] if the provided type is already registered
    #[inline]
    pub fn provide<Inst, Deps>(mut self, instantiator: Inst, lifetime: Lifetime) -> Result<Self, RegistryErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
    {
        self.add_instantiator::<Inst::Provides>(boxed_instantiator(instantiator), None, lifetime)?;
        Ok(self)
    }

    /// Registers an instantiator of `Inst::Provides` with a finalizer.
    /// The finalizer is called when the scope that resolved the instance is closed.
    ///
    /// # Warning
    /// Singletons aren't released by scopes, so the finalizer of a singleton is never called.
    ///
    /// # Errors
    /// Returns [`RegistryErrorKind::DuplicateRegistration`] if the provided type is already registered
    #[inline]
    pub fn provide_with_finalizer<Inst, Deps, Fin>(mut self, instantiator: Inst, finalizer: Fin, lifetime: Lifetime) -> Result<Self, RegistryErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver,
        Fin: Finalizer<Inst::Provides> + Send + Sync,
    {
        self.add_instantiator::<Inst::Provides>(boxed_instantiator(instantiator), Some(boxed_finalizer(finalizer)), lifetime)?;
        Ok(self)
    }

    /// Registers an instantiator of a [`Release`] service, [`Release::release`] is used as its finalizer.
    ///
    /// # Errors
    /// Returns [`RegistryErrorKind::DuplicateRegistration`] if the provided type is already registered
    #[inline]
    pub fn provide_releasable<Inst, Deps>(self, instantiator: Inst, lifetime: Lifetime) -> Result<Self, RegistryErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Release + Send + Sync,
        Deps: DependencyResolver,
    {
        self.provide_with_finalizer(instantiator, release_finalizer::<Inst::Provides>(), lifetime)
    }

    #[inline]
    #[must_use]
    pub fn contains<Dep: 'static>(&self) -> bool {
        self.instantiators.contains_key(&TypeInfo::of::<Dep>())
    }

    #[inline]
    #[must_use]
    pub fn lifetime_of<Dep: 'static>(&self) -> Option<Lifetime> {
        self.instantiators.get(&TypeInfo::of::<Dep>()).map(|data| data.lifetime)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instantiators.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instantiators.is_empty()
    }
}

impl Registry {
    pub(crate) fn add_instantiator<Dep: 'static>(
        &mut self,
        instantiator: BoxedCloneInstantiator,
        finalizer: Option<BoxedCloneFinalizer>,
        lifetime: Lifetime,
    ) -> Result<(), RegistryErrorKind> {
        let type_info = TypeInfo::of::<Dep>();

        match self.instantiators.entry(type_info) {
            Entry::Occupied(_) => {
                let err = RegistryErrorKind::DuplicateRegistration { type_info };
                error!("{}", err);
                Err(err)
            }
            Entry::Vacant(entry) => {
                if lifetime == Lifetime::Singleton && finalizer.is_some() {
                    warn!(dependency = type_info.short_name(), "Finalizer of singleton is never called");
                }
                debug!(dependency = type_info.short_name(), %lifetime, "Registered");

                entry.insert(InstantiatorData {
                    instantiator,
                    finalizer,
                    lifetime,
                });
                Ok(())
            }
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, type_info: &TypeInfo) -> Option<&InstantiatorData> {
        self.instantiators.get(type_info)
    }
}
