#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod application;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod lifetime;
pub(crate) mod registry;
pub(crate) mod registry_macros;
pub(crate) mod resolver;
pub(crate) mod scope;
pub(crate) mod service;

pub mod services;

pub use any::TypeInfo;
pub use application::{acquire_required_service, acquire_scope, is_set, set_container, with_scope, ApplicationHandle};
pub use container::Container;
pub use dependency_resolver::DependencyResolver;
pub use errors::{
    ApplicationErrorKind, InstantiateErrorKind, InstantiatorErrorKind, InstantiatorResult, RegistryErrorKind, ResolveErrorKind,
};
pub use finalizer::{Finalizer, Release};
pub use inject::Inject;
pub use instantiator::{instance, Instantiator};
pub use lifetime::Lifetime;
pub use registry::Registry;
pub use resolver::Resolver;
pub use scope::{Scope, ScopeGuard};
