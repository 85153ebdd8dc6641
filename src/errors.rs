mod application;
mod dependency_resolver;
mod instantiate;
mod instantiator;
mod registry;

pub use application::ApplicationErrorKind;
pub use dependency_resolver::ResolveErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use registry::RegistryErrorKind;

/// Result of a user instantiator
pub type InstantiatorResult<T, Err = InstantiateErrorKind> = Result<T, Err>;
