use super::dependency_resolver::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum ApplicationErrorKind {
    #[error("Application container is not set. Call `set_container` first")]
    HandleNotSet,
    #[error("Application container is already set")]
    AlreadySet,
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
}
