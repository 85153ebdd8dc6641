use alloc::boxed::Box;
use core::any::TypeId;

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::{any::TypeInfo, lifetime::Lifetime};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Service {type_info} isn't registered")]
    UnknownService { type_info: TypeInfo },
    #[error("Service {type_info} is registered as {actual}, but resolved as {expected}")]
    LifetimeMismatch {
        type_info: TypeInfo,
        expected: Lifetime,
        actual: Lifetime,
    },
    #[error("Scope {scope_id} is closed")]
    ScopeClosed { scope_id: u64 },
    #[error("Cyclic dependency detected while resolving {type_info}")]
    CyclicDependency { type_info: TypeInfo },
    #[error("Incorrect instantiator provides type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}
