use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum RegistryErrorKind {
    #[error("Service {type_info} is already registered")]
    DuplicateRegistration { type_info: TypeInfo },
}
