use super::errors::ResolveErrorKind;
use crate::resolver::Resolver;

/// Extracts an instantiator argument from the [`Resolver`] of the current resolution
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(resolver: &Resolver) -> Result<Self, Self::Error>;
}

impl DependencyResolver for Resolver {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(resolver: &Resolver) -> Result<Self, Self::Error> {
        Ok(resolver.clone())
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(resolver: &Resolver) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(resolver).map_err(Into::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
