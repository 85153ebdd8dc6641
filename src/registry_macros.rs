/// Builds a [`crate::Registry`] grouped by lifetime.
///
/// Returns `Result<Registry, RegistryErrorKind>`, the first duplicate registration stops the building.
///
/// # Syntax
/// ```text
/// registry! {
///     Lifetime [
///         provide(instantiator),
///         provide(instantiator, finalizer = finalizer),
///     ],
///     ...
/// }
/// ```
///
/// # Examples
/// ```rust
/// use static_provider::{registry, instance, Container, Inject};
/// use std::sync::Arc;
///
/// #[derive(Clone)]
/// struct Config;
/// struct Session(Arc<Config>);
///
/// let registry = registry! {
///     Singleton [
///         provide(instance(Config)),
///     ],
///     Scoped [
///         provide(|Inject(config): Inject<Config>| Ok(Session(config)), finalizer = |_: Arc<Session>| {}),
///     ],
/// }
/// .unwrap();
///
/// let container = Container::new(registry);
/// let scope = container.enter();
/// let _session = scope.get::<Session>().unwrap();
/// ```
#[macro_export]
macro_rules! registry {
    (
        $(
            $lifetime:ident [ $( provide( $($entry:tt)+ ) ),* $(,)? ]
        ),* $(,)?
    ) => {{
        ::core::result::Result::<$crate::Registry, $crate::RegistryErrorKind>::Ok($crate::Registry::new())
        $(
            $(
                .and_then(|registry| $crate::registry_internal! { @entry registry, $lifetime, $($entry)+ })
            )*
        )*
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! registry_internal {
    // Example: registry_internal! { @entry registry, Scoped, inst_a }
    (@entry $registry:ident, $lifetime:ident, $inst:expr $(,)?) => {
        $registry.provide($inst, $crate::Lifetime::$lifetime)
    };

    // Example: registry_internal! { @entry registry, Scoped, inst_b, finalizer = fin_b }
    (@entry $registry:ident, $lifetime:ident, $inst:expr, finalizer = $fin:expr $(,)?) => {
        $registry.provide_with_finalizer($inst, $fin, $crate::Lifetime::$lifetime)
    };
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

    use crate::{instance, Container, Inject, InstantiatorResult, Lifetime, RegistryErrorKind};

    #[derive(Clone)]
    struct Config;
    struct Session(#[allow(dead_code)] Arc<Config>);
    struct Connection;

    fn connection() -> InstantiatorResult<Connection> {
        Ok(Connection)
    }

    #[test]
    #[traced_test]
    fn test_registry_macro() {
        let finalizer_call_count = Arc::new(AtomicU8::new(0));

        let registry = registry! {
            Singleton [
                provide(instance(Config)),
            ],
            Scoped [
                provide(
                    |Inject(config): Inject<Config>| Ok(Session(config)),
                    finalizer = {
                        let finalizer_call_count = finalizer_call_count.clone();
                        move |_: Arc<Session>| {
                            finalizer_call_count.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                ),
            ],
            Transient [
                provide(connection),
            ],
        }
        .unwrap();

        assert_eq!(registry.lifetime_of::<Config>(), Some(Lifetime::Singleton));
        assert_eq!(registry.lifetime_of::<Session>(), Some(Lifetime::Scoped));
        assert_eq!(registry.lifetime_of::<Connection>(), Some(Lifetime::Transient));

        let container = Container::new(registry);
        {
            let scope = container.enter();
            let _ = scope.get::<Session>().unwrap();
            let _ = scope.get::<Connection>().unwrap();
        }

        assert_eq!(finalizer_call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_registry_macro_duplicate() {
        let result = registry! {
            Singleton [
                provide(connection),
            ],
            Transient [
                provide(connection),
            ],
        };

        assert!(matches!(result, Err(RegistryErrorKind::DuplicateRegistration { .. })));
    }
}
