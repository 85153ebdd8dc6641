use static_provider::{services, set_container, Container};
use std::error::Error;
use tracing_subscriber::EnvFilter;

// Static code can't take dependencies as arguments, so it acquires them from the application container
mod static_services {
    use static_provider::{
        acquire_required_service, acquire_scope,
        services::{NestedService, ScopedService, SingletonService, Sound as _, TransientService},
        ApplicationErrorKind,
    };
    use tracing::info;

    pub fn use_simple_services() -> Result<(), ApplicationErrorKind> {
        info!("Make sound with simple services");

        // A scope is used here, so we are able to get multiple services from it
        let scope = acquire_scope()?;
        scope.get::<SingletonService>()?.make_sound();
        scope.get::<ScopedService>()?.make_sound();
        scope.get::<TransientService>()?.make_sound();

        info!("Close scope");
        Ok(())
    }

    pub fn use_simple_services_multiple_times() -> Result<(), ApplicationErrorKind> {
        info!("Make multiple sounds with simple services");

        let scope = acquire_scope()?;
        for attempt in ["first", "second", "third"] {
            info!("Get services for the {attempt} time");

            let singleton = scope.get::<SingletonService>()?;
            let scoped = scope.get::<ScopedService>()?;
            let transient = scope.get::<TransientService>()?;

            singleton.make_sound();
            scoped.make_sound();
            transient.make_sound();
        }

        info!("Close scope");
        Ok(())
    }

    pub fn use_nested_services() -> Result<(), ApplicationErrorKind> {
        info!("Make sound with the nested service");

        // Only one service is needed, the guard keeps its scope open until the end of the function
        let (_scope, nested) = acquire_required_service::<NestedService>()?;
        nested.make_sound();

        info!("Close scope");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    set_container(Container::new(services::registry()?))?;

    static_services::use_simple_services()?;
    static_services::use_simple_services_multiple_times()?;
    static_services::use_nested_services()?;

    Ok(())
}
