//! Client factory and registration system.

use crate::{AzWebAppError, Config, Result, WebAppClient};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Factory function type for creating clients.
pub type ClientFactory = fn(Config) -> Result<Box<dyn WebAppClient>>;

static CLIENT_REGISTRY: OnceLock<RwLock<HashMap<String, ClientFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, ClientFactory>> {
    CLIENT_REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a client factory function.
///
/// This is typically called from client modules' `register()` functions
/// during library initialization.
///
/// # Example
///
/// ```no_run
/// use azwebapp::factory::register_client;
/// use azwebapp::{Config, Result, WebAppClient};
///
/// fn my_client_factory(config: Config) -> Result<Box<dyn WebAppClient>> {
///     // Create and return client instance
///     # unimplemented!()
/// }
///
/// pub fn register() {
///     register_client("myclient", my_client_factory);
/// }
/// ```
pub fn register_client(client_type: &str, factory: ClientFactory) {
    let mut reg = registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    reg.insert(client_type.to_string(), factory);
}

/// Creates a new client from configuration.
///
/// The appropriate client factory is looked up based on `config.client`.
/// If the client is not registered, an error is returned with a hint to
/// check feature flags.
///
/// # Errors
///
/// Returns an error if:
/// - Client type is not registered (missing feature flag or `init()` call)
/// - Client factory returns an error during construction
///
/// # Example
///
/// ```no_run
/// use azwebapp::{factory, ClientType, Config};
///
/// fn main() -> azwebapp::Result<()> {
///     azwebapp::init();
///     let client = factory::new_client(Config::new(ClientType::Mock))?;
///     Ok(())
/// }
/// ```
pub fn new_client(config: Config) -> Result<Box<dyn WebAppClient>> {
    let client_name = config.client.to_string();

    let factory = {
        let reg = registry()
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *reg.get(&client_name).ok_or_else(|| {
            AzWebAppError::Other(anyhow::anyhow!(
                "unknown client: {} (did you enable the '{}' feature flag?)",
                client_name,
                client_name
            ))
        })?
    };

    factory(config)
}
