//! Azure Resource Manager client.
//!
//! Talks to the App Service REST API (`Microsoft.Web/sites`) over `reqwest`.
//! Token acquisition is out of scope: the client is handed a bearer token.
//!
//! # Configuration
//!
//! - `access_token`: ARM bearer token (falls back to `AZURE_ACCESS_TOKEN`)
//! - `api_version`: `Microsoft.Web` API version (default `2022-03-01`)
//! - `base_url`: management endpoint override; defaults to the account's cloud
//!
//! # Example
//!
//! ```
//! use azwebapp::{AccountCredentials, ClientType, Config};
//!
//! let account = AccountCredentials {
//!     subscription_number: "dad814cf-1c1e-4953-b950-c373a821c34f".to_string(),
//!     ..Default::default()
//! };
//! let config = Config::new(ClientType::ResourceManager)
//!     .with_account(account)
//!     .with_option("access_token", "eyJ0eXAi...");
//! ```

mod backend;
mod types;

pub use backend::ArmBackend;

use crate::factory;

/// Registers the Resource Manager client with the factory.
pub fn register() {
    factory::register_client("arm", |config| Ok(Box::new(ArmBackend::new(config))));
}
