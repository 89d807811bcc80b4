//! Azwebapp - Azure App Service web apps as deployment targets.
//!
//! Azwebapp discovers web apps and slots whose tags place them in a
//! deployment's environment and roles, reconciles app settings and connection
//! strings onto a live site, and resolves the endpoint of a discovered target.
//! All remote access goes through the [`WebAppClient`] trait, so every
//! behaviour runs against the in-memory mock as well as Azure itself.
//!
//! # Features
//!
//! - **Target discovery**: Tag matching over apps and slots, announced as
//!   base64-encoded service messages
//! - **Settings reconciliation**: Merges that leave unmentioned settings alone
//!   and track slot-sticky names
//! - **Endpoint resolution**: Account and worker pool lookups with strict
//!   fallback precedence
//! - **Async/Await**: Built on tokio for non-blocking I/O
//! - **Feature Flags**: Optional client compilation to minimize dependencies
//!
//! # Quick Start
//!
//! ```no_run
//! use azwebapp::discovery::discover_targets;
//! use azwebapp::log::ConsoleLog;
//! use azwebapp::{ClientType, Config, Variables};
//!
//! #[tokio::main]
//! async fn main() -> azwebapp::Result<()> {
//!     azwebapp::init();
//!
//!     let variables = Variables::load("variables.json").await?;
//!     let config = Config::new(ClientType::ResourceManager)
//!         .with_option("access_token", std::env::var("AZURE_ACCESS_TOKEN").unwrap_or_default());
//!
//!     let targets = discover_targets(&variables, config, &ConsoleLog::new()).await?;
//!     println!("Discovered {} targets", targets.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Supported Clients
//!
//! | Client | Feature Flag | Notes |
//! |--------|-------------|-------|
//! | Mock | `mock` (default) | In-memory client with error injection |
//! | Azure Resource Manager | `arm` | REST over `reqwest`, bearer token supplied by the caller |
//!
//! # Feature Flags
//!
//! ```toml
//! [dependencies]
//! azwebapp = { version = "0.1", features = ["arm"] }
//! ```

pub mod account;
pub mod backends;
pub mod client;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod health;
pub mod log;
pub mod models;
pub mod service_message;
pub mod settings;
pub mod template;
pub mod validation;
pub mod variables;

pub use account::{AccountCredentials, AzureCloud};
pub use client::WebAppClient;
pub use config::{ClientType, Config};
pub use endpoint::AzureWebAppEndpoint;
pub use error::{AzWebAppError, Result};
pub use models::{
    AppSetting, AppSettingEntry, ConnectionStringSetting, ConnectionStringType,
    ConnectionStringValue, RemoteSettingsSnapshot, TargetSite, WebAppResource,
};
pub use service_message::ServiceMessage;
pub use variables::Variables;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the azwebapp library.
///
/// This registers all compiled clients with the factory. It is idempotent
/// and must run before [`factory::new_client`].
pub fn init() {
    INIT.call_once(backends::register_all);
}
