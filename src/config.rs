//! Configuration types for client initialization.

use crate::AccountCredentials;
use std::collections::HashMap;

/// Client type identifier.
///
/// Each variant corresponds to a [`WebAppClient`](crate::WebAppClient)
/// implementation. Clients must be enabled via Cargo feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientType {
    /// In-memory client for tests and dry runs
    Mock,
    /// Azure Resource Manager REST client
    ResourceManager,
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::ResourceManager => write!(f, "arm"),
        }
    }
}

/// Configuration for creating a client.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```no_run
/// use azwebapp::{AccountCredentials, ClientType, Config};
///
/// let config = Config::new(ClientType::ResourceManager)
///     .with_account(AccountCredentials::default())
///     .with_option("api_version", "2022-03-01");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Client type
    pub client: ClientType,

    /// Service principal the client acts as
    pub account: AccountCredentials,

    /// Client-specific options
    pub options: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientType::Mock,
            account: AccountCredentials::default(),
            options: HashMap::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration for the specified client.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::{ClientType, Config};
    ///
    /// let config = Config::new(ClientType::ResourceManager);
    /// assert_eq!(config.client, ClientType::ResourceManager);
    /// ```
    pub fn new(client: ClientType) -> Self {
        Self {
            client,
            ..Default::default()
        }
    }

    /// Sets the account the client authenticates as.
    pub fn with_account(mut self, account: AccountCredentials) -> Self {
        self.account = account;
        self
    }

    /// Adds a client-specific option.
    ///
    /// **Azure Resource Manager:**
    /// - `access_token`: bearer token (falls back to `AZURE_ACCESS_TOKEN`)
    /// - `api_version`: `Microsoft.Web` API version (default "2022-03-01")
    /// - `base_url`: management endpoint override (e.g. a local emulator)
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Gets a client-specific option value.
    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let account = AccountCredentials {
            subscription_number: "sub".to_string(),
            ..Default::default()
        };
        let config = Config::new(ClientType::ResourceManager)
            .with_account(account)
            .with_option("api_version", "2023-01-01");

        assert_eq!(config.client, ClientType::ResourceManager);
        assert_eq!(config.account.subscription_number, "sub");
        assert_eq!(
            config.get_option("api_version"),
            Some("2023-01-01")
        );
    }

    #[test]
    fn test_client_type_display() {
        assert_eq!(ClientType::Mock.to_string(), "mock");
        assert_eq!(ClientType::ResourceManager.to_string(), "arm");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.client, ClientType::Mock);
        assert!(config.options.is_empty());
    }
}
