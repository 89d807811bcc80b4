//! Client trait for the App Service management API.
//!
//! This module defines the [`WebAppClient`] trait: the read/write handle that
//! discovery, settings reconciliation, and health checks drive. Everything
//! behind it (authentication, HTTP, retries) belongs to the implementation.

use crate::{
    AppSettingEntry, ConnectionStringValue, Result, TargetSite, WebAppResource,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// WebAppClient lists web apps and reads/writes their configuration.
///
/// All implementations must be `Send + Sync` to support use across async
/// tasks. Callers await each call before issuing the next; no client method
/// is expected to be invoked concurrently for the same site.
///
/// # Implementations
///
/// - **REST**: Azure Resource Manager (`arm` feature)
/// - **Testing**: Mock client with error injection (`mock` feature)
///
/// # Example
///
/// ```no_run
/// use azwebapp::{ClientType, Config, TargetSite, WebAppClient};
///
/// #[tokio::main]
/// async fn main() -> azwebapp::Result<()> {
///     azwebapp::init();
///     let mut client = azwebapp::factory::new_client(Config::new(ClientType::Mock))?;
///     client.init().await?;
///
///     for app in client.list_web_apps("my-rg").await? {
///         println!("{}", app.name);
///     }
///
///     let site = TargetSite::new("my-rg", "my-app", None);
///     let settings = client.get_app_settings(&site).await?;
///     println!("{} settings", settings.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait WebAppClient: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the client name (e.g., "arm", "mock").
    fn name(&self) -> &str;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initializes the client.
    ///
    /// For REST clients this validates configuration and builds the HTTP
    /// client.
    ///
    /// # Errors
    ///
    /// - [`AzWebAppError::NotAuthenticated`](crate::AzWebAppError::NotAuthenticated):
    ///   no credentials are available
    async fn init(&mut self) -> Result<()>;

    /// Closes the client and releases resources.
    async fn close(&mut self) -> Result<()>;

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Lists the web apps in a resource group, in the order the service
    /// returns them.
    ///
    /// # Errors
    ///
    /// - [`AzWebAppError::NotFound`](crate::AzWebAppError::NotFound):
    ///   resource group does not exist
    async fn list_web_apps(&self, resource_group: &str) -> Result<Vec<WebAppResource>>;

    /// Lists the deployment slots of a web app.
    ///
    /// Slot resources carry their own tags and their short name (no `app/`
    /// prefix).
    async fn list_slots(&self, resource_group: &str, web_app: &str)
        -> Result<Vec<WebAppResource>>;

    /// Gets one web app, or `None` if it does not exist.
    async fn get_web_app(
        &self,
        resource_group: &str,
        web_app: &str,
    ) -> Result<Option<WebAppResource>>;

    // ========================================================================
    // App settings
    // ========================================================================

    /// Reads the site's app settings with their slot-sticky flags.
    async fn get_app_settings(&self, site: &TargetSite) -> Result<Vec<AppSettingEntry>>;

    /// Replaces the site's app settings with `properties`.
    async fn put_app_settings(
        &mut self,
        site: &TargetSite,
        properties: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Replaces the list of slot-sticky app setting names.
    async fn put_slot_settings_list(
        &mut self,
        site: &TargetSite,
        names: &BTreeSet<String>,
    ) -> Result<()>;

    // ========================================================================
    // Connection strings
    // ========================================================================

    /// Reads the site's connection strings.
    async fn get_connection_strings(
        &self,
        site: &TargetSite,
    ) -> Result<BTreeMap<String, ConnectionStringValue>>;

    /// Replaces the site's connection strings with `connection_strings`.
    async fn put_connection_strings(
        &mut self,
        site: &TargetSite,
        connection_strings: &BTreeMap<String, ConnectionStringValue>,
    ) -> Result<()>;
}
