//! Mock client for testing.
//!
//! This client provides a complete in-memory App Service with error
//! injection and call recording for testing code that uses azwebapp.

use crate::*;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock client for testing.
///
/// Stores all data in memory with support for error injection to simulate
/// failure conditions. Like App Service itself, slot-sticky setting names are
/// kept per web app and shared by all of its slots.
///
/// # Example
///
/// ```
/// use azwebapp::backends::mock::MockBackend;
/// use azwebapp::{AzWebAppError, TargetSite, WebAppClient, WebAppResource};
///
/// #[tokio::main]
/// async fn main() -> azwebapp::Result<()> {
///     let mut backend = MockBackend::new();
///     backend.init().await?;
///
///     // Pre-populate with test data
///     backend.add_web_app(WebAppResource::web_app("my-app", "my-rg")).await;
///
///     // Test error conditions
///     backend.get_error = Some(AzWebAppError::NotAuthenticated);
///
///     let site = TargetSite::new("my-rg", "my-app", None);
///     assert!(backend.get_app_settings(&site).await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct MockBackend {
    resources: Arc<RwLock<Vec<WebAppResource>>>,
    configs: Arc<RwLock<HashMap<TargetSite, SiteConfig>>>,
    sticky_names: Arc<RwLock<HashMap<(String, String), BTreeSet<String>>>>,
    calls: Arc<RwLock<Vec<String>>>,

    /// Error to return from `list_web_apps()`, `list_slots()`, and `get_web_app()`
    pub list_error: Option<AzWebAppError>,
    /// Error to return from `get_app_settings()` and `get_connection_strings()`
    pub get_error: Option<AzWebAppError>,
    /// Error to return from `put_app_settings()`
    pub put_settings_error: Option<AzWebAppError>,
    /// Error to return from `put_slot_settings_list()`
    pub put_slot_settings_error: Option<AzWebAppError>,
    /// Error to return from `put_connection_strings()`
    pub put_connection_strings_error: Option<AzWebAppError>,
    /// Error to return from `close()`
    pub close_error: Option<AzWebAppError>,
}

#[derive(Debug, Clone, Default)]
struct SiteConfig {
    app_settings: BTreeMap<String, String>,
    connection_strings: BTreeMap<String, ConnectionStringValue>,
}

impl MockBackend {
    /// Creates a new mock client with no web apps.
    pub fn new() -> Self {
        Self {
            resources: Arc::new(RwLock::new(Vec::new())),
            configs: Arc::new(RwLock::new(HashMap::new())),
            sticky_names: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            list_error: None,
            get_error: None,
            put_settings_error: None,
            put_slot_settings_error: None,
            put_connection_strings_error: None,
            close_error: None,
        }
    }

    /// Creates a mock client already holding `resources`.
    pub fn with_web_apps(resources: impl IntoIterator<Item = WebAppResource>) -> Self {
        let mut backend = Self::new();
        backend.resources = Arc::new(RwLock::new(resources.into_iter().collect()));
        backend
    }

    /// Pre-populates a web app or slot.
    ///
    /// Resources are listed back in the order they were added.
    pub async fn add_web_app(&self, resource: WebAppResource) {
        self.resources.write().await.push(resource);
    }

    /// Pre-populates an app setting.
    pub async fn set_app_setting(
        &self,
        site: &TargetSite,
        name: impl Into<String>,
        value: impl Into<String>,
        slot_sticky: bool,
    ) {
        let name = name.into();
        if slot_sticky {
            self.sticky_names
                .write()
                .await
                .entry(sticky_key(site))
                .or_default()
                .insert(name.clone());
        }
        self.configs
            .write()
            .await
            .entry(site.clone())
            .or_default()
            .app_settings
            .insert(name, value.into());
    }

    /// Pre-populates a connection string.
    pub async fn set_connection_string(
        &self,
        site: &TargetSite,
        name: impl Into<String>,
        value: impl Into<String>,
        connection_type: ConnectionStringType,
    ) {
        self.configs
            .write()
            .await
            .entry(site.clone())
            .or_default()
            .connection_strings
            .insert(
                name.into(),
                ConnectionStringValue {
                    value: value.into(),
                    connection_type,
                },
            );
    }

    /// Current app settings of a site.
    pub async fn app_settings(&self, site: &TargetSite) -> BTreeMap<String, String> {
        self.configs
            .read()
            .await
            .get(site)
            .map(|config| config.app_settings.clone())
            .unwrap_or_default()
    }

    /// Current slot-sticky names of the web app owning `site`.
    pub async fn slot_sticky_names(&self, site: &TargetSite) -> BTreeSet<String> {
        self.sticky_names
            .read()
            .await
            .get(&sticky_key(site))
            .cloned()
            .unwrap_or_default()
    }

    /// Current connection strings of a site.
    pub async fn connection_strings(
        &self,
        site: &TargetSite,
    ) -> BTreeMap<String, ConnectionStringValue> {
        self.configs
            .read()
            .await
            .get(site)
            .map(|config| config.connection_strings.clone())
            .unwrap_or_default()
    }

    /// Names of the client methods called so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    async fn record(&self, call: &str) {
        self.calls.write().await.push(call.to_string());
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn sticky_key(site: &TargetSite) -> (String, String) {
    (site.resource_group.clone(), site.site.clone())
}

fn injected(err: &Option<AzWebAppError>) -> Result<()> {
    match err {
        Some(err) => Err(AzWebAppError::Other(anyhow::anyhow!("{}", err))),
        None => Ok(()),
    }
}

#[async_trait]
impl WebAppClient for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        injected(&self.close_error)
    }

    async fn list_web_apps(&self, resource_group: &str) -> Result<Vec<WebAppResource>> {
        self.record("list_web_apps").await;
        injected(&self.list_error)?;

        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .filter(|r| !r.is_slot && r.resource_group == resource_group)
            .cloned()
            .collect())
    }

    async fn list_slots(
        &self,
        resource_group: &str,
        web_app: &str,
    ) -> Result<Vec<WebAppResource>> {
        self.record("list_slots").await;
        injected(&self.list_error)?;

        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .filter(|r| {
                r.is_slot
                    && r.resource_group == resource_group
                    && r.parent_name.as_deref() == Some(web_app)
            })
            .cloned()
            .collect())
    }

    async fn get_web_app(
        &self,
        resource_group: &str,
        web_app: &str,
    ) -> Result<Option<WebAppResource>> {
        self.record("get_web_app").await;
        injected(&self.list_error)?;

        let resources = self.resources.read().await;
        Ok(resources
            .iter()
            .find(|r| !r.is_slot && r.resource_group == resource_group && r.name == web_app)
            .cloned())
    }

    async fn get_app_settings(&self, site: &TargetSite) -> Result<Vec<AppSettingEntry>> {
        self.record("get_app_settings").await;
        injected(&self.get_error)?;

        let sticky = self.slot_sticky_names(site).await;
        Ok(self
            .app_settings(site)
            .await
            .into_iter()
            .map(|(name, value)| AppSettingEntry {
                is_slot_setting: sticky.contains(&name),
                name,
                value,
            })
            .collect())
    }

    async fn put_app_settings(
        &mut self,
        site: &TargetSite,
        properties: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.record("put_app_settings").await;
        injected(&self.put_settings_error)?;

        self.configs
            .write()
            .await
            .entry(site.clone())
            .or_default()
            .app_settings = properties.clone();
        Ok(())
    }

    async fn put_slot_settings_list(
        &mut self,
        site: &TargetSite,
        names: &BTreeSet<String>,
    ) -> Result<()> {
        self.record("put_slot_settings_list").await;
        injected(&self.put_slot_settings_error)?;

        self.sticky_names
            .write()
            .await
            .insert(sticky_key(site), names.clone());
        Ok(())
    }

    async fn get_connection_strings(
        &self,
        site: &TargetSite,
    ) -> Result<BTreeMap<String, ConnectionStringValue>> {
        self.record("get_connection_strings").await;
        injected(&self.get_error)?;

        Ok(self.connection_strings(site).await)
    }

    async fn put_connection_strings(
        &mut self,
        site: &TargetSite,
        connection_strings: &BTreeMap<String, ConnectionStringValue>,
    ) -> Result<()> {
        self.record("put_connection_strings").await;
        injected(&self.put_connection_strings_error)?;

        self.configs
            .write()
            .await
            .entry(site.clone())
            .or_default()
            .connection_strings = connection_strings.clone();
        Ok(())
    }
}

/// Registers the mock client with the factory.
pub fn register() {
    crate::factory::register_client("mock", |_cfg| Ok(Box::new(MockBackend::new())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> TargetSite {
        TargetSite::new("rg", "my-app", None)
    }

    #[tokio::test]
    async fn test_lists_apps_and_slots_in_insertion_order() {
        let backend = MockBackend::new();
        backend.add_web_app(WebAppResource::web_app("b", "rg")).await;
        backend.add_web_app(WebAppResource::web_app("a", "rg")).await;
        backend.add_web_app(WebAppResource::web_app("c", "other-rg")).await;
        backend.add_web_app(WebAppResource::slot("b", "blue", "rg")).await;

        let apps = backend.list_web_apps("rg").await.unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        let slots = backend.list_slots("rg", "b").await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].name, "blue");
        assert!(backend.list_slots("rg", "a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_web_app() {
        let backend = MockBackend::new();
        backend.add_web_app(WebAppResource::web_app("my-app", "rg")).await;

        assert!(backend.get_web_app("rg", "my-app").await.unwrap().is_some());
        assert!(backend.get_web_app("rg", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_app_settings_round_trip() {
        let mut backend = MockBackend::new();
        backend.set_app_setting(&site(), "X", "1", true).await;
        backend.set_app_setting(&site(), "Y", "2", false).await;

        let entries = backend.get_app_settings(&site()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.name == "X" && e.is_slot_setting));
        assert!(entries.iter().any(|e| e.name == "Y" && !e.is_slot_setting));

        let replacement = BTreeMap::from([("Z".to_string(), "3".to_string())]);
        backend.put_app_settings(&site(), &replacement).await.unwrap();
        assert_eq!(backend.app_settings(&site()).await, replacement);
    }

    #[tokio::test]
    async fn test_sticky_names_shared_by_slots() {
        let mut backend = MockBackend::new();
        let slot = TargetSite::new("rg", "my-app", Some("blue".to_string()));

        let names = BTreeSet::from(["X".to_string()]);
        backend.put_slot_settings_list(&slot, &names).await.unwrap();

        assert_eq!(backend.slot_sticky_names(&site()).await, names);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let mut backend = MockBackend::new();
        backend.put_slot_settings_error = Some(AzWebAppError::NotAuthenticated);

        let result = backend
            .put_slot_settings_list(&site(), &BTreeSet::new())
            .await;
        assert!(result.is_err());
        assert_eq!(backend.calls().await, vec!["put_slot_settings_list"]);
    }
}
