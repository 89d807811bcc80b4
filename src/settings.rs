//! App settings and connection string reconciliation.
//!
//! Desired settings are merged into the site's current configuration so that
//! anything the deployment does not mention survives untouched. The merge
//! itself is pure ([`merge_app_settings`], [`merge_connection_strings`]);
//! [`SettingsReconciler`] wraps it with the read-then-write calls against a
//! [`WebAppClient`].
//!
//! # Write order
//!
//! 1. App setting values (one call)
//! 2. Slot-sticky names, only when the merged set is non-empty
//! 3. Connection strings (one call)
//!
//! A failure after step 1 leaves values updated but stickiness stale. Nothing
//! is rolled back; running again converges because the merge is idempotent.
//!
//! Runs assume exclusive access to the site. There is no concurrency token
//! between the read and the write.

use crate::log::Log;
use crate::variables::{keys, Variables};
use crate::{
    AppSetting, AzWebAppError, ConnectionStringSetting, ConnectionStringValue,
    RemoteSettingsSnapshot, Result, TargetSite, WebAppClient,
};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Merges desired app settings into the current state.
///
/// Desired values always win. A name that is currently sticky keeps its
/// stickiness unless a desired setting with that name clears it; desired
/// sticky settings are added.
///
/// # Example
///
/// ```
/// use azwebapp::settings::merge_app_settings;
/// use azwebapp::{AppSetting, RemoteSettingsSnapshot};
///
/// let mut current = RemoteSettingsSnapshot::default();
/// current.properties.insert("X".into(), "1".into());
/// current.properties.insert("Y".into(), "2".into());
/// current.slot_sticky_names.insert("X".into());
///
/// let merged = merge_app_settings(&current, &[AppSetting::new("X", "9", false)]);
///
/// assert_eq!(merged.properties["X"], "9");
/// assert_eq!(merged.properties["Y"], "2");
/// assert!(merged.slot_sticky_names.is_empty());
/// ```
pub fn merge_app_settings(
    current: &RemoteSettingsSnapshot,
    desired: &[AppSetting],
) -> RemoteSettingsSnapshot {
    let mut properties = current.properties.clone();
    for setting in desired {
        properties.insert(setting.name.clone(), setting.value.clone());
    }

    let demoted: BTreeSet<&str> = desired
        .iter()
        .filter(|s| !s.is_slot_setting)
        .map(|s| s.name.as_str())
        .collect();

    let mut slot_sticky_names: BTreeSet<String> = current
        .slot_sticky_names
        .iter()
        .filter(|name| !demoted.contains(name.as_str()))
        .cloned()
        .collect();
    slot_sticky_names.extend(
        desired
            .iter()
            .filter(|s| s.is_slot_setting)
            .map(|s| s.name.clone()),
    );

    RemoteSettingsSnapshot {
        properties,
        slot_sticky_names,
    }
}

/// Merges desired connection strings into the current map.
///
/// A desired entry replaces the whole value/type pair stored under its name.
pub fn merge_connection_strings(
    current: &BTreeMap<String, ConnectionStringValue>,
    desired: &[ConnectionStringSetting],
) -> BTreeMap<String, ConnectionStringValue> {
    let mut merged = current.clone();
    for setting in desired {
        merged.insert(
            setting.name.clone(),
            ConnectionStringValue {
                value: setting.value.clone(),
                connection_type: setting.connection_type,
            },
        );
    }
    merged
}

/// Desired state read from deployment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSettings {
    pub app_settings: Vec<AppSetting>,
    pub connection_strings: Vec<ConnectionStringSetting>,
}

impl DesiredSettings {
    /// Parses the app settings and connection strings variables.
    ///
    /// Missing or blank variables mean no desired entries.
    pub fn from_variables(variables: &Variables) -> Result<Self> {
        Ok(Self {
            app_settings: parse_array(variables, keys::APP_SETTINGS)?,
            connection_strings: parse_array(variables, keys::CONNECTION_STRINGS)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.app_settings.is_empty() && self.connection_strings.is_empty()
    }
}

fn parse_array<T: DeserializeOwned>(variables: &Variables, key: &str) -> Result<Vec<T>> {
    match variables.get_non_blank(key) {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(Vec::new()),
    }
}

/// Applies desired settings to one site through a client.
pub struct SettingsReconciler<'a> {
    client: &'a mut dyn WebAppClient,
    log: &'a dyn Log,
}

impl<'a> SettingsReconciler<'a> {
    pub fn new(client: &'a mut dyn WebAppClient, log: &'a dyn Log) -> Self {
        Self { client, log }
    }

    /// Merges and writes app settings. Returns the state written.
    ///
    /// An empty desired list makes no remote calls.
    pub async fn reconcile_app_settings(
        &mut self,
        site: &TargetSite,
        desired: &[AppSetting],
    ) -> Result<Option<RemoteSettingsSnapshot>> {
        if desired.is_empty() {
            return Ok(None);
        }

        let entries = self.client.get_app_settings(site).await?;
        let current = RemoteSettingsSnapshot::from_entries(entries);
        let merged = merge_app_settings(&current, desired);

        self.log
            .verbose(&format!("Updating application settings on {}", site));
        self.client.put_app_settings(site, &merged.properties).await?;

        if merged.slot_sticky_names.is_empty() {
            debug!(site = %site, "no slot settings to write");
        } else {
            self.log
                .verbose(&format!("Updating slot settings on {}", site));
            self.client
                .put_slot_settings_list(site, &merged.slot_sticky_names)
                .await?;
        }

        info!(
            site = %site,
            settings = merged.properties.len(),
            slot_settings = merged.slot_sticky_names.len(),
            "app settings reconciled"
        );
        Ok(Some(merged))
    }

    /// Merges and writes connection strings. Returns the map written.
    ///
    /// An empty desired list makes no remote calls.
    pub async fn reconcile_connection_strings(
        &mut self,
        site: &TargetSite,
        desired: &[ConnectionStringSetting],
    ) -> Result<Option<BTreeMap<String, ConnectionStringValue>>> {
        if desired.is_empty() {
            return Ok(None);
        }

        let current = self.client.get_connection_strings(site).await?;
        let merged = merge_connection_strings(&current, desired);

        self.log
            .verbose(&format!("Updating connection strings on {}", site));
        self.client.put_connection_strings(site, &merged).await?;

        info!(site = %site, connection_strings = merged.len(), "connection strings reconciled");
        Ok(Some(merged))
    }

    /// Reconciles app settings, then connection strings.
    pub async fn reconcile(&mut self, site: &TargetSite, desired: &DesiredSettings) -> Result<()> {
        self.reconcile_app_settings(site, &desired.app_settings)
            .await?;
        self.reconcile_connection_strings(site, &desired.connection_strings)
            .await?;
        Ok(())
    }

    /// Reconciles the site named by deployment variables.
    ///
    /// Returns the site that was updated, or `None` when neither settings
    /// variable has content.
    ///
    /// # Errors
    ///
    /// - [`AzWebAppError::Required`]: web app or resource group name missing
    /// - [`AzWebAppError::Json`]: a settings variable is not a JSON array
    /// - [`AzWebAppError::InvalidName`]: the site breaks Azure naming rules
    /// - Client errors, unchanged
    pub async fn run(&mut self, variables: &Variables) -> Result<Option<TargetSite>> {
        if variables.get_non_blank(keys::APP_SETTINGS).is_none()
            && variables.get_non_blank(keys::CONNECTION_STRINGS).is_none()
        {
            debug!("no app settings or connection strings configured");
            return Ok(None);
        }

        let web_app_name = variables
            .get_non_blank(keys::WEB_APP_NAME)
            .ok_or_else(|| AzWebAppError::Required("Web App Name".to_string()))?;
        let resource_group = variables
            .get_non_blank(keys::RESOURCE_GROUP_NAME)
            .ok_or_else(|| AzWebAppError::Required("resource group name".to_string()))?;

        let site = TargetSite::parse(
            resource_group,
            web_app_name,
            variables.get(keys::DEPLOYMENT_SLOT),
        );
        site.validate()?;

        let desired = DesiredSettings::from_variables(variables)?;
        self.reconcile(&site, &desired).await?;
        Ok(Some(site))
    }
}


#[cfg(all(test, feature = "mock"))]
mod reconciler_tests {
    use super::*;
    use crate::backends::mock::MockBackend;
    use crate::log::InMemoryLog;
    use crate::ConnectionStringType;

    fn site() -> TargetSite {
        TargetSite::new("rg", "my-app", None)
    }

    async fn seeded_backend() -> MockBackend {
        let backend = MockBackend::new();
        backend.set_app_setting(&site(), "X", "1", true).await;
        backend.set_app_setting(&site(), "Y", "2", false).await;
        backend
    }

    #[tokio::test]
    async fn test_demotion_skips_sticky_write() {
        let mut backend = seeded_backend().await;
        let log = InMemoryLog::new();

        SettingsReconciler::new(&mut backend, &log)
            .reconcile_app_settings(&site(), &[AppSetting::new("X", "9", false)])
            .await
            .unwrap();

        let settings = backend.app_settings(&site()).await;
        assert_eq!(settings["X"], "9");
        assert_eq!(settings["Y"], "2");
        assert_eq!(backend.calls().await, vec!["get_app_settings", "put_app_settings"]);
    }

    #[tokio::test]
    async fn test_write_order() {
        let mut backend = seeded_backend().await;
        let log = InMemoryLog::new();
        let desired = DesiredSettings {
            app_settings: vec![AppSetting::new("Z", "3", true)],
            connection_strings: vec![ConnectionStringSetting::new(
                "db",
                "Server=.",
                ConnectionStringType::SqlAzure,
            )],
        };

        SettingsReconciler::new(&mut backend, &log)
            .reconcile(&site(), &desired)
            .await
            .unwrap();

        assert_eq!(
            backend.calls().await,
            vec![
                "get_app_settings",
                "put_app_settings",
                "put_slot_settings_list",
                "get_connection_strings",
                "put_connection_strings",
            ]
        );
        assert_eq!(backend.slot_sticky_names(&site()).await.len(), 2);
        assert_eq!(
            backend.connection_strings(&site()).await["db"].connection_type,
            ConnectionStringType::SqlAzure
        );
    }

    #[tokio::test]
    async fn test_second_run_converges() {
        let mut backend = seeded_backend().await;
        let log = InMemoryLog::new();
        let desired = vec![AppSetting::new("X", "5", false), AppSetting::new("W", "7", true)];

        SettingsReconciler::new(&mut backend, &log)
            .reconcile_app_settings(&site(), &desired)
            .await
            .unwrap();
        let first = (
            backend.app_settings(&site()).await,
            backend.slot_sticky_names(&site()).await,
        );

        SettingsReconciler::new(&mut backend, &log)
            .reconcile_app_settings(&site(), &desired)
            .await
            .unwrap();
        let second = (
            backend.app_settings(&site()).await,
            backend.slot_sticky_names(&site()).await,
        );

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sticky_write_failure_leaves_values_written() {
        let mut backend = seeded_backend().await;
        backend.put_slot_settings_error = Some(AzWebAppError::NotAuthenticated);
        let log = InMemoryLog::new();
        let desired = DesiredSettings {
            app_settings: vec![AppSetting::new("Y", "20", true)],
            connection_strings: vec![ConnectionStringSetting::new(
                "db",
                "x",
                ConnectionStringType::Custom,
            )],
        };

        let result = SettingsReconciler::new(&mut backend, &log)
            .reconcile(&site(), &desired)
            .await;

        assert!(result.is_err());
        assert_eq!(backend.app_settings(&site()).await["Y"], "20");
        assert_eq!(backend.slot_sticky_names(&site()).await, BTreeSet::from(["X".to_string()]));
        assert!(backend.connection_strings(&site()).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_desired_makes_no_calls() {
        let mut backend = seeded_backend().await;
        let log = InMemoryLog::new();

        SettingsReconciler::new(&mut backend, &log)
            .reconcile(&site(), &DesiredSettings::default())
            .await
            .unwrap();

        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_disabled_without_settings_variables() {
        let mut backend = MockBackend::new();
        let log = InMemoryLog::new();

        let site = SettingsReconciler::new(&mut backend, &log)
            .run(&Variables::new())
            .await
            .unwrap();

        assert!(site.is_none());
    }

    #[tokio::test]
    async fn test_run_requires_names() {
        let mut backend = MockBackend::new();
        let log = InMemoryLog::new();
        let variables = Variables::new().with(keys::APP_SETTINGS, r#"[{"name":"X","value":"1"}]"#);

        let err = SettingsReconciler::new(&mut backend, &log)
            .run(&variables)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Web App Name must be specified");

        let variables = variables.with(keys::WEB_APP_NAME, "my-app");
        let err = SettingsReconciler::new(&mut backend, &log)
            .run(&variables)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "resource group name must be specified");
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_targets_slot_from_variables() {
        let mut backend = MockBackend::new();
        let log = InMemoryLog::new();
        let variables = Variables::new()
            .with(keys::WEB_APP_NAME, "my-app(staging)")
            .with(keys::RESOURCE_GROUP_NAME, "rg")
            .with(keys::APP_SETTINGS, r#"[{"name":"X","value":"1"}]"#);

        let site = SettingsReconciler::new(&mut backend, &log)
            .run(&variables)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(site.slot.as_deref(), Some("staging"));
        assert_eq!(backend.app_settings(&site).await["X"], "1");
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_site_name() {
        let mut backend = MockBackend::new();
        let log = InMemoryLog::new();
        let variables = Variables::new()
            .with(keys::WEB_APP_NAME, "-bad-")
            .with(keys::RESOURCE_GROUP_NAME, "rg")
            .with(keys::APP_SETTINGS, r#"[{"name":"X","value":"1"}]"#);

        let result = SettingsReconciler::new(&mut backend, &log)
            .run(&variables)
            .await;

        assert!(matches!(result, Err(AzWebAppError::InvalidName(_))));
        assert!(backend.calls().await.is_empty());
    }
}
