//! Deployment variables and the well-known keys this crate reads.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Well-known deployment variable names.
pub mod keys {
    /// Target discovery context JSON.
    pub const TARGET_DISCOVERY_CONTEXT: &str = "Octopus.TargetDiscovery.Context";

    pub const RESOURCE_GROUP_NAME: &str = "Octopus.Action.Azure.ResourceGroupName";
    pub const WEB_APP_NAME: &str = "Octopus.Action.Azure.WebAppName";
    pub const DEPLOYMENT_SLOT: &str = "Octopus.Action.Azure.DeploymentSlot";

    /// JSON array of `{name, value, slotSetting}`.
    pub const APP_SETTINGS: &str = "Octopus.Action.Azure.AppSettings";
    /// JSON array of `{name, value, type}`.
    pub const CONNECTION_STRINGS: &str = "Octopus.Action.Azure.ConnectionStrings";

    /// Account id fallback used when a target message names no usable account.
    pub const ACCOUNT_ID: &str = "Octopus.Action.Azure.AccountId";
    /// Step-level default worker pool.
    pub const WORKER_POOL_ID: &str = "Octopus.WorkerPool.Id";

    pub const SUBSCRIPTION_ID: &str = "Octopus.Action.Azure.SubscriptionId";
    pub const CLIENT_ID: &str = "Octopus.Action.Azure.ClientId";
    pub const TENANT_ID: &str = "Octopus.Action.Azure.TenantId";
    pub const PASSWORD: &str = "Octopus.Action.Azure.Password";
    pub const ENVIRONMENT: &str = "Octopus.Action.Azure.Environment";
    pub const RESOURCE_MANAGEMENT_ENDPOINT: &str =
        "Octopus.Action.Azure.ResourceManagementEndPoint";
    pub const ACTIVE_DIRECTORY_ENDPOINT: &str = "Octopus.Action.Azure.ActiveDirectoryEndPoint";

    /// Output variable written by the health check.
    pub const APP_SERVICE_PLAN_ID: &str = "Octopus.Action.Azure.AppServicePlanId";
}

/// A snapshot of deployment variables.
///
/// Lookups are exact-match on the variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    /// Creates an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads variables from a JSON object file (`{"name": "value", ...}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object
    /// of strings.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref()).await?;
        let values: HashMap<String, String> = serde_json::from_slice(&data)?;
        Ok(Self { values })
    }

    /// Gets a variable value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Gets a variable value, treating blank values as absent.
    pub fn get_non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }

    /// Sets a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Checks whether a variable is defined at all.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
