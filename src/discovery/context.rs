//! Target discovery context: which environment and roles to look for, and
//! the account to look with.

use crate::{AccountCredentials, AzWebAppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Environment/role combination discovered targets must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryScope {
    #[serde(alias = "spaceid")]
    pub space_id: String,

    #[serde(alias = "environmentid")]
    pub environment_id: String,

    #[serde(alias = "projectid")]
    pub project_id: String,

    /// Absent for untenanted deployments
    #[serde(default, alias = "tenantid")]
    pub tenant_id: Option<String>,

    pub roles: BTreeSet<String>,
}

/// Input to one discovery run.
///
/// # Example
///
/// ```
/// use azwebapp::discovery::DiscoveryContext;
///
/// let json = r#"{
///     "Scope": { "SpaceId": "Spaces-1", "EnvironmentId": "dev", "ProjectId": "Projects-1",
///                "TenantId": null, "Roles": ["web"] },
///     "Account": { "SubscriptionNumber": "sub", "ClientId": "c", "TenantId": "t",
///                  "Password": "p", "AzureEnvironment": "",
///                  "ResourceManagementEndpointBaseUri": "", "ActiveDirectoryEndpointBaseUri": "" }
/// }"#;
///
/// let context = DiscoveryContext::from_json(json).unwrap();
/// assert_eq!(context.scope.environment_id, "dev");
/// assert!(context.scope.tenant_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryContext {
    pub scope: DiscoveryScope,
    pub account: AccountCredentials,
}

impl DiscoveryContext {
    /// Deserializes a context, matching field names case-insensitively.
    ///
    /// # Errors
    ///
    /// - [`AzWebAppError::Json`]: not JSON, or a required field is missing
    /// - [`AzWebAppError::InvalidContext`]: the scope names no roles
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let context: Self = serde_json::from_value(lowercase_keys(value))?;

        if context.scope.roles.is_empty() {
            return Err(AzWebAppError::InvalidContext(
                "scope must name at least one role".to_string(),
            ));
        }

        Ok(context)
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
