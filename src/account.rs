//! Service principal accounts and the Azure clouds they authenticate against.

use crate::variables::{keys, Variables};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named Azure cloud.
///
/// Each cloud has its own management and Active Directory endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AzureCloud {
    /// Public Azure (`AzureGlobalCloud`, also accepted as `AzureCloud`)
    Global,
    /// Azure operated by 21Vianet
    China,
    /// Azure US Government
    USGovernment,
    /// Azure Germany
    Germany,
}

impl AzureCloud {
    /// Parses an Azure environment name.
    ///
    /// An empty name means the global cloud. Names outside the known clouds
    /// also fall back to the global cloud, with a warning; accounts on other
    /// clouds supply explicit endpoint overrides instead.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::account::AzureCloud;
    ///
    /// assert_eq!(AzureCloud::parse(""), AzureCloud::Global);
    /// assert_eq!(AzureCloud::parse("AzureCloud"), AzureCloud::Global);
    /// assert_eq!(AzureCloud::parse("AzureChinaCloud"), AzureCloud::China);
    /// assert_eq!(AzureCloud::parse("AzureStackCloud"), AzureCloud::Global);
    /// ```
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "" | "AzureGlobalCloud" | "AzureCloud" => Self::Global,
            "AzureChinaCloud" => Self::China,
            "AzureUSGovernment" => Self::USGovernment,
            "AzureGermanCloud" => Self::Germany,
            other => {
                warn!(environment = %other, "unknown Azure environment, using AzureGlobalCloud");
                Self::Global
            }
        }
    }

    /// Default Azure Resource Manager endpoint.
    pub fn resource_management_endpoint(&self) -> &'static str {
        match self {
            Self::Global => "https://management.azure.com/",
            Self::China => "https://management.chinacloudapi.cn/",
            Self::USGovernment => "https://management.usgovcloudapi.net/",
            Self::Germany => "https://management.microsoftazure.de/",
        }
    }

    /// Default Active Directory authority.
    pub fn active_directory_endpoint(&self) -> &'static str {
        match self {
            Self::Global => "https://login.microsoftonline.com/",
            Self::China => "https://login.chinacloudapi.cn/",
            Self::USGovernment => "https://login.microsoftonline.us/",
            Self::Germany => "https://login.microsoftonline.de/",
        }
    }
}

impl std::fmt::Display for AzureCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "AzureGlobalCloud"),
            Self::China => write!(f, "AzureChinaCloud"),
            Self::USGovernment => write!(f, "AzureUSGovernment"),
            Self::Germany => write!(f, "AzureGermanCloud"),
        }
    }
}

/// Service principal credentials for the management API.
///
/// Opaque to discovery and reconciliation; only clients look inside. Empty
/// environment and endpoint fields mean "use the global cloud defaults".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountCredentials {
    /// Subscription id (GUID)
    #[serde(alias = "SubscriptionNumber", alias = "subscriptionnumber")]
    pub subscription_number: String,
    /// Application (client) id
    #[serde(alias = "ClientId", alias = "clientid")]
    pub client_id: String,
    /// Directory (tenant) id
    #[serde(alias = "TenantId", alias = "tenantid")]
    pub tenant_id: String,
    /// Client secret
    #[serde(alias = "Password")]
    pub password: String,
    /// Azure environment name, see [`AzureCloud::parse`]
    #[serde(alias = "AzureEnvironment", alias = "azureenvironment")]
    pub azure_environment: String,
    /// Management endpoint override
    #[serde(
        alias = "ResourceManagementEndpointBaseUri",
        alias = "resourcemanagementendpointbaseuri"
    )]
    pub resource_management_endpoint_base_uri: String,
    /// Active Directory endpoint override
    #[serde(
        alias = "ActiveDirectoryEndpointBaseUri",
        alias = "activedirectoryendpointbaseuri"
    )]
    pub active_directory_endpoint_base_uri: String,
}

impl AccountCredentials {
    /// Reads a service principal account from deployment variables.
    ///
    /// Missing variables become empty strings.
    pub fn from_variables(variables: &Variables) -> Self {
        let get = |key: &str| variables.get(key).unwrap_or_default().to_string();
        Self {
            subscription_number: get(keys::SUBSCRIPTION_ID),
            client_id: get(keys::CLIENT_ID),
            tenant_id: get(keys::TENANT_ID),
            password: get(keys::PASSWORD),
            azure_environment: get(keys::ENVIRONMENT),
            resource_management_endpoint_base_uri: get(keys::RESOURCE_MANAGEMENT_ENDPOINT),
            active_directory_endpoint_base_uri: get(keys::ACTIVE_DIRECTORY_ENDPOINT),
        }
    }

    /// Resolves the cloud this account belongs to.
    pub fn cloud(&self) -> AzureCloud {
        AzureCloud::parse(&self.azure_environment)
    }

    /// Management endpoint, honouring an explicit override.
    pub fn resource_management_endpoint(&self) -> String {
        let base_uri = self.resource_management_endpoint_base_uri.trim();
        if !base_uri.is_empty() {
            return base_uri.to_string();
        }
        self.cloud().resource_management_endpoint().to_string()
    }

    /// Active Directory endpoint, honouring an explicit override.
    pub fn active_directory_endpoint(&self) -> String {
        let base_uri = self.active_directory_endpoint_base_uri.trim();
        if !base_uri.is_empty() {
            return base_uri.to_string();
        }
        self.cloud().active_directory_endpoint().to_string()
    }

    /// True when there is a subscription to scan.
    pub fn has_subscription(&self) -> bool {
        !self.subscription_number.trim().is_empty()
    }
}

// Keeps the client secret out of logs.
impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("subscription_number", &self.subscription_number)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("password", &"<redacted>")
            .field("azure_environment", &self.azure_environment)
            .field(
                "resource_management_endpoint_base_uri",
                &self.resource_management_endpoint_base_uri,
            )
            .field(
                "active_directory_endpoint_base_uri",
                &self.active_directory_endpoint_base_uri,
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_clouds() {
        assert_eq!(AzureCloud::parse("AzureGlobalCloud"), AzureCloud::Global);
        assert_eq!(AzureCloud::parse("AzureUSGovernment"), AzureCloud::USGovernment);
        assert_eq!(AzureCloud::parse("AzureGermanCloud"), AzureCloud::Germany);
    }

    #[test]
    fn test_parse_unknown_cloud_uses_global() {
        assert_eq!(AzureCloud::parse("NonSenseEnvironment"), AzureCloud::Global);
    }

    #[test]
    fn test_unknown_environment_endpoints() {
        let mut account = AccountCredentials {
            azure_environment: "AzureStackCloud".to_string(),
            ..Default::default()
        };
        assert_eq!(account.cloud(), AzureCloud::Global);
        assert_eq!(
            account.resource_management_endpoint(),
            "https://management.azure.com/"
        );
        assert_eq!(
            account.active_directory_endpoint(),
            "https://login.microsoftonline.com/"
        );

        account.resource_management_endpoint_base_uri = "https://management.stack.local/".to_string();
        assert_eq!(
            account.resource_management_endpoint(),
            "https://management.stack.local/"
        );
    }

    #[test]
    fn test_endpoint_defaults_and_overrides() {
        let mut account = AccountCredentials::default();
        assert_eq!(
            account.resource_management_endpoint(),
            "https://management.azure.com/"
        );

        account.azure_environment = "AzureChinaCloud".to_string();
        assert_eq!(
            account.active_directory_endpoint(),
            "https://login.chinacloudapi.cn/"
        );

        account.resource_management_endpoint_base_uri = "https://arm.local/".to_string();
        assert_eq!(
            account.resource_management_endpoint(),
            "https://arm.local/"
        );
    }

    #[test]
    fn test_from_variables() {
        let variables = Variables::from_iter([
            (keys::SUBSCRIPTION_ID, "sub-1"),
            (keys::CLIENT_ID, "client-1"),
            (keys::PASSWORD, "secret"),
        ]);

        let account = AccountCredentials::from_variables(&variables);
        assert_eq!(account.subscription_number, "sub-1");
        assert_eq!(account.client_id, "client-1");
        assert_eq!(account.tenant_id, "");
        assert!(account.has_subscription());
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = AccountCredentials {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let debug = format!("{:?}", account);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
