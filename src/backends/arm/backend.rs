//! Resource Manager client implementation.

use crate::backends::arm::types::{
    ArmList, ConnectionStringDictionary, Site, SlotConfigNames, StringDictionary,
};
use crate::validation::{
    validate_resource_group_name, validate_site_name, validate_subscription_id,
};
use crate::{
    AccountCredentials, AppSettingEntry, AzWebAppError, Config, ConnectionStringValue, Result,
    TargetSite, WebAppClient, WebAppResource,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::debug;

/// Default `Microsoft.Web` API version.
pub const DEFAULT_API_VERSION: &str = "2022-03-01";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resource Manager client for App Service.
///
/// Each call is a single request (plus `nextLink` pages when listing); there
/// are no retries.
pub struct ArmBackend {
    http: Option<Client>,
    account: AccountCredentials,
    access_token: String,
    api_version: String,
    base_url_override: Option<String>,
    base_url: String,
}

impl ArmBackend {
    /// Creates a new client from configuration.
    pub fn new(config: Config) -> Self {
        let access_token = config
            .get_option("access_token")
            .map(str::to_string)
            .unwrap_or_else(|| std::env::var("AZURE_ACCESS_TOKEN").unwrap_or_default());

        let api_version = config
            .get_option("api_version")
            .unwrap_or(DEFAULT_API_VERSION)
            .to_string();

        let base_url_override = config
            .get_option("base_url")
            .filter(|url| !url.trim().is_empty())
            .map(|url| url.trim_end_matches('/').to_string());

        Self {
            http: None,
            account: config.account,
            access_token,
            api_version,
            base_url_override,
            base_url: String::new(),
        }
    }

    fn http(&self) -> Result<&Client> {
        self.http.as_ref().ok_or(AzWebAppError::NotAuthenticated)
    }

    fn resource_group_url(&self, resource_group: &str) -> Result<String> {
        validate_resource_group_name(resource_group)?;
        Ok(format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web",
            self.base_url, self.account.subscription_number, resource_group
        ))
    }

    fn web_app_url(&self, resource_group: &str, web_app: &str) -> Result<String> {
        validate_site_name(web_app)?;
        Ok(format!(
            "{}/sites/{}",
            self.resource_group_url(resource_group)?,
            web_app
        ))
    }

    /// URL of the site or slot `site` addresses.
    fn site_url(&self, site: &TargetSite) -> Result<String> {
        site.validate()?;
        let web_app_url = self.web_app_url(&site.resource_group, &site.site)?;
        Ok(match &site.slot {
            Some(slot) => format!("{}/slots/{}", web_app_url, slot),
            None => web_app_url,
        })
    }

    fn with_api_version(&self, url: &str) -> String {
        format!("{}?api-version={}", url, self.api_version)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AzWebAppError::Other(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AzWebAppError::from_status(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AzWebAppError::Other(e.into()))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "GET");
        self.send(self.http()?.get(url)).await
    }

    async fn post_list<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "POST");
        self.send(self.http()?.post(url)).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        debug!(url = %url, "PUT");
        self.send(self.http()?.put(url).json(body)).await
    }

    /// Follows `nextLink` until the listing is exhausted.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(url) = next {
            let page: ArmList<T> = self.get(&url).await?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(items)
    }

    async fn slot_config_names(&self, site: &TargetSite) -> Result<SlotConfigNames> {
        let url = format!(
            "{}/config/slotConfigNames",
            self.web_app_url(&site.resource_group, &site.site)?
        );
        self.get(&self.with_api_version(&url)).await
    }
}

#[async_trait]
impl WebAppClient for ArmBackend {
    fn name(&self) -> &str {
        "arm"
    }

    async fn init(&mut self) -> Result<()> {
        validate_subscription_id(&self.account.subscription_number)?;

        if self.access_token.trim().is_empty() {
            return Err(AzWebAppError::NotAuthenticated);
        }

        self.base_url = match &self.base_url_override {
            Some(url) => url.clone(),
            None => self
                .account
                .resource_management_endpoint()
                .trim_end_matches('/')
                .to_string(),
        };

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AzWebAppError::Other(anyhow::anyhow!("Failed to create HTTP client: {}", e))
            })?;
        self.http = Some(http);

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.http = None;
        Ok(())
    }

    async fn list_web_apps(&self, resource_group: &str) -> Result<Vec<WebAppResource>> {
        let url = format!("{}/sites", self.resource_group_url(resource_group)?);
        let sites: Vec<Site> = self
            .get_all_pages(&self.with_api_version(&url))
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "list-web-apps", resource_group, e))?;

        Ok(sites
            .into_iter()
            .map(|site| site.into_web_app(resource_group))
            .collect())
    }

    async fn list_slots(
        &self,
        resource_group: &str,
        web_app: &str,
    ) -> Result<Vec<WebAppResource>> {
        let url = format!("{}/slots", self.web_app_url(resource_group, web_app)?);
        let slots: Vec<Site> = self
            .get_all_pages(&self.with_api_version(&url))
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "list-slots", web_app, e))?;

        Ok(slots
            .into_iter()
            .map(|slot| slot.into_slot(resource_group, web_app))
            .collect())
    }

    async fn get_web_app(
        &self,
        resource_group: &str,
        web_app: &str,
    ) -> Result<Option<WebAppResource>> {
        let url = self.web_app_url(resource_group, web_app)?;
        match self.get::<Site>(&self.with_api_version(&url)).await {
            Ok(site) => Ok(Some(site.into_web_app(resource_group))),
            Err(AzWebAppError::NotFound(_)) => Ok(None),
            Err(e) => Err(AzWebAppError::client_op("arm", "get-web-app", web_app, e)),
        }
    }

    async fn get_app_settings(&self, site: &TargetSite) -> Result<Vec<AppSettingEntry>> {
        let url = format!("{}/config/appsettings/list", self.site_url(site)?);
        let settings: StringDictionary = self
            .post_list(&self.with_api_version(&url))
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "get-settings", site.to_string(), e))?;

        let sticky: BTreeSet<String> = self
            .slot_config_names(site)
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "get-slot-settings", site.to_string(), e))?
            .app_setting_names()
            .into_iter()
            .collect();

        Ok(settings
            .properties
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
        let url = format!("{}/config/appsettings", self.site_url(site)?);
        let body = StringDictionary {
            properties: properties.clone(),
        };

        let _: StringDictionary = self
            .put(&self.with_api_version(&url), &body)
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "put-settings", site.to_string(), e))?;
        Ok(())
    }

    async fn put_slot_settings_list(
        &mut self,
        site: &TargetSite,
        names: &BTreeSet<String>,
    ) -> Result<()> {
        // The list lives on the web app and is shared by its slots.
        let mut config = self
            .slot_config_names(site)
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "get-slot-settings", site.to_string(), e))?;
        config.set_app_setting_names(names);

        let url = format!(
            "{}/config/slotConfigNames",
            self.web_app_url(&site.resource_group, &site.site)?
        );
        let _: SlotConfigNames = self
            .put(&self.with_api_version(&url), &config)
            .await
            .map_err(|e| AzWebAppError::client_op("arm", "put-slot-settings", site.to_string(), e))?;
        Ok(())
    }

    async fn get_connection_strings(
        &self,
        site: &TargetSite,
    ) -> Result<BTreeMap<String, ConnectionStringValue>> {
        let url = format!("{}/config/connectionstrings/list", self.site_url(site)?);
        let strings: ConnectionStringDictionary = self
            .post_list(&self.with_api_version(&url))
            .await
            .map_err(|e| {
                AzWebAppError::client_op("arm", "get-connection-strings", site.to_string(), e)
            })?;
        Ok(strings.properties)
    }

    async fn put_connection_strings(
        &mut self,
        site: &TargetSite,
        connection_strings: &BTreeMap<String, ConnectionStringValue>,
    ) -> Result<()> {
        let url = format!("{}/config/connectionstrings", self.site_url(site)?);
        let body = ConnectionStringDictionary {
            properties: connection_strings.clone(),
        };

        let _: ConnectionStringDictionary = self
            .put(&self.with_api_version(&url), &body)
            .await
            .map_err(|e| {
                AzWebAppError::client_op("arm", "put-connection-strings", site.to_string(), e)
            })?;
        Ok(())
    }
}
