//! Resource Manager wire shapes for `Microsoft.Web/sites`.

use crate::{ConnectionStringValue, WebAppResource};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// ARM list page (`value` array with optional `nextLink`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArmList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// A site or slot as returned by `GET .../sites[/{app}/slots]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Site {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub properties: Option<SiteProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteProperties {
    #[serde(default)]
    pub server_farm_id: Option<String>,
    #[serde(default)]
    pub last_modified_time_utc: Option<String>,
}

impl Site {
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        let raw = self.properties.as_ref()?.last_modified_time_utc.as_deref()?;
        parse_timestamp(raw)
    }

    fn server_farm_id(&self) -> Option<String> {
        self.properties.as_ref()?.server_farm_id.clone()
    }

    /// Converts a site to a web app resource.
    pub fn into_web_app(self, resource_group: &str) -> WebAppResource {
        let mut resource = WebAppResource::web_app(self.name.clone(), resource_group);
        resource.server_farm_id = self.server_farm_id();
        resource.last_modified = self.last_modified();
        resource.tags = self.tags.unwrap_or_default();
        resource
    }

    /// Converts a slot to a slot resource. ARM names slots `app/slot`.
    pub fn into_slot(self, resource_group: &str, web_app: &str) -> WebAppResource {
        let short_name = self
            .name
            .rsplit_once('/')
            .map(|(_, slot)| slot)
            .unwrap_or(&self.name)
            .to_string();

        let mut resource = WebAppResource::slot(web_app, short_name, resource_group);
        resource.server_farm_id = self.server_farm_id();
        resource.last_modified = self.last_modified();
        resource.tags = self.tags.unwrap_or_default();
        resource
    }
}

// ARM omits the offset on lastModifiedTimeUtc; the value is UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `StringDictionary` resource holding app settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StringDictionary {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// `ConnectionStringDictionary` resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ConnectionStringDictionary {
    #[serde(default)]
    pub properties: BTreeMap<String, ConnectionStringValue>,
}

/// `SlotConfigNamesResource`. Kept as raw JSON so fields this crate does not
/// manage survive a write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SlotConfigNames {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl SlotConfigNames {
    pub const APP_SETTING_NAMES: &'static str = "appSettingNames";

    pub fn app_setting_names(&self) -> Vec<String> {
        self.properties
            .get(Self::APP_SETTING_NAMES)
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_app_setting_names<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        let names = names.into_iter().cloned().map(Value::String).collect();
        self.properties
            .insert(Self::APP_SETTING_NAMES.to_string(), Value::Array(names));
    }
}
