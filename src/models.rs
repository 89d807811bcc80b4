//! Data structures for web apps, slots, and their configuration.

use crate::validation::{validate_resource_group_name, validate_site_name, validate_slot_name};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A web app or web app slot as reported by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppResource {
    /// Site name, or the slot's own name for slots (without the `app/` prefix)
    pub name: String,

    /// Resource group containing the site
    pub resource_group: String,

    /// Resource tags
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// True for deployment slots
    #[serde(default)]
    pub is_slot: bool,

    /// Owning web app, set for slots only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,

    /// App Service plan (server farm) resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_farm_id: Option<String>,

    /// When the site configuration last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl WebAppResource {
    /// Creates a web app resource.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::WebAppResource;
    ///
    /// let app = WebAppResource::web_app("my-app", "my-rg")
    ///     .with_tag("octopus-environment", "dev");
    /// assert!(!app.is_slot);
    /// assert_eq!(app.tags.get("octopus-environment").map(String::as_str), Some("dev"));
    /// ```
    pub fn web_app(name: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_group: resource_group.into(),
            tags: HashMap::new(),
            is_slot: false,
            parent_name: None,
            server_farm_id: None,
            last_modified: None,
        }
    }

    /// Creates a deployment slot resource belonging to `parent`.
    pub fn slot(
        parent: impl Into<String>,
        name: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource_group: resource_group.into(),
            tags: HashMap::new(),
            is_slot: true,
            parent_name: Some(parent.into()),
            server_farm_id: None,
            last_modified: None,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the App Service plan id.
    pub fn with_server_farm_id(mut self, id: impl Into<String>) -> Self {
        self.server_farm_id = Some(id.into());
        self
    }

    /// Name of the site that owns this resource (itself for web apps).
    pub fn site_name(&self) -> &str {
        self.parent_name.as_deref().unwrap_or(&self.name)
    }

    /// The [`TargetSite`] addressing this resource.
    pub fn target_site(&self) -> TargetSite {
        if self.is_slot {
            TargetSite::new(self.resource_group.clone(), self.site_name(), Some(self.name.clone()))
        } else {
            TargetSite::new(self.resource_group.clone(), self.name.clone(), None)
        }
    }
}

/// Address of one configurable site: a web app or one of its slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSite {
    /// Resource group
    pub resource_group: String,
    /// Web app name
    pub site: String,
    /// Slot name; `None` addresses the production site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

impl TargetSite {
    /// Creates a target site. An empty slot name addresses the production site.
    pub fn new(
        resource_group: impl Into<String>,
        site: impl Into<String>,
        slot: Option<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            site: site.into(),
            slot: slot.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Builds a target site from a web app name that may carry its slot.
    ///
    /// An explicit `slot` wins. Otherwise `app/slot` and `app(slot)` forms of
    /// `web_app_name` are split into site and slot.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::TargetSite;
    ///
    /// let site = TargetSite::parse("rg", "my-app(staging)", None);
    /// assert_eq!(site.site, "my-app");
    /// assert_eq!(site.slot.as_deref(), Some("staging"));
    /// ```
    pub fn parse(resource_group: &str, web_app_name: &str, slot: Option<&str>) -> Self {
        let explicit = slot.map(str::trim).filter(|s| !s.is_empty());

        let (site, embedded) = if let Some((site, slot)) = web_app_name.split_once('/') {
            (site, Some(slot))
        } else if let Some(open) = web_app_name.find('(') {
            let slot = web_app_name[open + 1..].trim_end_matches(')');
            (&web_app_name[..open], Some(slot))
        } else {
            (web_app_name, None)
        };

        let slot = explicit.or(embedded).map(str::to_string);
        Self::new(resource_group, site.trim(), slot)
    }

    /// Checks the site, slot, and resource group against Azure naming rules.
    pub fn validate(&self) -> Result<()> {
        validate_resource_group_name(&self.resource_group)?;
        validate_site_name(&self.site)?;
        if let Some(slot) = &self.slot {
            validate_slot_name(slot)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for TargetSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.slot {
            Some(slot) => write!(f, "{}/{}/{}", self.resource_group, self.site, slot),
            None => write!(f, "{}/{}", self.resource_group, self.site),
        }
    }
}

/// Desired application setting. `name` is the merge key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(alias = "Value", default)]
    pub value: String,

    /// Whether the setting sticks to its slot during swaps
    #[serde(rename = "slotSetting", alias = "SlotSetting", default)]
    pub is_slot_setting: bool,
}

impl AppSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>, is_slot_setting: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_slot_setting,
        }
    }
}

/// An application setting as currently stored on a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettingEntry {
    pub name: String,
    pub value: String,
    pub is_slot_setting: bool,
}

/// Connection string database type, as named by the management API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStringType {
    MySql,
    #[serde(rename = "SQLServer")]
    SqlServer,
    #[serde(rename = "SQLAzure")]
    SqlAzure,
    #[default]
    Custom,
    NotificationHub,
    ServiceBus,
    EventHub,
    ApiHub,
    DocDb,
    RedisCache,
    #[serde(rename = "PostgreSQL")]
    PostgreSql,
}

impl std::fmt::Display for ConnectionStringType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MySql => "MySql",
            Self::SqlServer => "SQLServer",
            Self::SqlAzure => "SQLAzure",
            Self::Custom => "Custom",
            Self::NotificationHub => "NotificationHub",
            Self::ServiceBus => "ServiceBus",
            Self::EventHub => "EventHub",
            Self::ApiHub => "ApiHub",
            Self::DocDb => "DocDb",
            Self::RedisCache => "RedisCache",
            Self::PostgreSql => "PostgreSQL",
        };
        write!(f, "{}", name)
    }
}

/// Desired connection string. `name` is the merge key; a match replaces the
/// whole value/type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStringSetting {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(alias = "Value", default)]
    pub value: String,

    #[serde(rename = "type", alias = "Type", default)]
    pub connection_type: ConnectionStringType,
}

impl ConnectionStringSetting {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        connection_type: ConnectionStringType,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            connection_type,
        }
    }
}

/// Stored value of a connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStringValue {
    pub value: String,

    #[serde(rename = "type", default)]
    pub connection_type: ConnectionStringType,
}

/// Current app settings of a site, read immediately before a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSettingsSnapshot {
    /// Setting values by name
    pub properties: BTreeMap<String, String>,
    /// Names currently marked slot-sticky
    pub slot_sticky_names: BTreeSet<String>,
}

impl RemoteSettingsSnapshot {
    /// Builds a snapshot from the entries a client returns.
    pub fn from_entries(entries: impl IntoIterator<Item = AppSettingEntry>) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            if entry.is_slot_setting {
                snapshot.slot_sticky_names.insert(entry.name.clone());
            }
            snapshot.properties.insert(entry.name, entry.value);
        }
        snapshot
    }
}
