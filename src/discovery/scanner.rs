//! Tag matching over a snapshot of candidate resources.

use crate::discovery::DiscoveryScope;
use crate::service_message::{attributes, CREATE_WEB_APP_TARGET};
use crate::{ServiceMessage, WebAppResource};
use std::collections::HashMap;

/// Tag holding the environment a resource belongs to.
pub const ENVIRONMENT_TAG: &str = "octopus-environment";

/// Tag holding the role a resource fulfils.
pub const ROLE_TAG: &str = "octopus-role";

/// One resource that matched the discovery scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// `app` for web apps, `app/slot` for slots
    pub target_name: String,
    /// Set for slot matches only
    pub slot_name: Option<String>,
    /// Owning web app
    pub web_app_name: String,
    pub resource_group: String,
    /// Role tag value that matched
    pub role: String,
}

impl DiscoveryResult {
    /// The `create-azurewebapptarget` message registering this target.
    ///
    /// `azureWebAppSlot` follows `name` and is present only for slots.
    pub fn to_service_message(&self) -> ServiceMessage {
        let mut message =
            ServiceMessage::new(CREATE_WEB_APP_TARGET).with(attributes::NAME, &self.target_name);
        if let Some(slot) = &self.slot_name {
            message = message.with(attributes::WEB_APP_SLOT, slot);
        }
        message
            .with(attributes::WEB_APP, &self.web_app_name)
            .with(attributes::RESOURCE_GROUP, &self.resource_group)
            .with(attributes::ROLES, &self.role)
            .with(attributes::UPDATE_IF_EXISTING, "True")
            .with(attributes::IS_DYNAMIC, "True")
    }
}

/// Returns the matching role when `tags` satisfy the scope.
///
/// A resource matches when its environment tag equals the scope's
/// environment and its role tag is one of the scope's roles. Comparison is
/// exact and case-sensitive.
pub fn matching_role<'a>(tags: &'a HashMap<String, String>, scope: &DiscoveryScope) -> Option<&'a str> {
    let environment = tags.get(ENVIRONMENT_TAG)?;
    if *environment != scope.environment_id {
        return None;
    }

    tags.get(ROLE_TAG)
        .filter(|role| scope.roles.contains(role.as_str()))
        .map(String::as_str)
}

/// Filters candidates down to those matching `scope`.
///
/// Candidates are evaluated independently on their own tags, in the order
/// given; a slot can match without its parent and vice versa.
///
/// # Example
///
/// ```
/// use azwebapp::discovery::{scan, DiscoveryScope, ENVIRONMENT_TAG, ROLE_TAG};
/// use azwebapp::WebAppResource;
/// use std::collections::BTreeSet;
///
/// let scope = DiscoveryScope {
///     space_id: "Spaces-1".into(),
///     environment_id: "dev".into(),
///     project_id: "Projects-1".into(),
///     tenant_id: None,
///     roles: BTreeSet::from(["web".to_string()]),
/// };
///
/// let app = WebAppResource::web_app("A", "rg")
///     .with_tag(ENVIRONMENT_TAG, "dev")
///     .with_tag(ROLE_TAG, "web");
///
/// let results = scan(&[app], &scope);
/// assert_eq!(results[0].target_name, "A");
/// ```
pub fn scan(candidates: &[WebAppResource], scope: &DiscoveryScope) -> Vec<DiscoveryResult> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let role = matching_role(&candidate.tags, scope)?;
            let web_app_name = candidate.site_name().to_string();

            let (target_name, slot_name) = if candidate.is_slot {
                (
                    format!("{}/{}", web_app_name, candidate.name),
                    Some(candidate.name.clone()),
                )
            } else {
                (candidate.name.clone(), None)
            };

            Some(DiscoveryResult {
                target_name,
                slot_name,
                web_app_name,
                resource_group: candidate.resource_group.clone(),
                role: role.to_string(),
            })
        })
        .collect()
}
