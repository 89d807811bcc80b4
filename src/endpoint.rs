//! Endpoint resolution for discovered web app targets.
//!
//! A `create-azurewebapptarget` message names its web app directly but may
//! name its account and worker pool only loosely, or not at all. Each loose
//! field is resolved from the message first and falls back to deployment
//! variables only when the message yields nothing usable.

use crate::log::Log;
use crate::service_message::attributes;
use crate::variables::{keys, Variables};
use crate::{AzWebAppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error};

/// Deployment target type id of Azure web app targets.
pub const DEPLOYMENT_TARGET_TYPE_ID: &str = "AzureWebApp";

/// Resolved identity of an Azure web app deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureWebAppEndpoint {
    pub account_id: String,
    pub resource_group_name: String,
    pub web_app_name: String,

    /// Empty when the message carried no slot attribute
    pub web_app_slot_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_worker_pool_id: Option<String>,
}

impl AzureWebAppEndpoint {
    /// The slot, or `None` for the production site.
    pub fn slot(&self) -> Option<&str> {
        Some(self.web_app_slot_name.as_str()).filter(|s| !s.is_empty())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn attribute<'m>(message: &'m HashMap<String, String>, key: &str) -> Option<&'m str> {
    message
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn required(message: &HashMap<String, String>, key: &str) -> Result<String> {
    attribute(message, key)
        .map(str::to_string)
        .ok_or_else(|| AzWebAppError::MissingAttribute(key.to_string()))
}

/// Builds an endpoint from a target message's attributes.
///
/// `resolve_account` and `resolve_worker_pool` turn an id or name into a
/// canonical id, returning `None` when nothing matches. A blank result is
/// treated as no match.
///
/// - Account: the message's account attribute, then the account id variable.
/// - Worker pool: the message's worker pool attribute, then the step's
///   worker pool variable. Unresolved is not an error.
/// - Slot: the message's slot attribute, or empty when absent.
///
/// The fallback is consulted only when the message yields nothing.
///
/// # Errors
///
/// - [`AzWebAppError::MissingAttribute`]: web app or resource group absent
/// - [`AzWebAppError::AccountNotFound`]: neither source resolved an account.
///   The same text is written to `log` as an error first.
///
/// # Example
///
/// ```
/// use azwebapp::endpoint::build_endpoint;
/// use azwebapp::log::InMemoryLog;
/// use azwebapp::Variables;
/// use std::collections::HashMap;
///
/// let message = HashMap::from([
///     ("octopusAccountIdOrName".to_string(), "My Account".to_string()),
///     ("azureWebApp".to_string(), "my-app".to_string()),
///     ("azureResourceGroupName".to_string(), "my-rg".to_string()),
/// ]);
///
/// let endpoint = build_endpoint(
///     &message,
///     &Variables::new(),
///     |_| Some("Accounts-1".to_string()),
///     |_| None,
///     &InMemoryLog::new(),
/// )
/// .unwrap();
///
/// assert_eq!(endpoint.account_id, "Accounts-1");
/// assert_eq!(endpoint.web_app_slot_name, "");
/// assert_eq!(endpoint.slot(), None);
/// ```
pub fn build_endpoint<A, W>(
    message: &HashMap<String, String>,
    variables: &Variables,
    resolve_account: A,
    resolve_worker_pool: W,
    log: &dyn Log,
) -> Result<AzureWebAppEndpoint>
where
    A: Fn(&str) -> Option<String>,
    W: Fn(&str) -> Option<String>,
{
    let account_id = resolve_account_id(message, variables, &resolve_account, log)?;

    let default_worker_pool_id = attribute(message, attributes::WORKER_POOL_ID_OR_NAME)
        .and_then(|key| non_blank(resolve_worker_pool(key)))
        .or_else(|| {
            variables
                .get_non_blank(keys::WORKER_POOL_ID)
                .map(str::to_string)
        });

    let endpoint = AzureWebAppEndpoint {
        account_id,
        resource_group_name: required(message, attributes::RESOURCE_GROUP)?,
        web_app_name: required(message, attributes::WEB_APP)?,
        web_app_slot_name: message
            .get(attributes::WEB_APP_SLOT)
            .cloned()
            .unwrap_or_default(),
        default_worker_pool_id,
    };

    debug!(
        web_app = %endpoint.web_app_name,
        resource_group = %endpoint.resource_group_name,
        account = %endpoint.account_id,
        "resolved web app endpoint"
    );
    Ok(endpoint)
}

fn resolve_account_id(
    message: &HashMap<String, String>,
    variables: &Variables,
    resolve: &dyn Fn(&str) -> Option<String>,
    log: &dyn Log,
) -> Result<String> {
    if let Some(account) = attribute(message, attributes::ACCOUNT_ID_OR_NAME)
        .and_then(|key| non_blank(resolve(key)))
    {
        return Ok(account);
    }

    let variable = variables.get(keys::ACCOUNT_ID);
    if let Some(account) = variable.and_then(|key| non_blank(resolve(key))) {
        return Ok(account);
    }

    let err = AzWebAppError::AccountNotFound(variable.unwrap_or_default().to_string());
    let message = err.to_string();
    error!(variable = keys::ACCOUNT_ID, "{}", message);
    log.error(&message);
    Err(err)
}

/// Checks that a deployment target is an Azure web app target.
///
/// Passes when the target type is absent.
///
/// # Example
///
/// ```
/// use azwebapp::endpoint::ensure_web_app_target;
///
/// assert!(ensure_web_app_target(Some("AzureWebApp"), Some("web-1")).is_ok());
/// assert!(ensure_web_app_target(None, None).is_ok());
/// assert!(ensure_web_app_target(Some("Ssh"), Some("linux-1")).is_err());
/// ```
pub fn ensure_web_app_target(target_type: Option<&str>, target_name: Option<&str>) -> Result<()> {
    match target_type {
        Some(kind) if kind != DEPLOYMENT_TARGET_TYPE_ID => Err(AzWebAppError::Other(anyhow::anyhow!(
            "The machine {} will not be deployed to because it is not an Azure Web Application deployment target",
            target_name.unwrap_or("<unknown>")
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::InMemoryLog;
    use std::cell::RefCell;

    fn message_properties() -> HashMap<String, String> {
        HashMap::from([
            (attributes::ACCOUNT_ID_OR_NAME.to_string(), "Accounts-1".to_string()),
            (attributes::WEB_APP.to_string(), "CloudService".to_string()),
            (attributes::RESOURCE_GROUP.to_string(), "AzureStorage".to_string()),
            (attributes::WEB_APP_SLOT.to_string(), "production".to_string()),
        ])
    }

    fn variables() -> Variables {
        Variables::new().with(keys::ACCOUNT_ID, "Accounts-2")
    }

    fn no_pool(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_unresolvable_account_fails_and_logs_once() {
        for resolved in [None, Some(""), Some("    ")] {
            let log = InMemoryLog::new();
            let err = build_endpoint(
                &message_properties(),
                &variables(),
                |_| resolved.map(str::to_string),
                no_pool,
                &log,
            )
            .unwrap_err();

            let expected = "Account with Id / Name, Accounts-2, not found.";
            assert_eq!(err.to_string(), expected);
            assert_eq!(log.errors(), vec![expected.to_string()]);
        }
    }

    #[test]
    fn test_missing_account_variable_reports_blank_value() {
        let log = InMemoryLog::new();
        let err = build_endpoint(&message_properties(), &Variables::new(), |_| None, no_pool, &log)
            .unwrap_err();

        assert_eq!(err.to_string(), "Account with Id / Name, , not found.");
        assert_eq!(log.errors().len(), 1);
    }

    #[test]
    fn test_message_account_wins_without_consulting_variable() {
        let consulted = RefCell::new(Vec::new());
        let resolve = |key: &str| {
            consulted.borrow_mut().push(key.to_string());
            match key {
                "Accounts-1" => Some("Accounts-1".to_string()),
                "Accounts-2" => Some("123".to_string()),
                _ => None,
            }
        };

        let endpoint = build_endpoint(
            &message_properties(),
            &variables(),
            resolve,
            no_pool,
            &InMemoryLog::new(),
        )
        .unwrap();

        assert_eq!(endpoint.account_id, "Accounts-1");
        assert_eq!(endpoint.web_app_name, "CloudService");
        assert_eq!(endpoint.resource_group_name, "AzureStorage");
        assert_eq!(endpoint.web_app_slot_name, "production");
        assert_eq!(*consulted.borrow(), vec!["Accounts-1".to_string()]);
    }

    #[test]
    fn test_blank_message_account_falls_back_to_variable() {
        let cases: [Option<&str>; 3] = [None, Some(""), Some("    ")];
        for attribute_value in cases {
            let mut message = message_properties();
            match attribute_value {
                Some(value) => {
                    message.insert(attributes::ACCOUNT_ID_OR_NAME.to_string(), value.to_string());
                }
                None => {
                    message.remove(attributes::ACCOUNT_ID_OR_NAME);
                }
            }

            let resolve = |key: &str| (key == "Accounts-2").then(|| "Accounts-12".to_string());
            let endpoint =
                build_endpoint(&message, &variables(), resolve, no_pool, &InMemoryLog::new())
                    .unwrap();

            assert_eq!(endpoint.account_id, "Accounts-12");
        }
    }

    #[test]
    fn test_unresolved_message_account_falls_back_to_variable() {
        for resolved in [None, Some(""), Some("    ")] {
            let resolve = |key: &str| match key {
                "Accounts-1" => resolved.map(str::to_string),
                "Accounts-2" => Some("Accounts-3".to_string()),
                _ => None,
            };

            let endpoint = build_endpoint(
                &message_properties(),
                &variables(),
                resolve,
                no_pool,
                &InMemoryLog::new(),
            )
            .unwrap();

            assert_eq!(endpoint.account_id, "Accounts-3");
        }
    }

    #[test]
    fn test_missing_slot_attribute_is_empty_string() {
        let mut message = message_properties();
        message.remove(attributes::WEB_APP_SLOT);

        let endpoint = build_endpoint(
            &message,
            &variables(),
            |_| Some("Accounts-12".to_string()),
            no_pool,
            &InMemoryLog::new(),
        )
        .unwrap();

        assert_eq!(endpoint.web_app_slot_name, "");
        assert_eq!(endpoint.slot(), None);
    }

    #[test]
    fn test_worker_pool_from_message() {
        let mut message = message_properties();
        message.insert(
            attributes::WORKER_POOL_ID_OR_NAME.to_string(),
            "Worker Pool 1".to_string(),
        );
        let variables = variables().with(keys::WORKER_POOL_ID, "WorkerPools-9");

        let endpoint = build_endpoint(
            &message,
            &variables,
            |_| Some("Accounts-12".to_string()),
            |key| (key == "Worker Pool 1").then(|| "WorkerPools-1".to_string()),
            &InMemoryLog::new(),
        )
        .unwrap();

        assert_eq!(endpoint.default_worker_pool_id.as_deref(), Some("WorkerPools-1"));
    }

    #[test]
    fn test_worker_pool_falls_back_to_step_variable() {
        let variables = variables().with(keys::WORKER_POOL_ID, "WorkerPools-9");

        let endpoint = build_endpoint(
            &message_properties(),
            &variables,
            |_| Some("Accounts-12".to_string()),
            no_pool,
            &InMemoryLog::new(),
        )
        .unwrap();

        assert_eq!(endpoint.default_worker_pool_id.as_deref(), Some("WorkerPools-9"));
    }

    #[test]
    fn test_unresolved_worker_pool_attribute_falls_back_to_step_variable() {
        let mut message = message_properties();
        message.insert(
            attributes::WORKER_POOL_ID_OR_NAME.to_string(),
            "Nope".to_string(),
        );
        let variables = variables().with(keys::WORKER_POOL_ID, "WorkerPools-9");

        for resolved in [None, Some(""), Some("  ")] {
            let endpoint = build_endpoint(
                &message,
                &variables,
                |_| Some("Accounts-12".to_string()),
                |_| resolved.map(str::to_string),
                &InMemoryLog::new(),
            )
            .unwrap();

            assert_eq!(endpoint.default_worker_pool_id.as_deref(), Some("WorkerPools-9"));
        }
    }

    #[test]
    fn test_no_worker_pool_is_not_an_error() {
        let endpoint = build_endpoint(
            &message_properties(),
            &variables(),
            |_| Some("Accounts-12".to_string()),
            no_pool,
            &InMemoryLog::new(),
        )
        .unwrap();

        assert_eq!(endpoint.default_worker_pool_id, None);
    }

    #[test]
    fn test_web_app_and_resource_group_required() {
        for key in [attributes::WEB_APP, attributes::RESOURCE_GROUP] {
            let mut message = message_properties();
            message.insert(key.to_string(), " ".to_string());

            let result = build_endpoint(
                &message,
                &variables(),
                |_| Some("Accounts-12".to_string()),
                no_pool,
                &InMemoryLog::new(),
            );

            assert!(matches!(result, Err(AzWebAppError::MissingAttribute(k)) if k == key));
        }
    }

    #[test]
    fn test_target_guard_message() {
        let err = ensure_web_app_target(Some("TentaclePassive"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The machine <unknown> will not be deployed to because it is not an Azure Web Application deployment target"
        );
        assert!(ensure_web_app_target(Some(DEPLOYMENT_TARGET_TYPE_ID), Some("web")).is_ok());
    }
}
