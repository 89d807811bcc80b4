//! Azure naming rules, checked before names are placed in management URLs.

use crate::{AzWebAppError, Result};

/// Maximum length of a web app name.
const MAX_SITE_NAME_LENGTH: usize = 60;

/// Maximum length of a slot name.
const MAX_SLOT_NAME_LENGTH: usize = 59;

/// Maximum length of a resource group name.
const MAX_RESOURCE_GROUP_LENGTH: usize = 90;

/// Validates a web app name.
///
/// Web app names are 1-60 characters of ASCII letters, digits, and hyphens,
/// and may not start or end with a hyphen.
///
/// # Errors
///
/// Returns [`AzWebAppError::InvalidName`] if validation fails.
///
/// # Example
///
/// ```
/// use azwebapp::validation::validate_site_name;
///
/// assert!(validate_site_name("my-web-app").is_ok());
/// assert!(validate_site_name("").is_err());
/// assert!(validate_site_name("-leading").is_err());
/// assert!(validate_site_name("app/../other").is_err());
/// ```
pub fn validate_site_name(name: &str) -> Result<()> {
    validate_hostname_label(name, "web app", MAX_SITE_NAME_LENGTH)
}

/// Validates a deployment slot name.
///
/// Uses the same rules as [`validate_site_name`] with a shorter limit.
pub fn validate_slot_name(name: &str) -> Result<()> {
    validate_hostname_label(name, "slot", MAX_SLOT_NAME_LENGTH)
}

fn validate_hostname_label(name: &str, what: &str, max: usize) -> Result<()> {
    if name.is_empty() {
        return Err(AzWebAppError::InvalidName(format!(
            "{} name cannot be empty",
            what
        )));
    }

    if name.len() > max {
        return Err(AzWebAppError::InvalidName(format!(
            "{} name exceeds maximum length of {} characters",
            what, max
        )));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AzWebAppError::InvalidName(format!(
            "{} name '{}' may only contain letters, digits, and hyphens",
            what, name
        )));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(AzWebAppError::InvalidName(format!(
            "{} name '{}' cannot start or end with a hyphen",
            what, name
        )));
    }

    Ok(())
}

/// Validates a resource group name.
///
/// Resource group names are 1-90 characters of letters, digits, underscores,
/// hyphens, periods, and parentheses, and may not end with a period.
pub fn validate_resource_group_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AzWebAppError::InvalidName(
            "resource group name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_RESOURCE_GROUP_LENGTH {
        return Err(AzWebAppError::InvalidName(format!(
            "resource group name exceeds maximum length of {} characters",
            MAX_RESOURCE_GROUP_LENGTH
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')'))
    {
        return Err(AzWebAppError::InvalidName(format!(
            "resource group name '{}' contains invalid characters",
            name
        )));
    }

    if name.ends_with('.') {
        return Err(AzWebAppError::InvalidName(format!(
            "resource group name '{}' cannot end with a period",
            name
        )));
    }

    Ok(())
}

/// Validates a subscription id, which must be a GUID.
pub fn validate_subscription_id(id: &str) -> Result<()> {
    uuid::Uuid::parse_str(id.trim()).map(|_| ()).map_err(|e| {
        AzWebAppError::InvalidName(format!("subscription id '{}' is not a GUID: {}", id, e))
    })
}
