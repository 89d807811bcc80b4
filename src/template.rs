//! Cloud templates for App Service targets.
//!
//! Only JSON templates for the `AzureAppService` provider are handled. A
//! template is checked to be a JSON object before use, unless it still
//! contains `#{...}` variable substitutions.

use crate::Result;
use serde_json::{Map, Value};

/// Cloud template provider handled here.
pub const PROVIDER_ID: &str = "AzureAppService";

/// Template format handled here.
pub const TEMPLATE_FORMAT: &str = "JSON";

const SUBSTITUTION_MARKER: &str = "#{";

/// True when `provider_id` and `template_format` name an App Service JSON template.
///
/// Both comparisons are exact.
pub fn can_handle_template(provider_id: &str, template_format: &str) -> bool {
    provider_id == PROVIDER_ID && template_format == TEMPLATE_FORMAT
}

/// Checks that a template is a JSON object.
///
/// Templates containing variable substitutions are not checked, since they
/// are only valid JSON once substituted.
///
/// # Errors
///
/// - [`AzWebAppError::Json`](crate::AzWebAppError::Json): not JSON, or not an object
///
/// # Example
///
/// ```
/// use azwebapp::template::validate_template;
///
/// assert!(validate_template(r#"{"hi": "there"}"#).is_ok());
/// assert!(validate_template("#{blah}").is_ok());
/// assert!(validate_template("[1, 2]").is_err());
/// ```
pub fn validate_template(template: &str) -> Result<()> {
    if template.contains(SUBSTITUTION_MARKER) {
        return Ok(());
    }

    serde_json::from_str::<Map<String, Value>>(template)?;
    Ok(())
}
