//! Line-oriented service messages: `##octopus[name key="base64" ...]`.
//!
//! Every attribute value is base64-encoded (UTF-8 bytes) on the wire so that
//! quotes, brackets, and whitespace in site names cannot break the line.

use crate::{AzWebAppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::fmt;

const PREFIX: &str = "##octopus[";
const SUFFIX: &str = "]";

/// Message that registers (or updates) an Azure web app deployment target.
pub const CREATE_WEB_APP_TARGET: &str = "create-azurewebapptarget";

/// Message that sets an output variable.
pub const SET_VARIABLE: &str = "setVariable";

/// Attribute names of [`CREATE_WEB_APP_TARGET`].
pub mod attributes {
    pub const NAME: &str = "name";
    pub const WEB_APP_SLOT: &str = "azureWebAppSlot";
    pub const WEB_APP: &str = "azureWebApp";
    pub const RESOURCE_GROUP: &str = "azureResourceGroupName";
    pub const ROLES: &str = "octopusRoles";
    pub const ACCOUNT_ID_OR_NAME: &str = "octopusAccountIdOrName";
    pub const WORKER_POOL_ID_OR_NAME: &str = "octopusDefaultWorkerPoolIdOrName";
    pub const UPDATE_IF_EXISTING: &str = "updateIfExisting";
    pub const IS_DYNAMIC: &str = "isDynamic";
    pub const VALUE: &str = "value";
}

/// A service message with attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMessage {
    name: String,
    properties: Vec<(String, String)>,
}

impl ServiceMessage {
    /// Creates a message with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Appends an attribute. Values are encoded when the message is written.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::ServiceMessage;
    ///
    /// let message = ServiceMessage::new("create-azurewebapptarget")
    ///     .with("name", "my-app");
    /// assert_eq!(
    ///     message.to_string(),
    ///     r#"##octopus[create-azurewebapptarget name="bXktYXBw"]"#
    /// );
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// `setVariable` message for an output variable.
    pub fn set_variable(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(SET_VARIABLE)
            .with(attributes::NAME, name)
            .with(attributes::VALUE, value)
    }

    /// Message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a decoded attribute value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in order.
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Attributes as a map, the shape endpoint resolution consumes.
    pub fn to_property_map(&self) -> HashMap<String, String> {
        self.properties.iter().cloned().collect()
    }

    /// Parses a service message line, decoding every attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`AzWebAppError::InvalidContext`] for malformed lines and
    /// [`AzWebAppError::Base64`] for undecodable values.
    pub fn parse(line: &str) -> Result<Self> {
        let body = line
            .trim()
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(SUFFIX))
            .ok_or_else(|| malformed(line, "missing ##octopus[...] envelope"))?;

        let (name, mut rest) = match body.split_once(' ') {
            Some((name, rest)) => (name, rest),
            None => (body, ""),
        };
        if name.is_empty() {
            return Err(malformed(line, "missing message name"));
        }

        let mut message = Self::new(name);
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            let (key, after_key) = rest
                .split_once("=\"")
                .ok_or_else(|| malformed(line, "expected key=\"value\""))?;
            let (encoded, after_value) = after_key
                .split_once('"')
                .ok_or_else(|| malformed(line, "unterminated value"))?;

            let bytes = STANDARD.decode(encoded)?;
            let value = String::from_utf8(bytes)
                .map_err(|e| malformed(line, &format!("value is not UTF-8: {}", e)))?;
            message.properties.push((key.trim().to_string(), value));
            rest = after_value;
        }

        Ok(message)
    }
}

fn malformed(line: &str, reason: &str) -> AzWebAppError {
    AzWebAppError::InvalidContext(format!("malformed service message '{}': {}", line, reason))
}

impl fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.name)?;
        for (key, value) in &self.properties {
            write!(f, " {}=\"{}\"", key, STANDARD.encode(value.as_bytes()))?;
        }
        write!(f, "{}", SUFFIX)
    }
}
