//! Error types for azwebapp operations.

use thiserror::Error;

/// Result type alias using [`AzWebAppError`].
pub type Result<T> = std::result::Result<T, AzWebAppError>;

/// Errors that can occur while discovering, configuring, or resolving web apps.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum AzWebAppError {
    /// Web app, slot, or resource group was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Health check target does not exist.
    #[error("Could not find site {web_app} in resource group {resource_group}, using Service Principal with subscription {subscription}")]
    SiteNotFound {
        /// Web app name
        web_app: String,
        /// Resource group searched
        resource_group: String,
        /// Subscription of the account used
        subscription: String,
    },

    /// Neither the message attribute nor the account variable resolved to an account.
    ///
    /// The display text is consumed by external tooling and must not change.
    #[error("Account with Id / Name, {0}, not found.")]
    AccountNotFound(String),

    /// A required service message attribute was absent or blank.
    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    /// A required deployment variable was absent.
    #[error("{0} must be specified")]
    Required(String),

    /// No credentials available for the management API.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Site, slot, or resource group name breaks Azure naming rules.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Target discovery context could not be used.
    #[error("invalid target discovery context: {0}")]
    InvalidContext(String),

    /// Management API returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Client operation failed with context.
    #[error("{client}: {operation} {site}: {source}")]
    ClientOperation {
        /// Client name
        client: String,
        /// Operation name (list, get-settings, put-settings, etc.)
        operation: String,
        /// Site the operation targeted
        site: String,
        /// Underlying error
        #[source]
        source: Box<AzWebAppError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service message attribute was not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AzWebAppError {
    /// Creates a client operation error with context.
    ///
    /// This wraps an underlying error with information about which client,
    /// operation, and site caused the failure.
    ///
    /// # Example
    ///
    /// ```
    /// use azwebapp::AzWebAppError;
    ///
    /// let err = AzWebAppError::NotFound("my-app".to_string());
    /// let wrapped = AzWebAppError::client_op("arm", "get-settings", "my-app", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "arm: get-settings my-app: not found: my-app"
    /// );
    /// ```
    pub fn client_op(
        client: impl Into<String>,
        operation: impl Into<String>,
        site: impl Into<String>,
        err: AzWebAppError,
    ) -> Self {
        Self::ClientOperation {
            client: client.into(),
            operation: operation.into(),
            site: site.into(),
            source: Box::new(err),
        }
    }

    /// Maps a management API status code to the closest error variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::NotAuthenticated,
            404 => Self::NotFound(body),
            _ => Self::Http {
                status,
                message: body,
            },
        }
    }
}
