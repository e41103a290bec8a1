//! Service configuration.

/// Default cap on request body length: 1 GiB.
pub const DEFAULT_MAX_REQUEST_BODY_LENGTH: u64 = 1_073_741_824;

/// Default media type for content negotiation.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Tunable settings for a [`Service`].
///
/// [`Service`]: crate::Service
///
/// # Example
///
/// ```rust
/// use daedalus_service::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .max_request_body_length(4)
///     .build();
///
/// assert_eq!(config.max_request_body_length(), 4);
/// assert_eq!(config.default_content_type(), "application/json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    max_request_body_length: u64,
    default_content_type: String,
}

impl ServiceConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a configuration.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Cap on request body length in bytes. Zero disables the cap.
    #[must_use]
    pub const fn max_request_body_length(&self) -> u64 {
        self.max_request_body_length
    }

    /// Media type assumed when a request carries no `Content-Type` and
    /// offered when an `Accept` header matches nothing.
    #[must_use]
    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub(crate) fn set_max_request_body_length(&mut self, limit: u64) {
        self.max_request_body_length = limit;
    }

    pub(crate) fn set_default_content_type(&mut self, content_type: String) {
        self.default_content_type = content_type;
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_request_body_length: DEFAULT_MAX_REQUEST_BODY_LENGTH,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    max_request_body_length: Option<u64>,
    default_content_type: Option<String>,
}

impl ServiceConfigBuilder {
    /// Sets the request body length cap in bytes. Zero disables the cap.
    #[must_use]
    pub fn max_request_body_length(mut self, limit: u64) -> Self {
        self.max_request_body_length = Some(limit);
        self
    }

    /// Sets the default media type for negotiation.
    #[must_use]
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = Some(content_type.into());
        self
    }

    /// Builds the configuration, filling unset fields with defaults.
    #[must_use]
    pub fn build(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            max_request_body_length: self
                .max_request_body_length
                .unwrap_or(defaults.max_request_body_length),
            default_content_type: self
                .default_content_type
                .unwrap_or(defaults.default_content_type),
        }
    }
}
