//! Client construction settings.

use crate::endpoint::secure_transport_available;

/// Settings consumed once by `MailChimpClient::with_config`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key in `<id>-<datacenter>` form.
    pub api_key: String,
    /// Prefer HTTPS. Ignored when `secure_transport` is false.
    pub use_ssl: bool,
    /// Whether the host transport can speak HTTPS.
    pub secure_transport: bool,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            use_ssl: true,
            secure_transport: secure_transport_available(),
        }
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_secure_transport(mut self, available: bool) -> Self {
        self.secure_transport = available;
        self
    }
}
