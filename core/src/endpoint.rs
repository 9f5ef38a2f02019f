//! Regional endpoint resolution from an API key.
//!
//! # Design
//! Legacy MailChimp keys carry their data-center routing token after the
//! first hyphen (`<id>-us1`). The base URL is derived once, when the client
//! is built, and is never recomputed for the life of that client. A key
//! without a hyphen resolves to an empty token rather than failing, so
//! construction stays infallible; the remote side rejects the request.

use std::fmt;

use tracing::{debug, warn};

/// API generation targeted by every prepared URL.
pub const API_VERSION: &str = "1.3";

/// Host suffix appended to the data-center token.
pub const API_DOMAIN: &str = "api.mailchimp.com";

/// URL scheme of the resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the host transport this crate was built for can speak HTTPS.
///
/// Controlled by the `tls` cargo feature, which is on by default.
pub fn secure_transport_available() -> bool {
    cfg!(feature = "tls")
}

/// Extract the data-center token: everything after the first `-`.
///
/// Returns an empty string when the key has no hyphen.
pub fn datacenter(api_key: &str) -> &str {
    api_key.split_once('-').map(|(_, dc)| dc).unwrap_or("")
}

/// Immutable `scheme://<dc>.api.mailchimp.com/1.3/` base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    datacenter: String,
    base: String,
}

impl Endpoint {
    /// Resolve the endpoint for `api_key`, probing the build for TLS support.
    pub fn new(api_key: &str, use_ssl: bool) -> Self {
        Self::resolve(api_key, use_ssl, secure_transport_available())
    }

    /// Resolve with an explicit secure-transport capability.
    ///
    /// HTTPS is chosen only when the caller asks for it and the transport
    /// supports it.
    pub fn resolve(api_key: &str, use_ssl: bool, secure_transport: bool) -> Self {
        let datacenter = datacenter(api_key);
        if datacenter.is_empty() {
            warn!("API key has no data-center suffix, endpoint host will be incomplete");
        }

        let scheme = if use_ssl && secure_transport {
            Scheme::Https
        } else {
            Scheme::Http
        };
        let base = format!("{scheme}://{datacenter}.{API_DOMAIN}/{API_VERSION}/");
        debug!(endpoint = %base, "resolved MailChimp endpoint");

        Self {
            scheme,
            datacenter: datacenter.to_string(),
            base,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn datacenter(&self) -> &str {
        &self.datacenter
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.base
    }
}
