//! Stateless request builder and response parser for the MailChimp 1.3 API.
//!
//! # Design
//! `MailChimpClient` holds only the API key and the endpoint resolved from
//! it, and carries no mutable state between calls. `prepare` turns a method
//! name and parameters into a request URL; `parse` turns a response body into
//! a JSON value or an `ApiError`. The caller executes the HTTP round-trip in
//! between, keeping the core deterministic and free of I/O.
//!
//! Neither `prepare` nor `parse` logs: every outcome is returned to the
//! caller.

use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, JsonErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::Params;

/// Response format requested from the API.
pub const OUTPUT_FORMAT: &str = "json";

/// Keys the client always controls, whatever the caller passes.
pub const RESERVED_KEYS: [&str; 3] = ["apikey", "method", "output"];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Deepest array/object nesting a response body may have.
pub const MAX_DEPTH: usize = 512;

/// Synchronous, stateless client for the MailChimp 1.3 API.
#[derive(Debug, Clone)]
pub struct MailChimpClient {
    api_key: String,
    endpoint: Endpoint,
}

impl MailChimpClient {
    /// Build a client for `api_key`, preferring HTTPS when available.
    pub fn new(api_key: &str) -> Self {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let endpoint = Endpoint::resolve(&config.api_key, config.use_ssl, config.secure_transport);
        Self {
            api_key: config.api_key,
            endpoint,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Build the full request URL for `method`.
    ///
    /// The query starts with `apikey`, `method` and `output`, followed by the
    /// caller's parameters in insertion order. Caller values for the reserved
    /// keys are dropped. Spaces encode as `+`.
    pub fn prepare(&self, method: &str, params: &Params) -> String {
        format!("{}?{}", self.endpoint, self.encode_query(method, params))
    }

    /// `prepare` wrapped as a GET request.
    pub fn build_request(&self, method: &str, params: &Params) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.prepare(method, params),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Same parameters as `prepare`, sent as a form body to the bare endpoint.
    ///
    /// Useful when the encoded parameters are too large for a URL.
    pub fn build_form_request(&self, method: &str, params: &Params) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.to_string(),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(self.encode_query(method, params)),
        }
    }

    /// Decode a response body.
    ///
    /// Any body that decodes is a success unless it is an object with a
    /// non-null `error` field. Falsy payloads such as `false`, `0`, `""` or
    /// `null` are valid results, not decode failures.
    pub fn parse(&self, body: &str) -> Result<Value, ApiError> {
        let decoded = decode(body)?;
        if let Some(err) = remote_error(&decoded) {
            return Err(err);
        }
        Ok(decoded)
    }

    /// `parse` for raw bytes; invalid UTF-8 is reported as a decode error.
    pub fn parse_bytes(&self, body: &[u8]) -> Result<Value, ApiError> {
        let body = std::str::from_utf8(body).map_err(|e| ApiError::Decode {
            kind: JsonErrorKind::Utf8,
            detail: e.to_string(),
        })?;
        self.parse(body)
    }

    /// Parse a host response.
    ///
    /// The legacy API reports failures in the body with a 200 status, so the
    /// body is always tried first. A non-2xx status only surfaces as
    /// `ApiError::Http` when the body does not decode.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let success = response.is_success();
        match self.parse(&response.body) {
            Err(ApiError::Decode { .. }) if !success => Err(ApiError::Http {
                status: response.status,
                body: response.body,
            }),
            other => other,
        }
    }

    fn encode_query(&self, method: &str, params: &Params) -> String {
        let mut pairs = Vec::with_capacity(params.len());
        for (key, value) in params.iter().filter(|(k, _)| !RESERVED_KEYS.contains(k)) {
            value.flatten_into(key.to_string(), &mut pairs);
        }

        form_urlencoded::Serializer::new(String::new())
            .append_pair("apikey", &self.api_key)
            .append_pair("method", method)
            .append_pair("output", OUTPUT_FORMAT)
            .extend_pairs(pairs)
            .finish()
    }
}

/// Decode `body`, allowing nesting up to `MAX_DEPTH` levels.
///
/// serde_json's own limit is 128, so it is lifted and the cap is enforced
/// by `exceeds_depth`; `serde_stacker` grows the stack for deep bodies.
fn decode(body: &str) -> Result<Value, ApiError> {
    if exceeds_depth(body, MAX_DEPTH) {
        return Err(ApiError::Decode {
            kind: JsonErrorKind::Depth,
            detail: format!("nesting deeper than {MAX_DEPTH} levels"),
        });
    }

    let mut de = serde_json::Deserializer::from_str(body);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(ApiError::decode)?;
    de.end().map_err(ApiError::decode)?;
    Ok(value)
}

/// Whether `[`/`{` nesting outside of string literals goes past `limit`.
fn exceeds_depth(body: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for b in body.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// Build a `Remote` error when the decoded body carries a non-null `error`.
///
/// Scalars are rendered the way the legacy PHP wrapper cast them to a
/// message: `false` is empty and `true` is `1`.
fn remote_error(decoded: &Value) -> Option<ApiError> {
    let error = decoded.get("error").filter(|e| !e.is_null())?;
    let message = match error {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        other => other.to_string(),
    };
    let code = decoded.get("code").and_then(|c| match c {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| s.parse().ok().and_then(whole_number))
        }
        _ => None,
    });
    Some(ApiError::Remote { message, code })
}

fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}
