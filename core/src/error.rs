//! Error types for the MailChimp client core.
//!
//! # Design
//! Decode failures and remote failures are kept apart: a body that is not
//! JSON says nothing about the operation, while an `error` field in a
//! well-formed body is the API rejecting the call. `Http` only appears when
//! the host hands back a non-2xx status with an undecodable body.

use serde_json::error::Category;
use thiserror::Error;

/// Category of a JSON decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    None,
    Depth,
    StateMismatch,
    CtrlChar,
    Syntax,
    Utf8,
}

impl JsonErrorKind {
    /// Human-readable description of the category.
    pub fn message(self) -> &'static str {
        match self {
            JsonErrorKind::None => "No error has occurred",
            JsonErrorKind::Depth => "The maximum stack depth has been exceeded",
            JsonErrorKind::StateMismatch => "Invalid or malformed JSON",
            JsonErrorKind::CtrlChar => "Control character error, possibly incorrectly encoded",
            JsonErrorKind::Syntax => "Syntax error",
            JsonErrorKind::Utf8 => "Malformed UTF-8 characters, possibly incorrectly encoded",
        }
    }

    /// Map a `serde_json` failure onto a category.
    ///
    /// serde_json exposes only a coarse `Category`, so the finer cases are
    /// recognised by the leading text of its error message.
    pub fn classify(err: &serde_json::Error) -> Self {
        let msg = err.to_string();
        if msg.starts_with("recursion limit exceeded") {
            JsonErrorKind::Depth
        } else if msg.starts_with("control character") {
            JsonErrorKind::CtrlChar
        } else if msg.starts_with("invalid unicode code point")
            || msg.starts_with("lone leading surrogate")
            || msg.starts_with("unexpected end of hex escape")
        {
            JsonErrorKind::Utf8
        } else {
            match err.classify() {
                Category::Data => JsonErrorKind::StateMismatch,
                Category::Io | Category::Syntax | Category::Eof => JsonErrorKind::Syntax,
            }
        }
    }
}

impl std::fmt::Display for JsonErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors returned by `MailChimpClient` parse methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The response body is not valid JSON.
    #[error("Unable to decode response. Error: {kind}")]
    Decode { kind: JsonErrorKind, detail: String },

    /// The API answered with an `error` field.
    #[error("{message}")]
    Remote { message: String, code: Option<i64> },

    /// The host reported a non-2xx status and the body was not JSON.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Request parameters could not be read as a key/value mapping.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
}

impl ApiError {
    pub(crate) fn decode(err: serde_json::Error) -> Self {
        ApiError::Decode {
            kind: JsonErrorKind::classify(&err),
            detail: err.to_string(),
        }
    }

    /// Numeric code carried by a remote error, if the API sent one.
    pub fn code(&self) -> Option<i64> {
        match self {
            ApiError::Remote { code, .. } => *code,
            _ => None,
        }
    }

    /// Decode category, for `Decode` errors only.
    pub fn json_error(&self) -> Option<JsonErrorKind> {
        match self {
            ApiError::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
