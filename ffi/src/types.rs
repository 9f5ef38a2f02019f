//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Success payloads cross the boundary as compact JSON text, so C callers
//! can hand them to whatever JSON library they already use. Errors carry
//! the category the core reports plus the remote code when there is one.

use std::ffi::CString;
use std::os::raw::c_char;

use mailchimp_core::{ApiError, JsonErrorKind};

/// Opaque handle to a `MailChimpClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) inner: mailchimp_core::MailChimpClient,
}

/// Error codes returned in `FfiParseResult`.
#[repr(C)]
pub enum FfiErrorCode {
    Ok = 0,
    Decode = 1,
    Remote = 2,
    Http = 3,
    InvalidParams = 4,
    Panic = 5,
    NullArg = 6,
}

/// JSON decode category, set when `error_code` is `Decode`.
#[repr(C)]
pub enum FfiJsonError {
    None = 0,
    Depth = 1,
    StateMismatch = 2,
    CtrlChar = 3,
    Syntax = 4,
    Utf8 = 5,
}

impl From<JsonErrorKind> for FfiJsonError {
    fn from(kind: JsonErrorKind) -> Self {
        match kind {
            JsonErrorKind::None => FfiJsonError::None,
            JsonErrorKind::Depth => FfiJsonError::Depth,
            JsonErrorKind::StateMismatch => FfiJsonError::StateMismatch,
            JsonErrorKind::CtrlChar => FfiJsonError::CtrlChar,
            JsonErrorKind::Syntax => FfiJsonError::Syntax,
            JsonErrorKind::Utf8 => FfiJsonError::Utf8,
        }
    }
}

/// Result envelope for `mc_parse`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// holds the decoded payload re-encoded as JSON. On failure `data` is null
/// and `error_message` is a human-readable C string. `remote_code` is only
/// meaningful when `has_remote_code` is true.
#[repr(C)]
pub struct FfiParseResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub json_error: FfiJsonError,
    pub has_remote_code: bool,
    pub remote_code: i64,
    pub data: *mut c_char,
}

/// Move a Rust string into a C string owned by the caller.
///
/// Interior NUL bytes cannot be represented; such strings become empty.
pub(crate) fn c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

impl FfiParseResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn failure(error_code: FfiErrorCode, msg: String) -> Self {
        FfiParseResult {
            error_code,
            error_message: c_string(msg),
            json_error: FfiJsonError::None,
            has_remote_code: false,
            remote_code: 0,
            data: std::ptr::null_mut(),
        }
    }

    /// Build a success result carrying the payload as JSON text.
    pub(crate) fn ok(value: &serde_json::Value) -> *mut Self {
        FfiParseResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            json_error: FfiJsonError::None,
            has_remote_code: false,
            remote_code: 0,
            data: c_string(value.to_string()),
        }
        .boxed()
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        let result = match err {
            ApiError::Decode { kind, .. } => FfiParseResult {
                json_error: kind.into(),
                ..Self::failure(FfiErrorCode::Decode, msg)
            },
            ApiError::Remote { code, .. } => FfiParseResult {
                has_remote_code: code.is_some(),
                remote_code: code.unwrap_or(0),
                ..Self::failure(FfiErrorCode::Remote, msg)
            },
            ApiError::Http { .. } => Self::failure(FfiErrorCode::Http, msg),
            ApiError::InvalidParams(_) => Self::failure(FfiErrorCode::InvalidParams, msg),
        };
        result.boxed()
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}")).boxed()
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string()).boxed()
    }
}
