//! C-ABI wrapper around `mailchimp-core`.
//!
//! # Overview
//! Exposes URL preparation and response parsing through `extern "C"`
//! functions so any language with a C FFI can talk to the MailChimp 1.3 API
//! with its own HTTP stack.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Parameters come in as a JSON object string, which keeps the C surface
//!   to plain `char*` arguments.
//! - The C caller owns all returned pointers and must call the matching
//!   `mc_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use mailchimp_core::{ClientConfig, MailChimpClient, Params};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for `api_key`.
///
/// `use_ssl` selects HTTPS when the library was built with TLS support.
/// Returns null if `api_key` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `mc_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn mc_client_new(api_key: *const c_char, use_ssl: bool) -> *mut FfiClient {
    catch_unwind(|| {
        if api_key.is_null() {
            return std::ptr::null_mut();
        }
        let key = unsafe { CStr::from_ptr(api_key) }.to_str().unwrap_or("");
        let client = MailChimpClient::with_config(ClientConfig::new(key).with_ssl(use_ssl));
        Box::into_raw(Box::new(FfiClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `mc_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mc_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Return the client's base endpoint URL.
///
/// Returns null if `client` is null. Free with `mc_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn mc_client_endpoint(client: *const FfiClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        c_string(client.inner.endpoint().to_string())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Request preparation
// ---------------------------------------------------------------------------

/// Build the request URL for `method`.
///
/// `params_json` must be a JSON object (or null for no parameters).
/// Returns null if `client` or `method` is null, or if `params_json` is not
/// a JSON object. Free with `mc_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn mc_prepare(
    client: *const FfiClient,
    method: *const c_char,
    params_json: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() || method.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let method = unsafe { CStr::from_ptr(method) }.to_str().unwrap_or("");
        let params = if params_json.is_null() {
            Params::new()
        } else {
            let raw = unsafe { CStr::from_ptr(params_json) }.to_str().unwrap_or("");
            match serde_json::from_str::<Params>(raw) {
                Ok(p) => p,
                Err(_) => return std::ptr::null_mut(),
            }
        };
        c_string(client.inner.prepare(method, &params))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse a response body.
///
/// Invalid UTF-8 in `body` is reported as a `Decode` error with
/// `json_error = Utf8`.
#[unsafe(no_mangle)]
pub extern "C" fn mc_parse(client: *const FfiClient, body: *const c_char) -> *mut FfiParseResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiParseResult::null_arg("client");
        }
        if body.is_null() {
            return FfiParseResult::null_arg("body");
        }
        let client = unsafe { &*client };
        let bytes = unsafe { CStr::from_ptr(body) }.to_bytes();
        match client.inner.parse_bytes(bytes) {
            Ok(value) => FfiParseResult::ok(&value),
            Err(e) => FfiParseResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiParseResult::panic("panic in mc_parse"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result returned by `mc_parse`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mc_free_result(result: *mut FfiParseResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            drop(unsafe { CString::from_raw(result.data) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mc_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
