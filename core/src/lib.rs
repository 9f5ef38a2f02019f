//! Synchronous request/response core for the MailChimp 1.3 API.
//!
//! # Overview
//! Builds request URLs and parses response bodies without touching the
//! network (host-does-IO pattern). The caller executes the HTTP round-trip,
//! keeping the core deterministic and testable.
//!
//! # Design
//! - The endpoint is derived from the API key's data-center suffix once, at
//!   construction, and never changes afterwards.
//! - `prepare` always controls `apikey`, `method` and `output`.
//! - `parse` returns a tagged `Result`: decode failures and remote `error`
//!   responses are separate `ApiError` variants.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod types;

pub use client::MailChimpClient;
pub use config::ClientConfig;
pub use endpoint::{Endpoint, Scheme};
pub use error::{ApiError, JsonErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{ParamValue, Params};
