//! # csrf-protect
//!
//! Cross-site request forgery protection for services built on the standard
//! [`http`] types.
//!
//! A random 32-byte token is kept in an HMAC-signed cookie. Every request
//! that passes through the protection gets a freshly masked copy of that
//! token, readable with [`token`] or rendered as a hidden form input with
//! [`template_field`]. Requests with an unsafe method must echo the masked
//! token back in the request header or the form field, otherwise they are
//! rejected with `403 Forbidden` (or handed to a custom [`error_handler`]).
//!
//! ```rust,ignore
//! use csrf_protect::{protect, secure, field_name};
//!
//! let protection = protect(b"32-byte-long-auth-key", [secure(false), field_name("token")])?;
//! let service = protection.wrap(app);
//! ```

#![warn(missing_docs)]

mod context;
mod error;
mod options;
mod protect;
mod store;
mod token;

use bytes::Bytes;
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use context::{failure_reason, template_field, token, unsafe_skip_check, TEMPLATE_TAG};
pub use error::{Error, Result};
pub use options::{
    cookie_name, domain, error_handler, field_name, http_only, max_age, path, request_header,
    same_site, secure, trusted_origins, CsrfOption, Options, SameSite, DEFAULT_COOKIE_NAME,
    DEFAULT_FIELD_NAME, DEFAULT_MAX_AGE, DEFAULT_REQUEST_HEADER,
};
pub use protect::{protect, Protection};

/// Response produced by a wrapped service
pub type HttpResponse = http::Response<Full<Bytes>>;

/// Future returned by a [`BoxedService`]
pub type HttpFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send + 'static>>;

/// Type-erased request handler over buffered bodies
pub type BoxedService = Arc<dyn Fn(http::Request<Bytes>) -> HttpFuture + Send + Sync>;
