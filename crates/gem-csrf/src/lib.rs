//! # gem-csrf
//!
//! CSRF protection middleware for the Gem web framework.
//!
//! [`Csrf`] configures a [`csrf_protect`] protection once and adapts it to
//! Gem's request lifecycle: every request is handed to the protection as a
//! standard `http::Request`, and only requests that pass its check continue
//! down the chain. Rejected requests get the protection's `403 Forbidden`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gem_core::{handler_fn, Chain, Html, Request};
//! use gem_csrf::{secure, template_field, Csrf};
//!
//! async fn signup_form(req: Request) -> Html<String> {
//!     Html(format!(
//!         r#"<form method="POST" action="/signup">{}<input name="email"></form>"#,
//!         template_field(req.extensions())
//!     ))
//! }
//!
//! let csrf = Csrf::new(b"32-byte-long-auth-key", [secure(false)])?;
//! let app = Chain::new().use_middleware(csrf).handler(handler_fn(signup_form));
//! gem_core::serve("127.0.0.1:8080", app).await?;
//! ```
//!
//! Templates conventionally expose the hidden input under
//! [`TEMPLATE_TAG`] (`csrfField`):
//!
//! ```html
//! <form method="POST" action="/signup">
//!     {{ csrfField }}
//!     <input type="email" name="email">
//! </form>
//! ```
//!
//! JavaScript clients send the token from [`token`] in the `X-CSRF-Token`
//! header instead.
//!
//! ## Configuration
//!
//! [`Csrf::from_env`] reads `CSRF_AUTH_KEY` and the optional `CSRF_*`
//! settings described in [`config`].

#![warn(missing_docs)]

pub mod config;
mod middleware;
mod protect;

pub use config::{load_dotenv, ConfigError, CsrfSettings};
pub use middleware::Csrf;
pub use protect::Protect;

pub use csrf_protect::{
    cookie_name, domain, error_handler, failure_reason, field_name, http_only, max_age, path,
    request_header, same_site, secure, template_field, token, trusted_origins, unsafe_skip_check,
    CsrfOption, Error, Options, Protection, SameSite, TEMPLATE_TAG,
};

/// Cookie name applied before caller options
pub const DEFAULT_COOKIE_NAME: &str = "_csrf";

/// Form field name applied before caller options
pub const DEFAULT_FIELD_NAME: &str = "_csrf";
