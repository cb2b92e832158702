use thiserror::Error;

/// Reasons a request, cookie or configuration is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Empty secret key passed at construction.
    #[error("secret key must not be empty")]
    InvalidSecret,

    /// Cookie domain or path cannot be sent in a `Set-Cookie` header.
    #[error("cookie domain or path contains invalid characters")]
    InvalidCookieOptions,

    /// HTTPS request without a `Referer` header.
    #[error("referer not supplied")]
    NoReferer,

    /// `Referer` from a foreign, untrusted origin.
    #[error("referer invalid")]
    BadReferer,

    /// Unsafe request carrying no token, or no cookie was found.
    #[error("CSRF token not found in request")]
    NoToken,

    /// Token does not match the cookie or cannot be unmasked.
    #[error("CSRF token invalid")]
    BadToken,

    /// Cookie value cannot be decoded.
    #[error("CSRF cookie is malformed")]
    MalformedCookie,

    /// Cookie value was not signed with this secret and name.
    #[error("CSRF cookie signature mismatch")]
    BadSignature,

    /// Cookie value is older than the configured max age.
    #[error("CSRF cookie expired")]
    ExpiredCookie,
}

/// Result type of this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
