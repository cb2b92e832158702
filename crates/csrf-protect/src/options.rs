use crate::BoxedService;
pub use cookie::SameSite;
use std::fmt;
use std::time::Duration;

/// Cookie name used when no `cookie_name` option is given
pub const DEFAULT_COOKIE_NAME: &str = "csrf_token";

/// Form field name used when no `field_name` option is given
pub const DEFAULT_FIELD_NAME: &str = "csrf.token";

/// Request header checked before the form field
pub const DEFAULT_REQUEST_HEADER: &str = "X-CSRF-Token";

/// Cookie lifetime used when no `max_age` option is given (12 hours)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Resolved protection settings
///
/// Built from [`Options::default`] plus an ordered list of [`CsrfOption`]s.
#[derive(Clone)]
pub struct Options {
    /// Name of the cookie carrying the signed real token.
    pub cookie_name: String,

    /// Form field carrying the masked token.
    pub field_name: String,

    /// Header carrying the masked token (checked first).
    pub request_header: String,

    /// Cookie domain.
    pub domain: Option<String>,

    /// Cookie path.
    pub path: String,

    /// Cookie lifetime, also the signed value's validity window.
    /// Zero makes a session cookie whose value never expires.
    pub max_age: Duration,

    /// Whether the cookie is HTTPS only.
    pub secure: bool,

    /// Whether the cookie is hidden from scripts.
    pub http_only: bool,

    /// SameSite attribute of the cookie.
    pub same_site: SameSite,

    /// Referer hosts (`host[:port]`) accepted besides the request's own host.
    pub trusted_origins: Vec<String>,

    /// Handler producing the response for rejected requests.
    pub error_handler: Option<BoxedService>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            request_header: DEFAULT_REQUEST_HEADER.to_string(),
            domain: None,
            path: "/".to_string(),
            max_age: DEFAULT_MAX_AGE,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            trusted_origins: Vec::new(),
            error_handler: None,
        }
    }
}

impl Options {
    /// Defaults with `opts` applied in order; the last write to a setting wins
    pub fn with<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = CsrfOption>,
    {
        let mut options = Self::default();
        for opt in opts {
            options.apply(opt);
        }
        options
    }

    /// Apply a single option
    pub fn apply(&mut self, opt: CsrfOption) {
        match opt {
            CsrfOption::CookieName(name) => self.cookie_name = name,
            CsrfOption::FieldName(name) => self.field_name = name,
            CsrfOption::RequestHeader(name) => self.request_header = name,
            CsrfOption::Domain(domain) => self.domain = Some(domain),
            CsrfOption::Path(path) => self.path = path,
            CsrfOption::MaxAge(age) => self.max_age = age,
            CsrfOption::Secure(secure) => self.secure = secure,
            CsrfOption::HttpOnly(http_only) => self.http_only = http_only,
            CsrfOption::SameSite(same_site) => self.same_site = same_site,
            CsrfOption::TrustedOrigins(origins) => self.trusted_origins = origins,
            CsrfOption::ErrorHandler(handler) => self.error_handler = Some(handler),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("cookie_name", &self.cookie_name)
            .field("field_name", &self.field_name)
            .field("request_header", &self.request_header)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("max_age", &self.max_age)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("same_site", &self.same_site)
            .field("trusted_origins", &self.trusted_origins)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// One named setting
///
/// Usually created through the functions of the same name, e.g.
/// `csrf_protect::secure(false)`.
#[derive(Clone)]
#[allow(missing_docs)]
pub enum CsrfOption {
    CookieName(String),
    FieldName(String),
    RequestHeader(String),
    Domain(String),
    Path(String),
    MaxAge(Duration),
    Secure(bool),
    HttpOnly(bool),
    SameSite(SameSite),
    TrustedOrigins(Vec<String>),
    ErrorHandler(BoxedService),
}

impl fmt::Debug for CsrfOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CookieName(v) => f.debug_tuple("CookieName").field(v).finish(),
            Self::FieldName(v) => f.debug_tuple("FieldName").field(v).finish(),
            Self::RequestHeader(v) => f.debug_tuple("RequestHeader").field(v).finish(),
            Self::Domain(v) => f.debug_tuple("Domain").field(v).finish(),
            Self::Path(v) => f.debug_tuple("Path").field(v).finish(),
            Self::MaxAge(v) => f.debug_tuple("MaxAge").field(v).finish(),
            Self::Secure(v) => f.debug_tuple("Secure").field(v).finish(),
            Self::HttpOnly(v) => f.debug_tuple("HttpOnly").field(v).finish(),
            Self::SameSite(v) => f.debug_tuple("SameSite").field(v).finish(),
            Self::TrustedOrigins(v) => f.debug_tuple("TrustedOrigins").field(v).finish(),
            Self::ErrorHandler(_) => f.write_str("ErrorHandler(..)"),
        }
    }
}

/// Name of the cookie storing the signed real token
pub fn cookie_name(name: impl Into<String>) -> CsrfOption {
    CsrfOption::CookieName(name.into())
}

/// Name of the form field carrying the masked token
pub fn field_name(name: impl Into<String>) -> CsrfOption {
    CsrfOption::FieldName(name.into())
}

/// Name of the header carrying the masked token
pub fn request_header(name: impl Into<String>) -> CsrfOption {
    CsrfOption::RequestHeader(name.into())
}

/// Cookie domain
pub fn domain(domain: impl Into<String>) -> CsrfOption {
    CsrfOption::Domain(domain.into())
}

/// Cookie path
pub fn path(path: impl Into<String>) -> CsrfOption {
    CsrfOption::Path(path.into())
}

/// Cookie lifetime
pub fn max_age(age: Duration) -> CsrfOption {
    CsrfOption::MaxAge(age)
}

/// Mark the cookie HTTPS only. Pass `false` when developing over plain HTTP.
pub fn secure(secure: bool) -> CsrfOption {
    CsrfOption::Secure(secure)
}

/// Hide the cookie from scripts
pub fn http_only(http_only: bool) -> CsrfOption {
    CsrfOption::HttpOnly(http_only)
}

/// SameSite attribute of the cookie
pub fn same_site(same_site: SameSite) -> CsrfOption {
    CsrfOption::SameSite(same_site)
}

/// Referer hosts accepted on HTTPS requests besides the request's own host
pub fn trusted_origins<I, S>(origins: I) -> CsrfOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CsrfOption::TrustedOrigins(origins.into_iter().map(Into::into).collect())
}

/// Handler producing the response for rejected requests
///
/// The rejection reason is available through
/// [`failure_reason`](crate::failure_reason) on the request it receives.
pub fn error_handler(handler: BoxedService) -> CsrfOption {
    CsrfOption::ErrorHandler(handler)
}
