use crate::protect::Protect;
use crate::{DEFAULT_COOKIE_NAME, DEFAULT_FIELD_NAME};
use bytes::Bytes;
use csrf_protect::{BoxedService, CsrfOption, Options, Protection};
use gem_core::{BoxFuture, BoxedHandler, Middleware, Request, RequestLocals, Response};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// CSRF protection middleware
///
/// Built once at startup and shared by every request; it holds nothing but
/// the configured protection.
///
/// ```rust,ignore
/// use gem_core::{Chain, Middleware};
/// use gem_csrf::{secure, Csrf};
///
/// let csrf = Csrf::new(b"32-byte-long-auth-key", [secure(false)])?;
/// let app = Chain::new().use_middleware(csrf).handler(endpoint);
/// ```
pub struct Csrf<P = Protection> {
    protection: Arc<P>,
}

impl Csrf<Protection> {
    /// Create the middleware from a secret key and options
    ///
    /// The cookie and form field are both named `_csrf` unless `opts`
    /// says otherwise. An empty secret is rejected by the protection
    /// library and its error returned unchanged.
    pub fn new<I>(secret: impl AsRef<[u8]>, opts: I) -> Result<Self, csrf_protect::Error>
    where
        I: IntoIterator<Item = CsrfOption>,
    {
        let opts: Vec<CsrfOption> = default_options().into_iter().chain(opts).collect();
        let protection = csrf_protect::protect(secret, opts)?;
        Ok(Self::with_protection(protection))
    }

    /// Resolved protection settings
    pub fn options(&self) -> &Options {
        self.protection.options()
    }
}

impl<P: Protect> Csrf<P> {
    /// Create the middleware around any [`Protect`] implementation
    pub fn with_protection(protection: P) -> Self {
        Self {
            protection: Arc::new(protection),
        }
    }

    /// Masked token for a request that passed through this middleware
    pub fn token(&self, req: &Request) -> Option<String> {
        self.protection.token(req.extensions())
    }
}

impl<P> Clone for Csrf<P> {
    fn clone(&self) -> Self {
        Self {
            protection: self.protection.clone(),
        }
    }
}

impl<P> fmt::Debug for Csrf<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Csrf").finish_non_exhaustive()
    }
}

impl<P: Protect> Middleware for Csrf<P> {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let protection = self.protection.clone();

        Arc::new(move |req: Request| {
            let protection = protection.clone();
            let next = next.clone();

            Box::pin(async move {
                let method = req.method().clone();
                let path = req.path().to_string();

                let (req, locals) = req.into_http();
                let adaptation = Adaptation::new(locals, next);
                let passed = adaptation.passed.clone();

                let service = protection.protect(adaptation.into_bridge());
                let response = service(req).await;

                let outcome = if passed.load(Ordering::Acquire) {
                    "passed"
                } else {
                    "blocked"
                };
                debug!(
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    outcome,
                    "CSRF check"
                );

                response
            }) as BoxFuture<Response>
        })
    }
}

fn default_options() -> [CsrfOption; 2] {
    [
        csrf_protect::cookie_name(DEFAULT_COOKIE_NAME),
        csrf_protect::field_name(DEFAULT_FIELD_NAME),
    ]
}

/// Per-request state that cannot ride along inside an `http::Request`
struct Adaptation {
    locals: RequestLocals,
    next: BoxedHandler,
    passed: Arc<AtomicBool>,
}

impl Adaptation {
    fn new(locals: RequestLocals, next: BoxedHandler) -> Self {
        Self {
            locals,
            next,
            passed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Standard service that resumes the framework chain
    ///
    /// The request it receives carries whatever the protection attached,
    /// so the rebuilt request replaces the one the chain started with.
    fn into_bridge(self) -> BoxedService {
        let Self {
            locals,
            next,
            passed,
        } = self;

        Arc::new(move |req: http::Request<Bytes>| {
            passed.store(true, Ordering::Release);
            next(Request::from_http(req, locals.clone()))
        })
    }
}
