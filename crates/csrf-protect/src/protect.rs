use crate::context::{skip_check, FailureReason, FieldName, MaskedToken};
use crate::error::{Error, Result};
use crate::options::{CsrfOption, Options};
use crate::store::CookieStore;
use crate::token::{compare, generate_random_bytes, mask, unmask, TOKEN_LENGTH};
use crate::{BoxedService, HttpFuture, HttpResponse};
use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use http_body_util::Full;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build a [`Protection`] from a secret key and ordered options
///
/// Fails with [`Error::InvalidSecret`] when the secret is empty and with
/// [`Error::InvalidCookieOptions`] when the cookie cannot be sent as a header.
pub fn protect<I>(secret: impl AsRef<[u8]>, opts: I) -> Result<Protection>
where
    I: IntoIterator<Item = CsrfOption>,
{
    Protection::new(secret, opts)
}

/// Configured CSRF protection
///
/// Cheap to clone; every clone shares the same immutable settings.
#[derive(Clone)]
pub struct Protection {
    shared: Arc<Shared>,
}

struct Shared {
    store: CookieStore,
    options: Options,
}

impl Protection {
    /// Build a protection from a secret key and ordered options
    pub fn new<I>(secret: impl AsRef<[u8]>, opts: I) -> Result<Self>
    where
        I: IntoIterator<Item = CsrfOption>,
    {
        let store = CookieStore::new(secret.as_ref())?;
        let options = Options::with(opts);

        let sample = store.set_cookie(&[0; TOKEN_LENGTH], &options);
        HeaderValue::from_str(&sample).map_err(|_| Error::InvalidCookieOptions)?;

        Ok(Self {
            shared: Arc::new(Shared { store, options }),
        })
    }

    /// Resolved settings
    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    /// Wrap `inner` so it only runs for requests that pass the check
    pub fn wrap(&self, inner: BoxedService) -> BoxedService {
        let protection = self.clone();
        Arc::new(move |req: http::Request<Bytes>| {
            let protection = protection.clone();
            let inner = inner.clone();
            Box::pin(async move { protection.serve(req, inner).await }) as HttpFuture
        })
    }

    async fn serve(&self, mut req: http::Request<Bytes>, inner: BoxedService) -> HttpResponse {
        let opts = &self.shared.options;

        let (real_token, issued_cookie) = match self.shared.store.get(req.headers(), opts) {
            Ok(token) if token.len() == TOKEN_LENGTH => (token, None),
            other => {
                if let Err(err) = other {
                    if err != Error::NoToken {
                        debug!(reason = %err, "Discarding CSRF cookie");
                    }
                }
                let token = generate_random_bytes(TOKEN_LENGTH);
                let cookie = self.shared.store.set_cookie(&token, opts);
                (token, Some(cookie))
            }
        };

        req.extensions_mut().insert(MaskedToken(mask(&real_token)));
        req.extensions_mut().insert(FieldName(opts.field_name.clone()));

        let checked = !is_safe_method(req.method()) && !skip_check(req.extensions());
        let verdict = if checked {
            self.verify(&req, &real_token).await
        } else {
            Ok(())
        };

        let mut response = match verdict {
            Ok(()) => {
                let mut response = inner(req).await;
                response
                    .headers_mut()
                    .append(header::VARY, HeaderValue::from_static("Cookie"));
                response
            }
            Err(reason) => self.fail(req, reason).await,
        };

        if let Some(cookie) = issued_cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(err) => warn!("Skipping unencodable CSRF cookie: {}", err),
            }
        }

        response
    }

    async fn verify(&self, req: &http::Request<Bytes>, real_token: &[u8]) -> Result<()> {
        if is_tls(req) {
            self.check_referer(req)?;
        }

        let issued = self.request_token(req).await.ok_or(Error::NoToken)?;
        let token = unmask(&issued).ok_or(Error::BadToken)?;
        if !compare(&token, real_token) {
            return Err(Error::BadToken);
        }

        Ok(())
    }

    /// HTTPS requests must come from our own origin or a trusted one
    fn check_referer(&self, req: &http::Request<Bytes>) -> Result<()> {
        let referer = req
            .headers()
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(Error::NoReferer)?;

        let referer: http::Uri = referer.parse().map_err(|_| Error::BadReferer)?;
        let referer_host = referer.authority().map(|a| a.as_str()).ok_or(Error::BadReferer)?;

        let same_origin =
            referer.scheme_str() == Some("https") && Some(referer_host) == request_host(req);
        let trusted = self
            .shared
            .options
            .trusted_origins
            .iter()
            .any(|origin| origin.eq_ignore_ascii_case(referer_host));

        if same_origin || trusted {
            Ok(())
        } else {
            Err(Error::BadReferer)
        }
    }

    /// Masked token from the header, falling back to the form body
    async fn request_token(&self, req: &http::Request<Bytes>) -> Option<String> {
        let opts = &self.shared.options;

        if let Some(token) = req
            .headers()
            .get(opts.request_header.as_str())
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        {
            return Some(token.to_string());
        }

        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())?;
        let essence = content_type.split(';').next().unwrap_or_default().trim();

        if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            serde_urlencoded::from_bytes::<Vec<(String, String)>>(req.body())
                .ok()?
                .into_iter()
                .find(|(key, value)| *key == opts.field_name && !value.is_empty())
                .map(|(_, value)| value)
        } else if essence.eq_ignore_ascii_case("multipart/form-data") {
            multipart_field(content_type, req.body().clone(), &opts.field_name).await
        } else {
            None
        }
    }

    async fn fail(&self, mut req: http::Request<Bytes>, reason: Error) -> HttpResponse {
        debug!(
            method = %req.method(),
            path = %req.uri().path(),
            reason = %reason,
            "CSRF check failed"
        );

        let handler = self.shared.options.error_handler.clone();
        req.extensions_mut().insert(FailureReason(reason.clone()));

        match handler {
            Some(handler) => handler(req).await,
            None => forbidden(&reason),
        }
    }
}

impl std::fmt::Debug for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protection")
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn is_tls(req: &http::Request<Bytes>) -> bool {
    req.uri().scheme_str() == Some("https")
        || req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

/// First non-empty text part named `name` in a `multipart/form-data` body
async fn multipart_field(content_type: &str, body: Bytes, name: &str) -> Option<String> {
    let boundary = multer::parse_boundary(content_type).ok()?;
    let stream = futures_util::stream::once(futures_util::future::ready(Ok::<_, Infallible>(body)));
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some(name) || field.file_name().is_some() {
            continue;
        }
        match field.text().await {
            Ok(value) if !value.is_empty() => return Some(value),
            Ok(_) => continue,
            Err(err) => {
                debug!("Unreadable multipart CSRF field: {}", err);
                return None;
            }
        }
    }

    None
}

fn request_host(req: &http::Request<Bytes>) -> Option<&str> {
    req.uri()
        .authority()
        .map(|a| a.as_str())
        .or_else(|| req.headers().get(header::HOST).and_then(|v| v.to_str().ok()))
}

/// Default rejection: `403 Forbidden - <reason>`
fn forbidden(reason: &Error) -> HttpResponse {
    let body = format!("Forbidden - {}\n", reason);
    let mut response = HttpResponse::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    response
}
