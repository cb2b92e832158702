//! Response types for Gem
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Html<T>`] | 200 | text/html |
//! | `StatusCode` | given | - |
//! | `(StatusCode, R)` | given | from `R` |
//! | [`ApiError`](crate::ApiError) | varies | application/json |

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

pub(crate) fn with_body(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/plain; charset=utf-8"),
            Bytes::from_static(self.as_bytes()),
        )
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/plain; charset=utf-8"),
            Bytes::from(self),
        )
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        with_body(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

/// HTML response
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/html; charset=utf-8"),
            Bytes::from(self.0.into()),
        )
    }
}
