//! TestClient for integration testing without network binding
//!
//! Sends simulated requests through a fully wrapped handler.
//!
//! ```rust,ignore
//! use gem_core::{handler_fn, Request, TestClient, TestRequest};
//!
//! #[tokio::test]
//! async fn test_hello() {
//!     let client = TestClient::new(handler_fn(|_req: Request| async { "Hello" }));
//!     let response = client.get("/").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello");
//! }
//! ```

use crate::handler::BoxedHandler;
use crate::request::{Request, RequestLocals};
use crate::response::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Test client for integration testing without network binding
#[derive(Clone)]
pub struct TestClient {
    handler: BoxedHandler,
    state: Arc<http::Extensions>,
}

impl TestClient {
    /// Create a new test client around a wrapped handler
    pub fn new(handler: BoxedHandler) -> Self {
        Self {
            handler,
            state: Arc::new(http::Extensions::new()),
        }
    }

    /// Share `state` with every request this client sends
    pub fn with_state(mut self, state: http::Extensions) -> Self {
        self.state = Arc::new(state);
        self
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a request with full control
    ///
    /// ```rust,ignore
    /// let response = client.request(
    ///     TestRequest::post("/signup")
    ///         .cookie("_csrf", &cookie)
    ///         .form(&[("_csrf", token.as_str())])
    /// ).await;
    /// ```
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let request = req.into_request(self.state.clone());
        TestResponse::from_response((self.handler)(request).await).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    path_params: HashMap<String, String>,
}

impl TestRequest {
    /// Create a new request with the given method and path
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            path_params: HashMap::new(),
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a HEAD request
    pub fn head(path: &str) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// Create an OPTIONS request
    pub fn options(path: &str) -> Self {
        Self::new(Method::OPTIONS, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request
    ///
    /// Repeated names are appended, not replaced.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, val);
        }
        self
    }

    /// Add a `Cookie` header carrying `name=value`
    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header("cookie", &format!("{}={}", name, value))
    }

    /// Set the request body as an URL-encoded form
    ///
    /// This sets the Content-Type header to `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        if let Ok(encoded) = serde_urlencoded::to_string(body) {
            self.body = Bytes::from(encoded);
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a captured path parameter
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    fn into_request(self, state: Arc<http::Extensions>) -> Request {
        let uri: http::Uri = self.path.parse().unwrap_or_else(|_| http::Uri::from_static("/"));
        let mut req = http::Request::new(());
        *req.method_mut() = self.method;
        *req.uri_mut() = uri;
        *req.headers_mut() = self.headers;
        let (parts, _) = req.into_parts();

        Request::new(parts, self.body, RequestLocals::new(state, self.path_params))
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Get the response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Value of the first `Set-Cookie` entry named `name`
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }
}
