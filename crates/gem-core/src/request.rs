//! Request types for Gem

use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use std::collections::HashMap;
use std::sync::Arc;

/// HTTP Request wrapper
///
/// Holds the standard request parts and the collected body, plus the
/// framework-side [`RequestLocals`] that a plain `http::Request` has no
/// place for.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) locals: RequestLocals,
}

/// Framework-side request state: shared application state and the path
/// parameters captured while routing.
#[derive(Clone, Debug, Default)]
pub struct RequestLocals {
    state: Arc<Extensions>,
    path_params: HashMap<String, String>,
}

impl RequestLocals {
    /// Create locals from shared state and captured path parameters
    pub fn new(state: Arc<Extensions>, path_params: HashMap<String, String>) -> Self {
        Self { state, path_params }
    }

    /// Shared application state
    pub fn state(&self) -> &Arc<Extensions> {
        &self.state
    }

    /// Captured path parameters
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }
}

impl Request {
    /// Create a new request from parts
    pub fn new(parts: Parts, body: Bytes, locals: RequestLocals) -> Self {
        Self {
            parts,
            body,
            locals,
        }
    }

    /// Rebuild a framework request from a standard request and its locals
    pub fn from_http(req: http::Request<Bytes>, locals: RequestLocals) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body, locals)
    }

    /// Split into a standard request and the framework-side locals
    pub fn into_http(self) -> (http::Request<Bytes>, RequestLocals) {
        (http::Request::from_parts(self.parts, self.body), self.locals)
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Get the collected body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get path parameters
    pub fn path_params(&self) -> &HashMap<String, String> {
        self.locals.path_params()
    }

    /// Get a specific path parameter
    pub fn path_param(&self, name: &str) -> Option<&String> {
        self.locals.path_params().get(name)
    }

    /// Get shared state
    pub fn state(&self) -> &Arc<Extensions> {
        self.locals.state()
    }

    /// Decode an `application/x-www-form-urlencoded` body
    pub fn form<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        serde_urlencoded::from_bytes(&self.body)
            .map_err(|e| crate::ApiError::bad_request(format!("Invalid form body: {}", e)))
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Marker(&'static str);

    fn sample() -> Request {
        let (parts, _) = http::Request::builder()
            .method(Method::POST)
            .uri("/users/42?active=1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts();

        let mut state = Extensions::new();
        state.insert(Marker("app"));
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());

        Request::new(
            parts,
            Bytes::from_static(b"name=alice&email=a%40example.com"),
            RequestLocals::new(Arc::new(state), params),
        )
    }

    #[test]
    fn test_accessors() {
        let req = sample();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users/42");
        assert_eq!(req.query_string(), Some("active=1"));
        assert_eq!(req.path_param("id").map(String::as_str), Some("42"));
        assert_eq!(req.state().get::<Marker>(), Some(&Marker("app")));
    }

    #[test]
    fn test_http_round_trip_keeps_locals_and_extensions() {
        let (mut http_req, locals) = sample().into_http();
        http_req.extensions_mut().insert(Marker("from-http"));

        let req = Request::from_http(http_req, locals);
        assert_eq!(req.extensions().get::<Marker>(), Some(&Marker("from-http")));
        assert_eq!(req.path_param("id").map(String::as_str), Some("42"));
        assert_eq!(req.state().get::<Marker>(), Some(&Marker("app")));
        assert_eq!(req.body().as_ref(), b"name=alice&email=a%40example.com");
    }

    #[test]
    fn test_form_decoding() {
        #[derive(serde::Deserialize)]
        struct Signup {
            name: String,
            email: String,
        }

        let form: Signup = sample().form().unwrap();
        assert_eq!(form.name, "alice");
        assert_eq!(form.email, "a@example.com");
    }
}
