//! Tracing middleware
//!
//! Opens an `http_request` span per request and logs method, path, status
//! and duration when the response comes back.

use super::Middleware;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware that creates a tracing span for each request
///
/// # Example
///
/// ```rust,ignore
/// Chain::new()
///     .use_middleware(TraceMiddleware::new().with_field("service", "signup"))
/// ```
#[derive(Clone, Debug)]
pub struct TraceMiddleware {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TraceMiddleware {
    /// Create a new TraceMiddleware logging completions at INFO
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            custom_fields: Vec::new(),
        }
    }

    /// Create a TraceMiddleware logging completions at `level`
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Add a field logged with every completed request
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TraceMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let level = self.level;
        let custom_fields = Arc::new(self.custom_fields.clone());

        Arc::new(move |req: Request| {
            let next = next.clone();
            let custom_fields = custom_fields.clone();
            let method = req.method().to_string();
            let path = req.uri().path().to_string();

            Box::pin(async move {
                let start = Instant::now();
                let span = info_span!(
                    "http_request",
                    method = %method,
                    path = %path,
                    status = tracing::field::Empty,
                    duration_ms = tracing::field::Empty,
                );

                let response = next(req).instrument(span.clone()).await;

                let status = response.status().as_u16();
                let duration_ms = start.elapsed().as_millis() as u64;
                span.record("status", status);
                span.record("duration_ms", duration_ms);

                let fields = custom_fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(" ");

                let _enter = span.enter();
                if response.status().is_client_error() || response.status().is_server_error() {
                    tracing::warn!(%method, %path, status, duration_ms, %fields, "Request failed");
                } else {
                    match level {
                        Level::TRACE => {
                            tracing::trace!(%method, %path, status, duration_ms, %fields, "Request completed")
                        }
                        Level::DEBUG => {
                            tracing::debug!(%method, %path, status, duration_ms, %fields, "Request completed")
                        }
                        Level::INFO => {
                            tracing::info!(%method, %path, status, duration_ms, %fields, "Request completed")
                        }
                        Level::WARN => {
                            tracing::warn!(%method, %path, status, duration_ms, %fields, "Request completed")
                        }
                        Level::ERROR => {
                            tracing::error!(%method, %path, status, duration_ms, %fields, "Request completed")
                        }
                    }
                }

                response
            }) as BoxFuture<Response>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::Chain;
    use crate::request::RequestLocals;
    use bytes::Bytes;
    use http::StatusCode;

    fn request(path: &str) -> Request {
        let (parts, _) = http::Request::builder()
            .uri(path)
            .body(())
            .unwrap()
            .into_parts();
        Request::new(parts, Bytes::new(), RequestLocals::default())
    }

    #[tokio::test]
    async fn test_trace_passes_response_through() {
        let app = Chain::new()
            .use_middleware(TraceMiddleware::with_level(Level::DEBUG).with_field("service", "test"))
            .handler(handler_fn(|_req: Request| async { (StatusCode::CREATED, "made") }));

        let response = app(request("/items")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_trace_passes_errors_through() {
        let app = Chain::new()
            .use_middleware(TraceMiddleware::default())
            .handler(handler_fn(|_req: Request| async { StatusCode::FORBIDDEN }));

        let response = app(request("/items")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
