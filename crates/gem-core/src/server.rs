//! HTTP server implementation

use crate::error::ApiError;
use crate::handler::BoxedHandler;
use crate::request::{Request, RequestLocals};
use crate::response::{IntoResponse, Response};
use http::header;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Default maximum request body size (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Serve `handler` on `addr` until the listener fails
///
/// Every request body is collected before the handler runs, so handlers and
/// middleware can read form fields from [`Request::body`]. Bodies larger
/// than [`DEFAULT_BODY_LIMIT`] are answered with `413 Payload Too Large`.
pub async fn serve(
    addr: &str,
    handler: BoxedHandler,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    serve_with_limit(addr, handler, DEFAULT_BODY_LIMIT).await
}

/// Like [`serve`], with a custom request body limit in bytes
pub async fn serve_with_limit(
    addr: &str,
    handler: BoxedHandler,
    body_limit: usize,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Gem server running on http://{}", addr);

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        debug!(%remote_addr, "Accepted connection");
        let io = TokioIo::new(stream);
        let handler = handler.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handle_request(handler, req, body_limit).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Connection error: {}", err);
            }
        });
    }
}

/// Handle a single HTTP request
async fn handle_request(
    handler: BoxedHandler,
    req: hyper::Request<Incoming>,
    body_limit: usize,
) -> Response {
    let (parts, body) = req.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > body_limit) {
        warn!(method = %parts.method, path = %parts.uri.path(), "Rejecting oversized body");
        return too_large(body_limit);
    }

    let body = match Limited::new(body, body_limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(method = %parts.method, path = %parts.uri.path(), "Rejecting oversized body");
            return too_large(body_limit);
        }
        Err(err) => {
            error!(method = %parts.method, path = %parts.uri.path(), "Failed to read body: {}", err);
            return ApiError::bad_request("Failed to read request body").into_response();
        }
    };

    handler(Request::new(parts, body, RequestLocals::default())).await
}

fn too_large(limit: usize) -> Response {
    ApiError::payload_too_large(format!("Request body exceeds the limit of {} bytes", limit))
        .into_response()
}
