//! # Gem Core
//!
//! The host surface of the Gem web framework: the request and response
//! types handlers see, boxed handlers, the [`Middleware`] wrap trait, a
//! middleware [`Chain`] and a small hyper-backed server.
//!
//! Middleware crates such as `gem-csrf` build on this crate only.
//!
//! ```rust,ignore
//! use gem_core::{handler_fn, Chain, Request, TraceMiddleware};
//!
//! async fn index(_req: Request) -> &'static str {
//!     "hello"
//! }
//!
//! let app = Chain::new()
//!     .use_middleware(TraceMiddleware::new())
//!     .handler(handler_fn(index));
//!
//! gem_core::serve("127.0.0.1:8080", app).await?;
//! ```

#![warn(missing_docs)]

mod error;
mod handler;
pub mod middleware;
mod request;
mod response;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

pub use error::{ApiError, Result};
pub use handler::{handler_fn, BoxFuture, BoxedHandler};
pub use middleware::{Chain, Middleware, TraceMiddleware};
pub use request::{Request, RequestLocals};
pub use response::{Html, IntoResponse, Response};
pub use server::{serve, serve_with_limit, DEFAULT_BODY_LIMIT};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
