//! Boxed handlers

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A handler in the chain: takes the request, produces the response.
///
/// Endpoints and wrapped middleware share this type, so a handler returned
/// by [`Middleware::wrap`](crate::Middleware::wrap) can be wrapped again or
/// served directly.
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// Box an async function as a [`BoxedHandler`]
///
/// # Example
///
/// ```rust,ignore
/// async fn hello(_req: Request) -> &'static str {
///     "Hello, World!"
/// }
///
/// let handler = handler_fn(hello);
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> BoxedHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |req: Request| {
        let fut = f(req);
        Box::pin(async move { fut.await.into_response() }) as BoxFuture<Response>
    })
}
