//! Middleware for Gem
//!
//! A middleware wraps the next handler in the chain and returns a new
//! handler. Middleware is applied through a [`Chain`]:
//!
//! ```rust,ignore
//! let app = Chain::new()
//!     .use_middleware(TraceMiddleware::new())
//!     .use_middleware(csrf)
//!     .handler(handler_fn(index));
//! ```

mod chain;
mod trace;

pub use chain::Chain;
pub use trace::TraceMiddleware;

use crate::handler::BoxedHandler;
use std::sync::Arc;

/// Trait for middleware that can be inserted into a [`Chain`]
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`, returning a handler that runs this middleware first
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (**self).wrap(next)
    }
}
