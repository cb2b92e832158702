use super::Middleware;
use crate::handler::BoxedHandler;
use std::sync::Arc;

/// An ordered list of middleware applied around an endpoint
///
/// Middleware runs in the order it was added: the first one added is the
/// outermost on the way in and the last to see the response on the way out.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the end of the chain
    pub fn use_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    /// Add a middleware to the end of the chain
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Get the number of middleware
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Wrap `endpoint` with every middleware in the chain
    pub fn handler(&self, endpoint: BoxedHandler) -> BoxedHandler {
        // Build from the inside out so the first middleware ends up outermost
        self.middlewares
            .iter()
            .rev()
            .fold(endpoint, |next, middleware| middleware.wrap(next))
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
