use csrf_protect::{BoxedService, Protection};
use http::Extensions;

/// What the middleware needs from a CSRF protection library
///
/// Implemented for [`Protection`]; tests substitute their own.
pub trait Protect: Send + Sync + 'static {
    /// Wrap `inner` so it only runs for requests that pass the check
    fn protect(&self, inner: BoxedService) -> BoxedService;

    /// Masked token attached to a request that went through [`protect`](Protect::protect)
    fn token(&self, extensions: &Extensions) -> Option<String>;
}

impl Protect for Protection {
    fn protect(&self, inner: BoxedService) -> BoxedService {
        self.wrap(inner)
    }

    fn token(&self, extensions: &Extensions) -> Option<String> {
        csrf_protect::token(extensions)
    }
}
