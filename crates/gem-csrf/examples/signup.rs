//! Signup form protected against CSRF
//!
//! ```text
//! CSRF_AUTH_KEY=change-me cargo run -p gem-csrf --example signup
//! ```
//!
//! Falls back to a development key and a non-secure cookie when
//! `CSRF_AUTH_KEY` is unset.

use gem_core::{handler_fn, Chain, Html, IntoResponse, Request, Response, TraceMiddleware};
use gem_csrf::{secure, template_field, Csrf, TEMPLATE_TAG};
use http::{Method, StatusCode};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Signup {
    email: String,
}

const FORM: &str = r#"<!doctype html>
<form method="POST" action="/signup">
    {{ csrfField }}
    <input type="email" name="email" placeholder="you@example.com">
    <button type="submit">Sign up</button>
</form>
"#;

async fn signup(req: Request) -> Response {
    match *req.method() {
        Method::POST => match req.form::<Signup>() {
            Ok(form) if form.email.contains('@') => {
                Html("<p>Thanks for signing up!</p>").into_response()
            }
            Ok(_) => (StatusCode::BAD_REQUEST, "invalid email address").into_response(),
            Err(err) => err.into_response(),
        },
        _ => {
            let tag = format!("{{{{ {} }}}}", TEMPLATE_TAG);
            Html(FORM.replace(&tag, &template_field(req.extensions()))).into_response()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gem_csrf=debug")),
        )
        .init();

    let csrf = match Csrf::from_env() {
        Ok(csrf) => csrf,
        Err(err) => {
            tracing::warn!("{}; using a development key", err);
            Csrf::new(b"insecure-development-key", [secure(false)])?
        }
    };

    let app = Chain::new()
        .use_middleware(TraceMiddleware::new())
        .use_middleware(csrf)
        .handler(handler_fn(signup));

    gem_core::serve("127.0.0.1:8080", app).await
}
