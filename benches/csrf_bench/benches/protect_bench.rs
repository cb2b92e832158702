//! CSRF middleware benchmarks
//!
//! Measures the per-request cost of the adapter and the protection on the
//! paths a real application takes: first contact, a valid form post and a
//! rejected post.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gem_core::{handler_fn, BoxedHandler, Chain, Middleware, Request, RequestLocals, TraceMiddleware};
use gem_csrf::{secure, token, Csrf};
use http::{header, HeaderName, Method};
use http_body_util::BodyExt;
use tokio::runtime::Runtime;

const SECRET: &[u8] = b"32-byte-long-auth-key-for-bench!";

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

fn endpoint() -> BoxedHandler {
    handler_fn(|req: Request| {
        let masked = token(req.extensions()).unwrap_or_default();
        async move { masked }
    })
}

fn csrf() -> Csrf {
    Csrf::new(SECRET, [secure(false)]).expect("csrf")
}

fn request(method: Method, headers: &[(HeaderName, &str)], body: &'static str) -> Request {
    let mut builder = http::Request::builder().method(method).uri("/signup");
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    let req = builder.body(Bytes::from_static(body.as_bytes())).expect("request");
    Request::from_http(req, RequestLocals::default())
}

/// GET once to obtain a cookie pair and a masked token
fn handshake(rt: &Runtime, app: &BoxedHandler) -> (String, String) {
    let response = rt.block_on(app(request(Method::GET, &[], "")));
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("cookie")
        .to_string();
    let body = rt
        .block_on(response.into_body().collect())
        .expect("body")
        .to_bytes();
    (cookie, String::from_utf8_lossy(&body).to_string())
}

/// Benchmark the three request paths through the middleware
fn bench_request_paths(c: &mut Criterion) {
    let rt = runtime();
    let app = csrf().wrap(endpoint());
    let (cookie, masked) = handshake(&rt, &app);
    let form: &'static str = Box::leak(
        serde_urlencoded::to_string([("email", "a@example.com"), ("_csrf", masked.as_str())])
            .expect("form")
            .into_boxed_str(),
    );

    let mut group = c.benchmark_group("csrf_request");

    group.bench_function("get_first_contact", |b| {
        b.iter(|| rt.block_on(app(black_box(request(Method::GET, &[], "")))))
    });

    group.bench_function("get_with_cookie", |b| {
        b.iter(|| {
            let req = request(Method::GET, &[(header::COOKIE, cookie.as_str())], "");
            rt.block_on(app(black_box(req)))
        })
    });

    group.bench_function("post_valid_form", |b| {
        b.iter(|| {
            let req = request(
                Method::POST,
                &[
                    (header::COOKIE, cookie.as_str()),
                    (header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
                ],
                form,
            );
            rt.block_on(app(black_box(req)))
        })
    });

    group.bench_function("post_rejected", |b| {
        b.iter(|| {
            let req = request(Method::POST, &[(header::COOKIE, cookie.as_str())], "");
            rt.block_on(app(black_box(req)))
        })
    });

    group.finish();
}

/// Benchmark the middleware at different depths of a chain
fn bench_chain_depth(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("csrf_chain");

    for depth in [0usize, 1, 3, 5].iter() {
        let mut chain = Chain::new();
        for _ in 0..*depth {
            chain.push(TraceMiddleware::new());
        }
        chain.push(csrf());
        let app = chain.handler(endpoint());

        group.bench_with_input(BenchmarkId::new("trace_layers", depth), depth, |b, _| {
            b.iter(|| rt.block_on(app(black_box(request(Method::GET, &[], "")))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_request_paths, bench_chain_depth);
criterion_main!(benches);
