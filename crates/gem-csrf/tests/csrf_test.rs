use gem_core::{handler_fn, Chain, Middleware, Request, TestClient, TestRequest};
use gem_csrf::{field_name, request_header, secure, template_field, token, Csrf};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SECRET: &[u8] = b"32-byte-long-auth-key-for-tests!";

/// Client whose endpoint echoes the masked token and counts its calls
fn client(csrf: Csrf) -> (TestClient, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let endpoint = handler_fn(move |req: Request| {
        counter.fetch_add(1, Ordering::SeqCst);
        let masked = token(req.extensions()).unwrap_or_default();
        async move { masked }
    });
    (TestClient::new(csrf.wrap(endpoint)), calls)
}

fn csrf() -> Csrf {
    Csrf::new(SECRET, [secure(false)]).unwrap()
}

/// GET once; returns the `_csrf` cookie value and the masked token
async fn handshake(client: &TestClient) -> (String, String) {
    let response = client.get("/signup").await;
    response.assert_status(200);
    let cookie = response.cookie("_csrf").expect("cookie issued");
    (cookie, response.text())
}

#[tokio::test]
async fn test_get_issues_token() {
    let (client, calls) = client(csrf());

    let response = client.get("/signup").await;

    response.assert_status(200);
    assert!(!response.text().is_empty());
    assert!(response.cookie("_csrf").is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_post_without_token_is_blocked() {
    let (client, calls) = client(csrf());

    let response = client
        .request(TestRequest::post("/signup").form(&[("email", "a@example.com")]))
        .await;

    response.assert_status(403);
    assert!(response.text().starts_with("Forbidden"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_post_with_form_token_passes() {
    let (client, calls) = client(csrf());
    let (cookie, masked) = handshake(&client).await;

    let response = client
        .request(
            TestRequest::post("/signup")
                .cookie("_csrf", &cookie)
                .form(&[("email", "a@example.com"), ("_csrf", masked.as_str())]),
        )
        .await;

    response.assert_status(200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_post_with_header_token_passes() {
    let (client, _) = client(csrf());
    let (cookie, masked) = handshake(&client).await;

    let response = client
        .request(
            TestRequest::post("/api/items")
                .cookie("_csrf", &cookie)
                .header("X-CSRF-Token", &masked)
                .body(r#"{"name":"x"}"#),
        )
        .await;

    response.assert_status(200);
}

#[tokio::test]
async fn test_post_with_multipart_token_passes() {
    let (client, calls) = client(csrf());
    let (cookie, masked) = handshake(&client).await;

    let body = format!(
        "--gem\r\nContent-Disposition: form-data; name=\"_csrf\"\r\n\r\n{}\r\n--gem--\r\n",
        masked
    );
    let response = client
        .request(
            TestRequest::post("/signup")
                .cookie("_csrf", &cookie)
                .header("content-type", "multipart/form-data; boundary=gem")
                .body(body),
        )
        .await;

    response.assert_status(200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_custom_request_header() {
    let (client, _) = client(Csrf::new(SECRET, [secure(false), request_header("X-Token")]).unwrap());
    let (cookie, masked) = handshake(&client).await;

    let old_header = client
        .request(
            TestRequest::post("/api")
                .cookie("_csrf", &cookie)
                .header("X-CSRF-Token", &masked),
        )
        .await;
    old_header.assert_status(403);

    let new_header = client
        .request(
            TestRequest::post("/api")
                .cookie("_csrf", &cookie)
                .header("X-Token", &masked),
        )
        .await;
    new_header.assert_status(200);
}

#[tokio::test]
async fn test_field_name_override() {
    let (client, _) = client(Csrf::new(SECRET, [secure(false), field_name("authenticity")]).unwrap());
    let (cookie, masked) = handshake(&client).await;

    let default_field = client
        .request(
            TestRequest::post("/signup")
                .cookie("_csrf", &cookie)
                .form(&[("_csrf", masked.as_str())]),
        )
        .await;
    default_field.assert_status(403);

    let custom_field = client
        .request(
            TestRequest::post("/signup")
                .cookie("_csrf", &cookie)
                .form(&[("authenticity", masked.as_str())]),
        )
        .await;
    custom_field.assert_status(200);
}

#[tokio::test]
async fn test_safe_methods_reach_next() {
    let (client, calls) = client(csrf());

    client.request(TestRequest::get("/")).await.assert_status(200);
    client.request(TestRequest::head("/")).await.assert_status(200);
    client.request(TestRequest::options("/")).await.assert_status(200);

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unsafe_methods_are_checked() {
    let (client, calls) = client(csrf());

    client.request(TestRequest::put("/items/1")).await.assert_status(403);
    client.request(TestRequest::delete("/items/1")).await.assert_status(403);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_path_params_survive_protection() {
    let csrf = csrf();
    let endpoint = handler_fn(|req: Request| {
        let id = req.path_param("id").cloned().unwrap_or_default();
        let field = template_field(req.extensions());
        async move { format!("{}|{}", id, field) }
    });
    let client = TestClient::new(csrf.wrap(endpoint));

    let response = client
        .request(TestRequest::get("/users/42").path_param("id", "42"))
        .await;

    let text = response.text();
    let (id, field) = text.split_once('|').unwrap();
    assert_eq!(id, "42");
    assert!(field.starts_with(r#"<input type="hidden" name="_csrf" value=""#));
}

#[tokio::test]
async fn test_token_via_middleware_handle() {
    let csrf = csrf();
    let handle = csrf.clone();
    let endpoint = handler_fn(move |req: Request| {
        let present = handle.token(&req).is_some();
        async move { present.to_string() }
    });
    let client = TestClient::new(csrf.wrap(endpoint));

    assert_eq!(client.get("/").await.text(), "true");
}

#[tokio::test]
async fn test_composes_in_chain() {
    let endpoint = handler_fn(|_req: Request| async { "created" });
    let app = Chain::new()
        .use_middleware(gem_core::TraceMiddleware::new())
        .use_middleware(csrf())
        .handler(endpoint);
    let client = TestClient::new(app);

    client.request(TestRequest::post("/items")).await.assert_status(403);
    client.get("/items").await.assert_status(200);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let (client, calls) = client(csrf());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let (cookie, masked) = handshake(&client).await;
                let token = if i % 2 == 0 { masked.as_str() } else { "" };
                let response = client
                    .request(
                        TestRequest::post("/signup")
                            .cookie("_csrf", &cookie)
                            .form(&[("_csrf", token)]),
                    )
                    .await;
                (i, response.status().as_u16())
            })
        })
        .collect();

    for task in tasks {
        let (i, status) = task.await.unwrap();
        let expected = if i % 2 == 0 { 200 } else { 403 };
        assert_eq!(status, expected, "request {}", i);
    }

    // 32 handshakes plus 16 accepted posts
    assert_eq!(calls.load(Ordering::SeqCst), 48);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Later options win over the `_csrf` defaults; untouched settings keep them.
    #[test]
    fn prop_caller_options_override_defaults(name in "[a-z][a-z_]{0,11}") {
        let csrf = Csrf::new(SECRET, [field_name(name.clone())]).unwrap();
        prop_assert_eq!(&csrf.options().field_name, &name);
        prop_assert_eq!(csrf.options().cookie_name.as_str(), "_csrf");
    }
}
