//! End-to-end tests: real listener, real upstream socket.

use serde_json::{json, Value};

mod common;

use common::{
    client, loopback_config, start_programmable_backend, start_proxy, start_silent_backend, MockReply,
};

#[tokio::test]
async fn test_html_relayed_as_text() {
    let (backend, seen) =
        start_programmable_backend(|_| MockReply::new(200, "text/html; charset=utf-8", "<h1>hello</h1>")).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/content/page.html"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "https://app.example");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert!(res.headers().contains_key("x-proxy-timestamp"));
    assert_eq!(res.text().await.unwrap(), "<h1>hello</h1>");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].target, "/content/page.html");
}

#[tokio::test]
async fn test_json_parsed_and_reserialized() {
    let (backend, _seen) =
        start_programmable_backend(|_| MockReply::new(200, "application/json", r#"{ "a" : 1 }"#)).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/graphql/execute.json/site/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"a": 1}));
}

#[tokio::test]
async fn test_only_authorization_forwarded() {
    let (backend, seen) = start_programmable_backend(|_| MockReply::new(200, "application/json", "{}")).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/graphql/execute.json/site/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .header("authorization", "Bearer t0k3n")
        .header("x-custom", "should-not-travel")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].header("authorization"), Some("Bearer t0k3n"));
    assert_eq!(seen[0].header("x-custom"), None);
    assert_eq!(seen[0].header("aem-url"), None);
    assert_eq!(seen[0].header("origin"), None);
}

#[tokio::test]
async fn test_semicolons_escaped_and_trailing_slash_dropped() {
    let (backend, seen) = start_programmable_backend(|_| MockReply::new(200, "application/json", "[]")).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/graphql/execute.json/site/articles;limit=5;offset=10"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}//", backend))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen[0].target,
        "/graphql/execute.json/site/articles%3Blimit=5%3Boffset=10"
    );
}

#[tokio::test]
async fn test_upstream_failure_becomes_500_without_credentials() {
    let (backend, _seen) =
        start_programmable_backend(|_| MockReply::new(503, "text/plain", "Service Unavailable")).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/graphql/execute.json/site/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .header("authorization", "Bearer super-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("server error: "), "{}", message);
    assert!(
        message.contains(&format!("http://{}/graphql/execute.json/site/q", backend)),
        "{}",
        message
    );
    assert!(message.contains("503"), "{}", message);
    assert!(!message.contains("super-secret"), "{}", message);
}

#[tokio::test]
async fn test_invalid_json_body_is_server_error() {
    let (backend, _seen) = start_programmable_backend(|_| MockReply::new(200, "application/json", "not json")).await;
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_unreachable_destination_is_server_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let proxy = start_proxy(loopback_config(&["app.example"])).await;

    let res = client()
        .get(proxy.url("/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_silent_destination_hits_invocation_limit() {
    let backend = start_silent_backend().await;
    let mut config = loopback_config(&["app.example"]);
    config.timeouts.invocation_secs = 1;
    let proxy = start_proxy(config).await;

    let started = std::time::Instant::now();
    let res = client()
        .get(proxy.url("/graphql/execute.json/site/q"))
        .header("origin", "https://app.example")
        .header("aem-url", format!("http://{}", backend))
        .header("authorization", "Bearer super-secret")
        .send()
        .await
        .unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert_eq!(
        message,
        format!(
            "server error: request to http://{}/graphql/execute.json/site/q did not complete within 1s",
            backend
        )
    );
    assert!(!message.contains("super-secret"), "{}", message);
}
