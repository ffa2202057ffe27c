// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use monitrs::domain::models::target::EvasionProfile;
use monitrs::engines::http_strategy::HttpStrategy;
use monitrs::engines::traits::{FetchError, FetchRequest, FetchStrategy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with(status: u16, body: &str, content_type: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(body.to_string(), content_type),
        )
        .mount(&server)
        .await;
    server
}

fn request(server: &MockServer, evasion: EvasionProfile) -> FetchRequest {
    FetchRequest::new(format!("{}/page", server.uri()), evasion)
}

#[tokio::test]
async fn test_successful_fetch_returns_body_and_metadata() {
    let server = server_with(200, "<html>listing</html>", "text/html").await;

    let outcome = HttpStrategy
        .fetch(&request(&server, EvasionProfile::None))
        .await
        .unwrap();

    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.body, "<html>listing</html>");
    assert!(outcome.content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_challenge_page_is_classified_as_blocked() {
    let server = server_with(
        403,
        "<html><title>Just a moment...</title>checking your browser</html>",
        "text/html",
    )
    .await;

    let err = HttpStrategy
        .fetch(&request(&server, EvasionProfile::None))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Blocked { status: 403 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_protocol_error_and_retryable() {
    let body = "x".repeat(512);
    let server = server_with(503, &body, "text/plain").await;

    let err = HttpStrategy
        .fetch(&request(&server, EvasionProfile::None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::ProtocolError { status: 503, .. }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_error_is_not_retryable() {
    let body = "not found page with enough body text to avoid the short-body challenge rule, padded: "
        .repeat(4);
    let server = server_with(404, &body, "text/html").await;

    let err = HttpStrategy
        .fetch(&request(&server, EvasionProfile::None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::ProtocolError { status: 404, .. }
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let request = FetchRequest::new("http://127.0.0.1:1/page", EvasionProfile::None);

    let err = HttpStrategy.fetch(&request).await.unwrap_err();
    assert!(matches!(err, FetchError::Unreachable(_)));
}

#[tokio::test]
async fn test_rotate_identity_uses_pooled_user_agent() {
    let server = server_with(200, "ok body", "text/html").await;

    HttpStrategy
        .fetch(&request(&server, EvasionProfile::RotateIdentity))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let ua = requests[0]
        .headers
        .get("user-agent")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    assert!(monitrs::engines::http_strategy::IDENTITY_POOL.contains(&ua.as_str()));
}
