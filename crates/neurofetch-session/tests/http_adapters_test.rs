//! HTTP adapter behaviour against mocked gateway and backend servers.

use std::time::Duration;

use neurofetch_session::{
    GatewayClient, HttpGatewayClient, HttpRetrievalBackend, RetrievalBackend, SessionError,
    StagedFile, fetch_roster,
};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpRetrievalBackend {
    HttpRetrievalBackend::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn gateway(server: &MockServer) -> HttpGatewayClient {
    HttpGatewayClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

/// A base URL nothing is listening on.
fn dead_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Retrieval backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ingest_posts_multipart_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Documents processed successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = vec![
        StagedFile::new("doc.pdf", vec![1u8; 100]),
        StagedFile::new("notes.txt", "hello"),
    ];
    backend(&server).ingest(&files).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert_eq!(body.matches("name=\"files\"").count(), 2);
    assert!(body.contains("filename=\"doc.pdf\""));
    assert!(body.contains("filename=\"notes.txt\""));
}

#[tokio::test]
async fn ingest_failure_carries_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "No text could be extracted from the documents"
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .ingest(&[StagedFile::new("scan.pdf", vec![0u8; 10])])
        .await
        .unwrap_err();
    match err {
        SessionError::BackendRejected(reason) => {
            assert_eq!(reason, "No text could be extracted from the documents")
        }
        other => panic!("expected BackendRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn ingest_success_false_on_200_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .ingest(&[StagedFile::new("a.txt", "a")])
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::BackendRejected(_)));
}

#[tokio::test]
async fn ingest_unparsable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .ingest(&[StagedFile::new("a.txt", "a")])
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let backend = HttpRetrievalBackend::new(dead_uri(), Duration::from_secs(2)).unwrap();
    let err = backend.query("hi").await.unwrap_err();
    assert!(matches!(err, SessionError::BackendUnavailable(_)));
}

#[tokio::test]
async fn slow_backend_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let backend = HttpRetrievalBackend::new(server.uri(), Duration::from_millis(200)).unwrap();
    let err = backend.query("hi").await.unwrap_err();
    assert!(matches!(err, SessionError::BackendUnavailable(_)));
}

#[tokio::test]
async fn query_sends_message_and_reads_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "hello",
            "agent": "Researcher",
            "trace": ["router", "retriever"]
        })))
        .mount(&server)
        .await;

    let answer = backend(&server).query("hi").await.unwrap();
    assert_eq!(answer.content, "hello");
    assert_eq!(answer.agent, "Researcher");
    assert_eq!(answer.trace, vec!["router", "retriever"]);
}

#[tokio::test]
async fn query_answer_fallbacks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "response": { "summary": "table" },
        })))
        .mount(&server)
        .await;

    let answer = backend(&server).query("q").await.unwrap();
    assert_eq!(answer.content, r#"{"summary":"table"}"#);
    assert_eq!(answer.agent, "Unknown");
    assert!(answer.trace.is_empty());
}

#[tokio::test]
async fn query_accepts_agent_name_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "response": "ok",
            "agent_id": "search",
            "agent_name": "Search Agent"
        })))
        .mount(&server)
        .await;

    let answer = backend(&server).query("q").await.unwrap();
    assert_eq!(answer.agent, "Search Agent");
}

#[tokio::test]
async fn query_tolerates_loose_agent_and_trace_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "numbers" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "ok",
            "agent": 7,
            "trace": "single step"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "nulls" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "ok",
            "agent": null,
            "agent_name": "",
            "trace": [1, { "tool": "search" }]
        })))
        .mount(&server)
        .await;

    let backend = backend(&server);

    let answer = backend.query("numbers").await.unwrap();
    assert_eq!(answer.agent, "7");
    assert_eq!(answer.trace, vec!["single step"]);

    let answer = backend.query("nulls").await.unwrap();
    assert_eq!(answer.agent, "Unknown");
    assert_eq!(answer.trace, vec!["1", r#"{"tool":"search"}"#]);
}

#[tokio::test]
async fn query_rejection_is_backend_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "No conversation chain available. Please process documents first."
        })))
        .mount(&server)
        .await;

    let err = backend(&server).query("q").await.unwrap_err();
    assert!(matches!(err, SessionError::BackendRejected(ref r) if r.starts_with("No conversation")));
}

#[tokio::test]
async fn query_without_response_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "agent": "X" })))
        .mount(&server)
        .await;

    let err = backend(&server).query("q").await.unwrap_err();
    assert!(matches!(err, SessionError::MalformedResponse(_)));
}

#[tokio::test]
async fn roster_renders_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Researcher": "active",
            "Summarizer": { "healthy": true }
        })))
        .mount(&server)
        .await;

    let roster = backend(&server).agents().await.unwrap();
    assert_eq!(roster["Researcher"], "active");
    assert_eq!(roster["Summarizer"], r#"{"healthy":true}"#);
}

#[tokio::test]
async fn roster_failures_yield_empty_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "a", "map"])))
        .mount(&server)
        .await;
    assert!(fetch_roster(&backend(&server)).await.is_empty());

    let unreachable = HttpRetrievalBackend::new(dead_uri(), Duration::from_secs(2)).unwrap();
    assert!(fetch_roster(&unreachable).await.is_empty());
}

// ---------------------------------------------------------------------------
// Authentication gateway
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_login_and_verify() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let user = json!({ "id": id, "email": "a@x.com" });

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "a@x.com", "secret": "pw123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "T",
            "user": user,
            "expires_in": 86400
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user })))
        .mount(&server)
        .await;

    let client = gateway(&server);
    let session = client.login("a@x.com", "pw123456").await.unwrap();
    assert_eq!(session.token, "T");
    assert_eq!(session.user.id, id);

    let profile = client.verify("T").await.unwrap();
    assert_eq!(profile.email, "a@x.com");
}

#[tokio::test]
async fn gateway_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("www-authenticate", "Bearer")
                .set_body_json(json!({ "message": "Unauthorized" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "User already exists" })),
        )
        .mount(&server)
        .await;

    let client = gateway(&server);
    assert!(matches!(
        client.login("a@x.com", "bad").await,
        Err(SessionError::InvalidCredentials)
    ));
    assert!(matches!(
        client.verify("expired").await,
        Err(SessionError::Unauthenticated)
    ));
    assert!(matches!(
        client.signup("a@x.com", "pw123456").await,
        Err(SessionError::Conflict)
    ));
}

#[tokio::test]
async fn gateway_signup_validation_and_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({ "email": "bad", "secret": "pw123456" })))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "invalid email address" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({ "email": "b@x.com", "secret": "pw123456" })))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Something went wrong!" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({ "email": "c@x.com", "secret": "pw123456" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "message": "User created successfully" })),
        )
        .mount(&server)
        .await;

    let client = gateway(&server);
    match client.signup("bad", "pw123456").await {
        Err(SessionError::GatewayRejected(msg)) => assert_eq!(msg, "invalid email address"),
        other => panic!("expected GatewayRejected, got {other:?}"),
    }
    match client.signup("b@x.com", "pw123456").await {
        Err(SessionError::GatewayRejected(msg)) => assert_eq!(msg, "Something went wrong!"),
        other => panic!("expected GatewayRejected, got {other:?}"),
    }
    assert_eq!(
        client.signup("c@x.com", "pw123456").await.unwrap(),
        "User created successfully"
    );
}

#[tokio::test]
async fn unreachable_gateway_is_unavailable() {
    let client = HttpGatewayClient::new(dead_uri(), Duration::from_secs(2)).unwrap();
    assert!(matches!(
        client.verify("T").await,
        Err(SessionError::GatewayUnavailable(_))
    ));
}
