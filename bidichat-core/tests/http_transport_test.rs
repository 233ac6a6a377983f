use bidichat_core::stream::{
    HttpTransport, QueryRequest, QueryTransport, StreamError, StreamOutcome, StreamSettings,
};
use bidichat_core::{Conversation, Role};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_HEADER: &str = "x-session-id";

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::with_client(
        reqwest::Client::new(),
        format!("{}/api/chat", server.uri()),
        SESSION_HEADER,
    )
    .unwrap()
}

fn conversation(server: &MockServer) -> Conversation {
    let settings = StreamSettings {
        failure_message: "failed".to_string(),
        ..StreamSettings::default()
    };
    Conversation::new(Arc::new(transport(server)), settings)
}

#[tokio::test]
async fn test_posts_json_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"query": "سلام"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("درود"))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .open(QueryRequest {
            query: "سلام".into(),
            session_token: None,
        })
        .await
        .unwrap();
    assert_eq!(response.session_token, None);

    let body: Vec<u8> = response
        .body
        .map(|chunk| chunk.unwrap().to_vec())
        .concat()
        .await;
    assert_eq!(String::from_utf8(body).unwrap(), "درود");
}

#[tokio::test]
async fn test_server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = transport(&server)
        .open(QueryRequest {
            query: "q".into(),
            session_token: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err, StreamError::HttpStatus { status: 500 });
}

#[tokio::test]
async fn test_server_error_yields_single_failure_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).insert_header(SESSION_HEADER, "ignored"))
        .mount(&server)
        .await;

    let conversation = conversation(&server);
    let outcome = conversation.send("question").unwrap().outcome().await;
    assert!(matches!(outcome, StreamOutcome::Failed { .. }));

    let messages = conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "failed");
    assert!(!conversation.is_responding());
    assert_eq!(conversation.session().token(), None);
}

#[tokio::test]
async fn test_session_header_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"query": "first"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(SESSION_HEADER, " abc-123 ")
                .set_body_string("Hello world"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"query": "second", "sessionToken": "abc-123"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("again"))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = conversation(&server);
    let first = conversation.send("first").unwrap().outcome().await;
    assert!(matches!(first, StreamOutcome::Completed { .. }));
    assert_eq!(conversation.session().token().as_deref(), Some("abc-123"));

    let second = conversation.send("second").unwrap().outcome().await;
    assert!(matches!(second, StreamOutcome::Completed { .. }));

    let replies: Vec<_> = conversation
        .messages()
        .into_iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| m.content)
        .collect();
    assert_eq!(replies, vec!["Hello world", "again"]);
}

#[tokio::test]
async fn test_empty_success_body_is_missing_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let conversation = conversation(&server);
    let outcome = conversation.send("q").unwrap().outcome().await;
    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::MissingBody,
            ..
        }
    ));
}

#[tokio::test]
async fn test_client_timeout_reports_real_cause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let transport = HttpTransport::with_client(
        client,
        format!("{}/api/chat", server.uri()),
        SESSION_HEADER,
    )
    .unwrap()
    .with_connect_timeout(Duration::from_secs(10));

    let err = transport
        .open(QueryRequest {
            query: "q".into(),
            session_token: None,
        })
        .await
        .unwrap_err();
    match err {
        StreamError::Network { message } => assert!(message.contains("timed out")),
        other => panic!("expected a network error, got {other:?}"),
    }
}
