//! Gateway behaviour against a one-shot local HTTP responder.

use std::sync::Arc;
use std::time::Duration;

use client::domain::ports::{
    ApiGateway, ApiRequest, InMemorySessionStore, PersistedEntries, SessionStore,
};
use client::domain::{
    Credential, FailureKind, FileId, FileParent, FileTransferService, ProjectId, Session, User,
};
use client::outbound::HttpGateway;
use client::test_support::{RecordingSink, user_json};
use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one connection with `response` and hand back the raw request head.
async fn respond_once(response: String) -> (String, oneshot::Receiver<String>) {
    let (open, gate) = oneshot::channel();
    open.send(()).ok();
    respond_when_opened(response, gate).await
}

/// Like [`respond_once`], but the response waits until `gate` fires. The
/// request head is handed back as soon as it has been read.
async fn respond_when_opened(
    response: String,
    gate: oneshot::Receiver<()>,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut head = Vec::new();
        let mut buffer = [0_u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = socket.read(&mut buffer).await.expect("read");
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buffer[..read]);
        }
        sender
            .send(String::from_utf8_lossy(&head).into_owned())
            .ok();
        gate.await.ok();
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write");
        socket.shutdown().await.ok();
    });
    (format!("http://{address}/api"), receiver)
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn signed_in() -> (Arc<InMemorySessionStore>, Arc<Session>) {
    let store = Arc::new(InMemorySessionStore::with_entries(PersistedEntries::new(
        "tok-9",
        user_json(9, false).to_string(),
    )));
    let session = Arc::new(Session::bootstrap(store.clone()));
    (store, session)
}

#[rstest]
#[tokio::test]
async fn requests_carry_bearer_and_api_headers() {
    let (base, head) = respond_once(http_response(
        "200 OK",
        "application/json",
        r#"{"data":[]}"#,
    ))
    .await;
    let (_store, session) = signed_in();
    let gateway = HttpGateway::new(&base, Duration::from_secs(5), session).expect("gateway");

    let body = gateway
        .send(ApiRequest::get("projects"))
        .await
        .expect("success");

    assert_eq!(body, serde_json::json!({ "data": [] }));
    let head = head.await.expect("request head").to_ascii_lowercase();
    assert!(head.starts_with("get /api/projects http/1.1"));
    assert!(head.contains("authorization: bearer tok-9"));
    assert!(head.contains("x-requested-with: xmlhttprequest"));
    assert!(head.contains("accept: application/json"));
}

#[rstest]
#[tokio::test]
async fn rejected_credential_expires_the_session() {
    let (base, _head) = respond_once(http_response(
        "401 Unauthorized",
        "application/json",
        r#"{"message":"Unauthenticated."}"#,
    ))
    .await;
    let (store, session) = signed_in();
    let gateway =
        HttpGateway::new(&base, Duration::from_secs(5), Arc::clone(&session)).expect("gateway");

    let failure = gateway
        .send(ApiRequest::get("tasks"))
        .await
        .expect_err("unauthenticated");

    assert_eq!(failure.kind(), FailureKind::Authorization);
    assert!(!session.is_authenticated());
    assert!(store.load().expect("load").is_empty());
}

#[rstest]
#[tokio::test]
async fn late_rejection_of_an_old_credential_keeps_the_new_sign_in() {
    let (open, gate) = oneshot::channel();
    let (base, head) = respond_when_opened(
        http_response(
            "401 Unauthorized",
            "application/json",
            r#"{"message":"Unauthenticated."}"#,
        ),
        gate,
    )
    .await;
    let (store, session) = signed_in();
    let gateway = Arc::new(
        HttpGateway::new(&base, Duration::from_secs(5), Arc::clone(&session)).expect("gateway"),
    );
    let in_flight = tokio::spawn({
        let gateway = Arc::clone(&gateway);
        async move { gateway.send(ApiRequest::get("tasks")).await }
    });
    let head = head.await.expect("request head").to_ascii_lowercase();
    assert!(head.contains("authorization: bearer tok-9"));

    let user: User = serde_json::from_value(user_json(9, false)).expect("user");
    session
        .establish(user, Credential::new("tok-10"))
        .expect("sign in again");
    open.send(()).ok();
    let failure = in_flight
        .await
        .expect("request task")
        .expect_err("unauthenticated");

    assert_eq!(failure.kind(), FailureKind::Authorization);
    assert_eq!(session.credential(), Some(Credential::new("tok-10")));
    assert_eq!(store.load().expect("load").token.as_deref(), Some("tok-10"));
}

#[rstest]
#[tokio::test]
async fn json_error_on_download_carries_server_message() {
    let (base, _head) = respond_once(http_response(
        "404 Not Found",
        "application/json; charset=utf-8",
        r#"{"message":"File missing"}"#,
    ))
    .await;
    let (_store, session) = signed_in();
    let gateway =
        Arc::new(HttpGateway::new(&base, Duration::from_secs(5), session).expect("gateway"));
    let sink = Arc::new(RecordingSink::new());
    let service = FileTransferService::new(gateway, Arc::clone(&sink));

    let error = service
        .download_file(
            FileParent::Project(ProjectId::new(1)),
            FileId::new(2),
            "report.pdf",
        )
        .await
        .expect_err("missing");

    assert_eq!(error.to_string(), "File missing");
    assert!(sink.saved().is_empty());
}

#[rstest]
#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);
    let (_store, session) = signed_in();
    let gateway = HttpGateway::new(
        &format!("http://{address}/api"),
        Duration::from_secs(5),
        session,
    )
    .expect("gateway");

    let failure = gateway
        .send(ApiRequest::get("projects"))
        .await
        .expect_err("refused");

    assert_eq!(failure.kind(), FailureKind::Transport);
    assert_eq!(
        failure.to_string(),
        "Unable to reach the server. Check your connection."
    );
}
