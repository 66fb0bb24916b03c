mod support;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mockito::{Matcher, Server};
use serde_json::json;
use taskflow_core::auth::{AuthError, AuthManager, FileSessionStore, SessionStore};
use taskflow_core::{ApiClient, ApiRequest};

use support::{client_at, client_with, signed_in};

#[tokio::test]
async fn login_stores_session_and_authorizes_requests() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/api/token/")
        .match_body(Matcher::Json(json!({"username": "alice", "password": "secret"})))
        .with_status(200)
        .with_body(r#"{"access": "tok1", "refresh": "ref1"}"#)
        .expect(1)
        .create_async()
        .await;
    let protected = server
        .mock("GET", "/api/tasks/statistics/")
        .match_header("authorization", "Bearer tok1")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let (client, store) = client_with(&server, Default::default());
    assert!(!client.is_authenticated());

    let session = client.login("alice", "secret").await.expect("login ok");
    assert_eq!(session.access_token.as_deref(), Some("tok1"));
    assert_eq!(session.refresh_token.as_deref(), Some("ref1"));

    // Opaque token: identity falls back to the submitted username.
    let user = session.user.expect("user");
    assert_eq!(user.username, "alice");
    assert_eq!(user.id, None);

    assert!(client.is_authenticated());
    assert_eq!(store.load().access_token.as_deref(), Some("tok1"));

    client
        .issue(ApiRequest::get("/api/tasks/statistics/"))
        .await
        .expect("authorized request");
    token.assert_async().await;
    protected.assert_async().await;
}

#[tokio::test]
async fn login_decodes_user_id_from_token() {
    let payload = URL_SAFE_NO_PAD.encode(json!({"user_id": 12, "token_type": "access"}).to_string());
    let access = format!("header.{}.signature", payload);

    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token/")
        .with_status(200)
        .with_body(json!({"access": access, "refresh": "ref1"}).to_string())
        .create_async()
        .await;

    let (client, _store) = client_with(&server, Default::default());
    client.login("bob", "pw").await.expect("login ok");

    let user = client.auth().user().expect("user");
    assert_eq!(user.id, Some(12));
    assert_eq!(user.username, "bob");
}

#[tokio::test]
async fn rejected_login_keeps_previous_session() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token/")
        .with_status(401)
        .with_body(r#"{"detail": "No active account found with the given credentials"}"#)
        .create_async()
        .await;

    let (client, store) = client_with(&server, signed_in("old", "old-ref"));
    let err = client.login("alice", "wrong").await.expect_err("bad password");

    match err {
        AuthError::InvalidCredentials { detail } => {
            assert_eq!(detail, "No active account found with the given credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.load(), signed_in("old", "old-ref"));
    assert_eq!(client.auth().access_token().as_deref(), Some("old"));
}

#[tokio::test]
async fn login_network_failure_keeps_previous_session() {
    let (client, store) = client_at("http://127.0.0.1:1", signed_in("old", "old-ref"));
    let err = client.login("alice", "secret").await.expect_err("nothing listens there");

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(store.load(), signed_in("old", "old-ref"));
    assert_eq!(client.auth().access_token().as_deref(), Some("old"));
}

#[tokio::test]
async fn login_server_failure_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token/")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let (client, store) = client_with(&server, Default::default());
    let err = client.login("alice", "secret").await.expect_err("unavailable");

    assert!(matches!(err, AuthError::Rejected { status, .. } if status.as_u16() == 503));
    assert!(store.load().is_empty());
}

#[tokio::test]
async fn malformed_login_response_is_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token/")
        .with_status(200)
        .with_body(r#"{"token": "tok1"}"#)
        .create_async()
        .await;

    let (client, _store) = client_with(&server, Default::default());
    let err = client.login("alice", "secret").await.expect_err("missing fields");
    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn session_survives_restart_and_logout_clears_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token/")
        .with_status(200)
        .with_body(r#"{"access": "tok1", "refresh": "ref1"}"#)
        .create_async()
        .await;

    let first = ApiClient::with_auth(AuthManager::new(
        reqwest::Client::new(),
        server.url(),
        Box::new(FileSessionStore::in_dir(dir.path())),
    ));
    first.login("alice", "secret").await.expect("login ok");

    let restarted = AuthManager::new(
        reqwest::Client::new(),
        server.url(),
        Box::new(FileSessionStore::in_dir(dir.path())),
    );
    assert!(restarted.is_authenticated());
    assert_eq!(restarted.user().map(|u| u.username).as_deref(), Some("alice"));

    restarted.logout();
    restarted.logout();
    assert!(!restarted.is_authenticated());
    assert!(FileSessionStore::in_dir(dir.path()).load().is_empty());
}
