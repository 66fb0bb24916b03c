#![allow(dead_code)]

use std::sync::Arc;

use mockito::ServerGuard;
use taskflow_core::auth::{AuthManager, MemorySessionStore, Session, User};
use taskflow_core::ApiClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub fn signed_in(access: &str, refresh: &str) -> Session {
    Session {
        access_token: Some(access.to_string()),
        refresh_token: Some(refresh.to_string()),
        user: Some(User {
            id: Some(1),
            username: "alice".to_string(),
        }),
    }
}

/// Client against the mock server, returning a handle on its session store.
pub fn client_with(server: &ServerGuard, session: Session) -> (ApiClient, Arc<MemorySessionStore>) {
    client_at(&server.url(), session)
}

pub fn client_at(base_url: &str, session: Session) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(session));
    let auth = AuthManager::new(reqwest::Client::new(), base_url, Box::new(store.clone()));
    (ApiClient::with_auth(auth), store)
}

/// Answer exactly one connection with the raw `response`, then stop listening.
/// Later connections to the returned URL are refused.
pub async fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        drop(listener);

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
    });

    url
}
