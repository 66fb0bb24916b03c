use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{identity, AuthManager};

/// Join the API base URL and an endpoint path with exactly one slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read the body of an error response. A body that can't be read is treated
/// as empty; the status alone still describes the failure.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(%status, error = %e, "Failed to read error response body");
            String::new()
        }
    }
}

/// An outbound request, kept in a form that can be dispatched again after a
/// token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }
}

/// A successful (2xx) response with its body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Retry state of one logical request. Moves forward at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

/// The only path from the application to the API.
///
/// Attaches the current access token, and on a 401 renews it through the
/// refresh endpoint and replays the request exactly once. A session that
/// cannot be renewed is cleared and reported as `ApiError::SessionExpired`.
///
/// Clone is cheap; clones share the session and the refresh gate.
#[derive(Clone)]
pub struct RequestPipeline {
    auth: AuthManager,
    /// Serializes refreshes so concurrent 401s share one refresh call.
    refresh_gate: Arc<Mutex<()>>,
}

impl RequestPipeline {
    pub fn new(auth: AuthManager) -> Self {
        Self {
            auth,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub async fn issue(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = Attempt::Initial;
        let mut token = self.auth.access_token();

        loop {
            let response = self.dispatch(&request, token.as_deref()).await?;
            let status = response.status();

            if status != StatusCode::UNAUTHORIZED {
                return Self::finish(response).await;
            }

            match attempt {
                Attempt::Retried => {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        "Request rejected again after token refresh"
                    );
                    let body = error_body(response).await;
                    return Err(ApiError::from_status(status, &body));
                }
                Attempt::Initial => {
                    debug!(path = %request.path, "Access token rejected, refreshing");
                    attempt = Attempt::Retried;
                    token = Some(self.renew_access(token.as_deref()).await?);
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = join_url(self.auth.base_url(), &request.path);
        debug!(
            method = %request.method,
            url = %url,
            authenticated = token.is_some(),
            "Dispatching request"
        );

        let mut builder = self.auth.http().request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }

    async fn finish(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(ApiResponse { status, body })
        } else {
            let body = error_body(response).await;
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Obtain an access token to replace `rejected`.
    ///
    /// If another request renewed the token while this one waited on the gate,
    /// that token is reused instead of calling the refresh endpoint again.
    async fn renew_access(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.auth.access_token() {
            if rejected != Some(current.as_str()) {
                debug!("Reusing access token renewed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.auth.refresh_token() else {
            debug!("No refresh token available");
            self.auth.expire(None);
            return Err(ApiError::SessionExpired);
        };

        match identity::refresh_access_token(self.auth.http(), self.auth.base_url(), &refresh_token)
            .await
        {
            Ok(access) => {
                if !self.auth.record_access_token(&refresh_token, access.clone()) {
                    // Signed out (or back in) meanwhile; don't replay for the old session.
                    return Err(ApiError::SessionExpired);
                }
                debug!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.auth.expire(Some(&refresh_token));
                Err(ApiError::SessionExpired)
            }
        }
    }
}
