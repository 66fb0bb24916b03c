//! Calls to the API's identity endpoints.
//!
//! These bypass the request pipeline: they carry no bearer token and a 401
//! from them must never trigger a refresh.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;
use crate::api::pipeline::error_body;
use crate::api::{join_url, ApiError};
use crate::utils::format::message_from_body;

/// Issues an access/refresh token pair for valid credentials.
pub const TOKEN_PATH: &str = "/api/token/";

/// Exchanges a refresh token for a new access token.
pub const REFRESH_PATH: &str = "/api/token/refresh/";

/// Fallback shown when the server rejects credentials without a message.
const DEFAULT_REJECTION: &str = "Invalid username or password";

#[derive(Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Exchange credentials for a token pair.
pub async fn obtain_token_pair(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<TokenPair, AuthError> {
    let url = join_url(base_url, TOKEN_PATH);
    debug!(url = %url, username, "Requesting token pair");

    let response = client
        .post(&url)
        .json(&Credentials { username, password })
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        return serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("token response: {}", e)));
    }

    let body = error_body(response).await;
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials {
            detail: message_from_body(&body).unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
        }),
        _ => Err(AuthError::Rejected { status, body }),
    }
}

/// Obtain a fresh access token. The refresh token itself is left as is.
pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<String, ApiError> {
    let url = join_url(base_url, REFRESH_PATH);
    debug!(url = %url, "Refreshing access token");

    let response = client
        .post(&url)
        .json(&RefreshRequest {
            refresh: refresh_token,
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = error_body(response).await;
        return Err(ApiError::from_status(status, &body));
    }
    let body = response.text().await?;

    let parsed: RefreshResponse = serde_json::from_str(&body)
        .map_err(|e| ApiError::InvalidResponse(format!("refresh response: {}", e)))?;
    Ok(parsed.access)
}
