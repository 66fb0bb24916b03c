//! Best-effort reading of access-token claims.
//!
//! Tokens are never verified here. The decoded payload only fills in display
//! data such as the user id; nothing gates on it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use super::User;

/// Claim carrying the user's primary key.
const USER_ID_CLAIM: &str = "user_id";

/// Decode the payload (middle) segment of a JWT-shaped token.
pub fn decode_payload(token: &str) -> Option<Value> {
    let segment = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Build the user record for a fresh login.
///
/// Always yields a user carrying `username`; the id is filled in only when the
/// token payload has a usable `user_id` claim.
pub fn user_from_access_token(access_token: &str, username: &str) -> User {
    let id = decode_payload(access_token)
        .as_ref()
        .and_then(|payload| payload.get(USER_ID_CLAIM))
        .and_then(claim_as_id);

    if id.is_none() {
        debug!("Access token has no decodable user_id claim");
    }

    User {
        id,
        username: username.to_string(),
    }
}

fn claim_as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_numeric_user_id() {
        let token = token_with(&json!({"user_id": 42, "token_type": "access"}));
        let user = user_from_access_token(&token, "alice");
        assert_eq!(user.id, Some(42));
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_string_user_id() {
        let token = token_with(&json!({"user_id": "17"}));
        assert_eq!(user_from_access_token(&token, "bob").id, Some(17));
    }

    #[test]
    fn test_opaque_token_still_yields_user() {
        let user = user_from_access_token("tok1", "alice");
        assert_eq!(
            user,
            User {
                id: None,
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_garbage_payload() {
        assert!(decode_payload("a.!!!.c").is_none());
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(decode_payload(&not_json).is_none());
    }

    #[test]
    fn test_missing_claim() {
        let token = token_with(&json!({"sub": "alice"}));
        assert_eq!(user_from_access_token(&token, "alice").id, None);
    }
}
