use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

const AUTH_COOKIE_NAME: &str = "auth_token";
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

type HmacSha256 = Hmac<Sha256>;

/// Identity resolved from a verified token; inserted into request extensions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("missing JWT_SECRET")]
    MissingSecret,
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie(headers, AUTH_COOKIE_NAME) {
        return Some(token);
    }

    if let Some(token) = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        return Some(token.to_string());
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|value| value.to_string())
}

pub fn verify_request_token(token: &str, secret: Option<&str>) -> Result<AuthUser, AuthError> {
    let secret = secret.ok_or(AuthError::MissingSecret)?;
    let user_id = verify_jwt_hs256(token, secret)?;
    Ok(AuthUser { id: user_id })
}

fn verify_jwt_hs256(token: &str, secret: &str) -> Result<String, AuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;

    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::InvalidToken)?;
    let alg = header_json
        .get("alg")
        .and_then(|value| value.as_str())
        .ok_or(AuthError::InvalidToken)?;
    if alg != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::InvalidToken)?;

    validate_registered_claims(&payload_json)?;

    // `userId` from our own tokens, `user.id` from tokens minted by the Node API
    payload_json
        .get("userId")
        .or_else(|| payload_json.get("user").and_then(|user| user.get("id")))
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .ok_or(AuthError::InvalidToken)
}

fn validate_registered_claims(payload: &serde_json::Value) -> Result<(), AuthError> {
    let now = Utc::now().timestamp();

    if let Some(exp) = payload.get("exp").and_then(|value| value.as_i64()) {
        if now >= exp {
            return Err(AuthError::InvalidToken);
        }
    }

    if let Some(nbf) = payload.get("nbf").and_then(|value| value.as_i64()) {
        if now < nbf {
            return Err(AuthError::InvalidToken);
        }
    }

    Ok(())
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let trimmed = part.trim();
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &str = "test-secret";

    fn sign_payload(payload: serde_json::Value, secret: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{header_b64}.{payload_b64}.{sig_b64}")
    }

    fn user_token(user_id: &str) -> String {
        let exp = Utc::now().timestamp() + 3600;
        sign_payload(serde_json::json!({"userId": user_id, "exp": exp}), SECRET)
    }

    #[test]
    fn round_trips_signed_token() {
        let token = user_token("user-1");
        let user = verify_request_token(&token, Some(SECRET)).unwrap();
        assert_eq!(user.id, "user-1");
    }

    #[test]
    fn accepts_nested_user_id_claim() {
        let exp = Utc::now().timestamp() + 60;
        let token = sign_payload(serde_json::json!({"user": {"id": "abc"}, "exp": exp}), SECRET);
        assert_eq!(verify_request_token(&token, Some(SECRET)).unwrap().id, "abc");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = user_token("user-1");
        assert!(matches!(
            verify_request_token(&token, Some("other")),
            Err(AuthError::InvalidToken)
        ));

        let expired = sign_payload(serde_json::json!({"userId": "u", "exp": 1}), SECRET);
        assert!(matches!(
            verify_request_token(&expired, Some(SECRET)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn missing_secret_is_reported() {
        assert!(matches!(
            verify_request_token("a.b.c", None),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn token_sources_in_priority_order() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-bearer"));

        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=from-cookie"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }
}
