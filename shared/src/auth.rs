use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use lambda_http::http::HeaderMap;
use thiserror::Error;

use crate::config::StoreBackend;
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Trusted caller id header, honoured only with the memory store.
pub const LOCAL_USER_HEADER: &str = "X-User-Id";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,
    #[error("Invalid or expired access token")]
    InvalidToken,
    #[error("Identity provider is not configured")]
    NotConfigured,
}

/// Access token from `Authorization: Bearer ...` or the access token cookie.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all("Cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolve the user id (Cognito `sub`) behind an access token.
pub async fn verify_token(cognito: &CognitoClient, token: &str) -> Result<String, AuthError> {
    let user = cognito
        .get_user()
        .access_token(token)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("Cognito get_user failed: {}", e);
            AuthError::InvalidToken
        })?;

    let sub = user
        .user_attributes()
        .iter()
        .find(|a| a.name() == "sub")
        .and_then(|a| a.value())
        .map(|s| s.to_string());
    Ok(sub.unwrap_or_else(|| user.username().to_string()))
}

/// Identify the caller of a request.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, AuthError> {
    if state.config.store_backend == StoreBackend::Memory {
        if let Some(id) = headers.get(LOCAL_USER_HEADER).and_then(|v| v.to_str().ok()) {
            if !id.trim().is_empty() {
                return Ok(id.trim().to_string());
            }
        }
    }

    let token = access_token(headers).ok_or(AuthError::MissingToken)?;
    let cognito = state.cognito_client.as_ref().ok_or(AuthError::NotConfigured)?;
    verify_token(cognito, &token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("Cookie", HeaderValue::from_static("access_token=xyz"));
        assert_eq!(access_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn token_read_from_cookie_list() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_static("theme=dark; access_token=xyz; other=1"),
        );
        assert_eq!(access_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn no_token_without_headers() {
        assert!(access_token(&HeaderMap::new()).is_none());
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic Zm9v"));
        assert!(access_token(&headers).is_none());
    }
}
