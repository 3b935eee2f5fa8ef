use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Authenticated-user context for one request. Obtained from the auth
/// collaborator, read by handlers, never mutated or persisted.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, expiry_hours: i64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours)).timestamp();

        Self {
            sub: user_id,
            email,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Configured admin login, checked verbatim against `/auth/login` requests.
/// An empty email means no admin is configured and every login is rejected.
#[derive(Clone, Debug)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, email: &str, password: &str) -> bool {
        !self.email.is_empty() && email == self.email && password == self.password
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token generation failed: {0}")]
    TokenGeneration(String),
    #[error("JWT secret is not configured")]
    MissingSecret,
}

/// Auth collaborator contract. `None` means unauthenticated; handlers decide
/// what to do with that based on their configuration.
pub trait SessionAuth: Send + Sync {
    fn get_session(&self, headers: &HeaderMap) -> Option<Session>;
    fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError>;
}

/// Bearer-JWT session validation (HS256). The only request abstraction it
/// reads is the normalized header map, decided at the system boundary.
pub struct JwtSessionAuth {
    secret: String,
    expiry_hours: i64,
}

impl JwtSessionAuth {
    pub fn new(secret: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }
}

impl SessionAuth for JwtSessionAuth {
    fn get_session(&self, headers: &HeaderMap) -> Option<Session> {
        if self.secret.is_empty() {
            tracing::warn!("session check with empty JWT secret; rejecting");
            return None;
        }

        let token = bearer_token(headers)?;
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Some(Session {
                user_id: data.claims.sub,
                email: data.claims.email,
                token: token.to_string(),
                expires_at: data.claims.exp,
            }),
            Err(e) => {
                tracing::debug!("rejected session token: {}", e);
                None
            }
        }
    }

    fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let claims = Claims::new(user_id, email.to_string(), self.expiry_hours);
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::default(), &claims, &encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

/// Extract the Bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> JwtSessionAuth {
        JwtSessionAuth::new("test-secret", 1)
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn issue_then_validate_roundtrip() {
        let auth = auth();
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id, "ana@example.com").unwrap();

        let session = auth.get_session(&headers_with(&token)).unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email, "ana@example.com");
        assert_eq!(session.token, token);
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        assert!(auth().get_session(&HeaderMap::new()).is_none());
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        assert!(auth().get_session(&headers_with("not-a-jwt")).is_none());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = JwtSessionAuth::new("other-secret", 1);
        let token = other.issue_token(Uuid::new_v4(), "x@example.com").unwrap();
        assert!(auth().get_session(&headers_with(&token)).is_none());
    }

    #[test]
    fn admin_credentials_match_verbatim() {
        let creds = AdminCredentials::new("admin@example.com", "s3cret");
        assert!(creds.matches("admin@example.com", "s3cret"));
        assert!(!creds.matches("admin@example.com", "wrong"));
        assert!(!creds.matches("other@example.com", "s3cret"));
    }

    #[test]
    fn unconfigured_admin_rejects_all_logins() {
        let creds = AdminCredentials::new("", "");
        assert!(!creds.matches("", ""));
        assert!(!creds.matches("admin@example.com", ""));
    }

    #[test]
    fn empty_secret_cannot_issue() {
        let auth = JwtSessionAuth::new("", 1);
        assert!(matches!(
            auth.issue_token(Uuid::new_v4(), "x@example.com"),
            Err(AuthError::MissingSecret)
        ));
    }
}
