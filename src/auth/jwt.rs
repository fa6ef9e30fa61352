use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a UUID string
    pub sub: String,
    pub username: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> anyhow::Result<Uuid> {
        Ok(Uuid::parse_str(&self.sub)?)
    }
}

/// Issues and validates HS256 access/refresh token pairs.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            secret: secret.to_string(),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    fn issue(&self, user_id: Uuid, username: &str, token_type: &str, ttl: Duration) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type: token_type.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn issue_access(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        self.issue(user_id, username, TOKEN_TYPE_ACCESS, self.access_ttl)
    }

    pub fn issue_refresh(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        self.issue(user_id, username, TOKEN_TYPE_REFRESH, self.refresh_ttl)
    }

    fn decode_claims(&self, token: &str, expected_type: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        if data.claims.token_type != expected_type {
            anyhow::bail!("wrong token type: expected {expected_type}");
        }
        Ok(data.claims)
    }

    /// Validate a bearer access token.
    pub fn decode_access(&self, token: &str) -> anyhow::Result<Claims> {
        self.decode_claims(token, TOKEN_TYPE_ACCESS)
    }

    /// Validate a refresh token and mint a fresh access token from it.
    pub fn refresh_access(&self, refresh_token: &str) -> anyhow::Result<String> {
        let claims = self.decode_claims(refresh_token, TOKEN_TYPE_REFRESH)?;
        self.issue_access(claims.user_id()?, &claims.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 60, 7)
    }

    #[test]
    fn access_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issuer().issue_access(user_id, "alice").unwrap();
        let claims = issuer().decode_access(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = issuer().issue_refresh(Uuid::new_v4(), "alice").unwrap();
        assert!(issuer().decode_access(&token).is_err());
    }

    #[test]
    fn access_token_cannot_be_used_to_refresh() {
        let token = issuer().issue_access(Uuid::new_v4(), "alice").unwrap();
        assert!(issuer().refresh_access(&token).is_err());
    }

    #[test]
    fn refresh_yields_a_valid_access_token() {
        let user_id = Uuid::new_v4();
        let refresh = issuer().issue_refresh(user_id, "alice").unwrap();
        let access = issuer().refresh_access(&refresh).unwrap();
        let claims = issuer().decode_access(&access).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        // negative TTL pushes exp well past the default decode leeway
        let expired = TokenIssuer::new("test-secret", -5, 7);
        let token = expired.issue_access(Uuid::new_v4(), "alice").unwrap();
        assert!(issuer().decode_access(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenIssuer::new("other-secret", 60, 7);
        let token = other.issue_access(Uuid::new_v4(), "alice").unwrap();
        assert!(issuer().decode_access(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(issuer().decode_access("not-a-jwt").is_err());
    }
}
