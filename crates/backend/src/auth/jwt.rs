//! HS256 session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::types::{AuthConfig, Claims};

/// Tokens older than this many seconds are reissued by `require_auth`.
const REFRESH_AFTER_SECONDS: i64 = 24 * 60 * 60;

/// Issue a token for `user_id` that expires after the configured number of days.
pub fn create_token(
    config: &AuthConfig,
    user_id: Uuid,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        iat: issued.timestamp(),
        exp: (issued + Duration::days(config.token_duration_days)).timestamp(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
}

/// Check signature and expiry, returning the claims.
pub fn validate_token(
    config: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256)).map(|data| data.claims)
}

pub fn should_refresh(claims: &Claims) -> bool {
    Utc::now().timestamp() - claims.iat > REFRESH_AFTER_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            token_duration_days: 7,
            cookie_name: "shiftsync_token".to_string(),
            cookie_secure: false,
        }
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = create_token(&config, user_id, "test@example.com").expect("should create token");

        let claims = validate_token(&config, &token).expect("should validate token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 86400);
        assert!(!should_refresh(&claims));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = test_config();
        let result = validate_token(&config, "invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token =
            create_token(&config, Uuid::new_v4(), "test@example.com").expect("should create token");

        let mut wrong_config = config;
        wrong_config.jwt_secret = "wrong-secret".to_string();

        let result = validate_token(&wrong_config, &token);
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = test_config();
        config.token_duration_days = -2;
        let token =
            create_token(&config, Uuid::new_v4(), "test@example.com").expect("should create token");

        assert!(validate_token(&config, &token).is_err());
    }

    #[test]
    fn test_old_token_should_refresh() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            iat: now - 2 * 86400,
            exp: now + 5 * 86400,
        };
        assert!(should_refresh(&claims));
    }
}
