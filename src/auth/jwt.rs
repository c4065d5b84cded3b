use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Access-token claims. Tokens are issued by the identity provider; only
/// `sub` and `exp` are relied upon.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    // Provider tokens carry an audience we do not pin.
    validation.validate_aud = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized
    })
}

#[cfg(test)]
pub(crate) fn issue_test_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        exp: now + ttl_secs,
        iat: Some(now),
        email: None,
        role: Some("authenticated".into()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_token_yields_subject() {
        let config = Config::for_tests();
        let user = Uuid::new_v4();
        let token = issue_test_token(user, &config.jwt_secret, 3600);
        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, user);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = Config::for_tests();
        let token = issue_test_token(Uuid::new_v4(), &config.jwt_secret, -3600);
        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = Config::for_tests();
        let token = issue_test_token(Uuid::new_v4(), "some-other-secret", 3600);
        assert!(verify_token(&token, &config).is_err());
    }
}
