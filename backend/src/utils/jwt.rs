use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use safari_booking_shared::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Stateless HS256 token validation. Tokens are issued by the identity
/// service; this backend only needs to mint them for tests and verify them
/// on requests.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.len() < 32 {
            return Err(AppError::Internal(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);
        validation.leeway = 30;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn generate_token(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
        phone: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role,
            exp: (now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough!").unwrap()
    }

    #[test]
    fn round_trips_claims() {
        let jwt = service();
        let user_id = Uuid::new_v4();
        let token = jwt
            .generate_token(user_id, "Asha", "asha@example.com", "+255700000001", UserRole::User)
            .unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.email, "asha@example.com");
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(service().validate_token("not.a.token").is_err());
    }

    #[test]
    fn rejects_short_secret() {
        assert!(JwtService::new("short").is_err());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = JwtService::new("another-secret-key-that-is-long-enough").unwrap();
        let token = issuer
            .generate_token(Uuid::new_v4(), "Eve", "eve@example.com", "", UserRole::User)
            .unwrap();
        assert!(service().validate_token(&token).is_err());
    }
}
