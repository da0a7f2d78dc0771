use std::sync::Arc;

use actix_web::dev::ServiceRequest;
use actix_web::{web, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserRole};
use crate::AppState;

// ======== IDENTITY ========

/// Authenticated caller attached to each request by [`jwt_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.get_role(),
        }
    }
}

// ======== PASSWORD HASHING ========

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> ApiResult<String>;
    fn verify(&self, password: &str, hash: &str) -> ApiResult<bool>;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> ApiResult<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|_| ApiError::InternalServerError("Failed to hash password".to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> ApiResult<bool> {
        bcrypt::verify(password, hash)
            .map_err(|_| ApiError::InternalServerError("Password verification failed".to_string()))
    }
}

// ======== TOKENS ========

pub trait TokenService: Send + Sync {
    /// Issues a bearer token for the given user id.
    fn issue(&self, user_id: &str) -> ApiResult<String>;
    /// Resolves a token back to the user id it was issued for.
    fn identity(&self, token: &str) -> ApiResult<String>;
    /// Token validity in seconds.
    fn expires_in(&self) -> i64;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl JwtTokenService {
    pub fn new(jwt_secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validity: Duration::hours(expiration_hours),
        }
    }

    fn encode_claims(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| ApiError::InternalServerError("Failed to generate token".to_string()))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: &str) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.validity).timestamp(),
            iat: now.timestamp(),
        };
        self.encode_claims(&claims)
    }

    fn identity(&self, token: &str) -> ApiResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    ApiError::Unauthorized("Invalid token".to_string())
                }
                _ => ApiError::Unauthorized("Token verification failed".to_string()),
            })
    }

    fn expires_in(&self) -> i64 {
        self.validity.num_seconds()
    }
}

// ======== PASSWORD VALIDATION ========

pub fn validate_password_strength(password: &str) -> ApiResult<()> {
    if password.len() < 8 {
        return Err(ApiError::ValidationError("Password must be at least 8 characters".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::ValidationError("Password must contain at least one uppercase letter".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::ValidationError("Password must contain at least one lowercase letter".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::ValidationError("Password must contain at least one digit".to_string()));
    }
    Ok(())
}

// ======== HELPER FUNCTIONS ========

pub fn get_current_identity(req: &HttpRequest) -> ApiResult<Identity> {
    req.extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("No user information found".to_string()))
}

// ======== JWT MIDDLEWARE ========

pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let state = match req.app_data::<web::Data<Arc<AppState>>>() {
        Some(state) => state.clone(),
        None => {
            log::error!("AppState not found in app data");
            return Err((
                ApiError::InternalServerError("Auth service not available".to_string()).into(),
                req,
            ));
        }
    };

    match state.identity.identify(credentials.token()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            Ok(req)
        }
        Err(err) => {
            log::warn!("JWT verification failed: {}", err);
            Err((err.into(), req))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Passw0rd").is_ok());
        assert!(validate_password_strength("short1A").is_err());
        assert!(validate_password_strength("alllowercase1").is_err());
        assert!(validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
    }

    #[test]
    fn test_bcrypt_hasher() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("Passw0rd").unwrap();
        assert_ne!(hash, "Passw0rd");
        assert!(hasher.verify("Passw0rd", &hash).unwrap());
        assert!(!hasher.verify("Wrong000", &hash).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let tokens = JwtTokenService::new("test_secret_0123456789abcdef0123456789", 1);
        let token = tokens.issue("user-1").unwrap();
        assert_eq!(tokens.identity(&token).unwrap(), "user-1");
        assert_eq!(tokens.expires_in(), 3600);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = JwtTokenService::new("first_secret_0123456789abcdef012345", 1);
        let verifier = JwtTokenService::new("second_secret_0123456789abcdef01234", 1);
        let token = issuer.issue("user-1").unwrap();
        assert!(matches!(verifier.identity(&token), Err(ApiError::Unauthorized(_))));
        assert!(matches!(verifier.identity("garbage"), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = JwtTokenService::new("test_secret_0123456789abcdef0123456789", 1);
        let now = Utc::now();
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = tokens.encode_claims(&claims).unwrap();
        match tokens.identity(&token) {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("expected expiry error, got {:?}", other),
        }
    }
}
