use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::RedisService;
use crate::user::model::AuthUser;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

/// Sign a token for `user_id` that expires after `expire_hours`.
pub fn create_token(user_id: &str, secret: &str, expire_hours: i64) -> Result<String, CustomError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(expire_hours))
        .ok_or_else(|| CustomError::InternalServerError("Invalid token expiry".into()))?
        .timestamp() as usize;

    let claims = Claims {
        id: user_id.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".to_string()))
}

/// Sign a token and, when Redis is configured, record it as the user's live session.
pub async fn create_token_with_session(
    user_id: &str,
    config: &AppConfig,
    redis_service: Option<&RedisService>,
) -> Result<String, CustomError> {
    let token = create_token(user_id, &config.jwt_secret, config.jwt_expire_hours)?;

    if let Some(redis) = redis_service {
        let ttl = (config.jwt_expire_hours.max(1) as u64) * 3600;
        redis
            .store_session(user_id, &token, ttl)
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to store session: {}", e)))?;
    }

    Ok(token)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, CustomError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            CustomError::UnauthorizedError("Not authorized, token expired".into())
        }
        _ => CustomError::UnauthorizedError("Not authorized, invalid token".into()),
    })
}

/// Resolve a bearer token to a caller: signature and expiry, the Redis session
/// when one is configured, then the user record itself.
pub async fn authenticate(req: &HttpRequest, token: &str) -> Result<AuthUser, CustomError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| CustomError::InternalServerError("Configuration not registered".into()))?;

    let claims = decode_token(token, &config.jwt_secret)?;

    if let Some(redis_service) = req.app_data::<web::Data<RedisService>>() {
        match redis_service.validate_session(token).await {
            Ok(Some(stored_user_id)) if stored_user_id == claims.id => {}
            Ok(Some(_)) => {
                return Err(CustomError::UnauthorizedError("Session mismatch".into()));
            }
            Ok(None) => {
                return Err(CustomError::UnauthorizedError(
                    "Session expired or invalid".into(),
                ));
            }
            Err(e) => {
                // Redis unavailable: the signed token alone decides
                log::warn!("Session lookup failed, falling back to JWT only: {}", e);
            }
        }
    }

    let user_service = req
        .app_data::<web::Data<UserService>>()
        .ok_or_else(|| CustomError::InternalServerError("User service not registered".into()))?;

    let user_id = parse_object_id(&claims.id, "user")
        .map_err(|_| CustomError::UnauthorizedError("Not authorized, invalid token".into()))?;

    let user = user_service.find_by_id(&user_id).await?.ok_or_else(|| {
        log::warn!("Token presented for missing user {}", user_id);
        CustomError::UnauthorizedError("Not authorized, user not found".into())
    })?;

    Ok(AuthUser::from(&user))
}

/// Bearer validator for `HttpAuthentication::bearer`, used on fully protected resources.
pub async fn verify_token(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(req.request(), credentials.token()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(e) => {
            log::warn!("Rejected request to {}: {}", req.path(), e);
            Err((e.into(), req))
        }
    }
}

/// Invalidate a user's session (logout)
pub async fn invalidate_session(user_id: &str, redis_service: &RedisService) -> Result<(), CustomError> {
    redis_service.invalidate_session(user_id).await.map_err(|e| {
        CustomError::InternalServerError(format!("Failed to invalidate session: {}", e))
    })
}

impl FromRequest for AuthUser {
    type Error = CustomError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // Already resolved by `verify_token`
            if let Some(user) = req.extensions().get::<AuthUser>().cloned() {
                return Ok(user);
            }

            let bearer = BearerAuth::extract(&req)
                .await
                .map_err(|_| CustomError::UnauthorizedError("Not authorized, no token".into()))?;
            let user = authenticate(&req, bearer.token()).await?;
            req.extensions_mut().insert(user.clone());
            Ok(user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let token = create_token("65a1f0c2e4b0a1b2c3d4e5f6", "test-secret", 1).unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.id, "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = create_token("65a1f0c2e4b0a1b2c3d4e5f6", "test-secret", 1).unwrap();
        let err = decode_token(&token, "other-secret").unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Not authorized, invalid token");
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let token = create_token("65a1f0c2e4b0a1b2c3d4e5f6", "test-secret", -2).unwrap();
        let err = decode_token(&token, "test-secret").unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Not authorized, token expired");
    }
}
