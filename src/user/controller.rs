use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::database::RedisService;
use crate::middleware::auth::invalidate_session;
use crate::user::model::{
    AuthUser, CreateUserRequest, LoginRequest, UpdateUserRequest, User, UserProfile,
};
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;

fn session_payload(user: &User, token: String) -> serde_json::Value {
    json!({
        "id": user.id.to_hex(),
        "username": user.username,
        "email": user.email,
        "avatar": user.avatar,
        "token": token
    })
}

/// POST /api/auth/register
pub async fn register_user(
    user_service: web::Data<UserService>,
    redis_service: Option<web::Data<RedisService>>,
    user_info: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let (user, token) = user_service
        .create_user(user_info.into_inner(), redis_service.as_ref().map(|r| r.get_ref()))
        .await?;

    Ok(HttpResponse::Created().json(session_payload(&user, token)))
}

/// POST /api/auth/login
pub async fn login_user(
    user_service: web::Data<UserService>,
    redis_service: Option<web::Data<RedisService>>,
    login_info: web::Json<LoginRequest>,
) -> Result<HttpResponse, CustomError> {
    let (user, token) = user_service
        .login(login_info.into_inner(), redis_service.as_ref().map(|r| r.get_ref()))
        .await?;

    Ok(HttpResponse::Ok().json(session_payload(&user, token)))
}

/// POST /api/auth/logout
pub async fn logout_user(
    caller: AuthUser,
    redis_service: Option<web::Data<RedisService>>,
) -> Result<HttpResponse, CustomError> {
    if let Some(redis) = redis_service {
        invalidate_session(&caller.id.to_hex(), &redis).await?;
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Logged out successfully"
    })))
}

/// GET /api/auth/me
pub async fn get_me(
    caller: AuthUser,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.get_user(&caller.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": UserProfile::from(&user)
    })))
}

/// PUT /api/auth/updatedetails
pub async fn update_details(
    caller: AuthUser,
    user_service: web::Data<UserService>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service
        .update_user(&caller, &caller.id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": UserProfile::from(&user)
    })))
}

/// GET /api/users/{id}
pub async fn get_user_profile(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = parse_object_id(&path.into_inner(), "user")?;
    let user = user_service.get_user(&user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": UserProfile::from(&user)
    })))
}

/// PUT /api/users/{id}
pub async fn update_user(
    caller: AuthUser,
    user_service: web::Data<UserService>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let user_id = parse_object_id(&path.into_inner(), "user")?;
    let user = user_service
        .update_user(&caller, &user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": UserProfile::from(&user)
    })))
}
