// src/auth_handlers.rs
use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::get_current_identity;
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{LoginRequest, RegisterRequest, SetRoleRequest, UserInfo};
use crate::AppState;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Registration is public; a bearer token, when present, identifies the
/// caller so administrators can create accounts with elevated roles.
pub async fn register(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<RegisterRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let caller = match bearer_token(&http_request) {
        Some(token) => Some(app_state.identity.identify(token).await?),
        None => None,
    };

    let user = app_state.identity.register(caller.as_ref(), request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        UserInfo::from(user),
        "User registered successfully".to_string(),
    )))
}

pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let response = app_state.identity.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub async fn me(app_state: web::Data<Arc<AppState>>, http_request: HttpRequest) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let user = app_state.identity.get(&identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(UserInfo::from(user))))
}

pub async fn list_users(app_state: web::Data<Arc<AppState>>, http_request: HttpRequest) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let users = app_state.identity.list(&identity).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(users)))
}

pub async fn set_user_role(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    request: web::Json<SetRoleRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let user_id = path.into_inner();
    let user = app_state.identity.set_role(&identity, &user_id, &request.role).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        user,
        "Role updated successfully".to_string(),
    )))
}
