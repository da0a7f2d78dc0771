// src/safety_handlers.rs
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::get_current_identity;
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{CreateSafetyProtocolRequest, UpdateSafetyProtocolRequest};
use crate::AppState;

pub async fn get_protocols(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let protocols = app_state.safety.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(protocols)))
}

pub async fn get_protocols_by_category(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let protocols = app_state.safety.list_by_category(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(protocols)))
}

pub async fn create_protocol(
    app_state: web::Data<Arc<AppState>>,
    protocol: web::Json<CreateSafetyProtocolRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let created = app_state.safety.create(&identity, protocol.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        created,
        "Safety protocol created successfully".to_string(),
    )))
}

pub async fn get_protocol(app_state: web::Data<Arc<AppState>>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let protocol = app_state.safety.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(protocol)))
}

pub async fn update_protocol(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    update: web::Json<UpdateSafetyProtocolRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let protocol_id = path.into_inner();
    let updated = app_state.safety.update(&identity, &protocol_id, update.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        updated,
        "Safety protocol updated successfully".to_string(),
    )))
}

pub async fn delete_protocol(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    app_state.safety.delete(&identity, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Safety protocol deleted successfully".to_string())))
}
