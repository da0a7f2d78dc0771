// src/dashboard_handlers.rs
use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::AppState;

pub async fn get_metrics(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let metrics = app_state.dashboard.metrics().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

pub async fn get_alerts(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let alerts = app_state.dashboard.alerts().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(alerts)))
}
