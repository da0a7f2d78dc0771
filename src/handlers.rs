// src/handlers.rs
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::ApiResult;
use crate::AppState;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: String) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

// ==================== HEALTH ====================

pub async fn health_check(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&app_state.db_pool)
        .await
    {
        Ok(_) => "ok",
        Err(err) => {
            log::error!("Health check failed to reach the database: {}", err);
            "unavailable"
        }
    };

    let health = HealthStatus {
        status: if database == "ok" { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    };

    if database == "ok" {
        Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::success(health)))
    }
}
