// src/chemical_handlers.rs
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::get_current_identity;
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{CreateChemicalRequest, ExpiringQuery, UpdateChemicalRequest};
use crate::AppState;

pub async fn get_chemicals(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let chemicals = app_state.inventory.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(chemicals)))
}

pub async fn create_chemical(
    app_state: web::Data<Arc<AppState>>,
    chemical: web::Json<CreateChemicalRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let created = app_state.inventory.create(&identity, chemical.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        created,
        "Chemical created successfully".to_string(),
    )))
}

pub async fn get_chemical(app_state: web::Data<Arc<AppState>>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let chemical = app_state.inventory.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(chemical)))
}

pub async fn update_chemical(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    update: web::Json<UpdateChemicalRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let chemical_id = path.into_inner();
    let updated = app_state.inventory.update(&identity, &chemical_id, update.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        updated,
        "Chemical updated successfully".to_string(),
    )))
}

pub async fn delete_chemical(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    app_state.inventory.delete(&identity, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Chemical deleted successfully".to_string())))
}

pub async fn get_low_stock(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let chemicals = app_state.inventory.list_low_stock().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(chemicals)))
}

/// `?days=N`, defaulting to the configured expiry window.
pub async fn get_expiring_soon(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<ExpiringQuery>,
) -> ApiResult<HttpResponse> {
    let days = query.days.unwrap_or(app_state.config.alerts.expiry_window_days);
    let chemicals = app_state.inventory.list_expiring_within(days).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(chemicals)))
}

#[cfg(test)]
mod tests {
    use crate::configure_routes;
    use crate::models::UserRole;
    use crate::test_support::{bearer_for, memory_pool, test_state};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    #[actix_rt::test]
    async fn test_chemical_lifecycle_over_http() {
        let pool = memory_pool().await;
        let (_, tech) = bearer_for(&pool, "tech", UserRole::Technician).await;
        let (_, admin) = bearer_for(&pool, "root", UserRole::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(pool)))
                .configure(configure_routes),
        )
        .await;

        let expiry = (Utc::now().date_naive() + Duration::days(10)).to_string();
        let req = test::TestRequest::post()
            .uri("/api/chemicals")
            .insert_header((header::AUTHORIZATION, tech.clone()))
            .set_json(json!({
                "name": "Acetone",
                "quantity": 5,
                "unit": "ml",
                "minimum_stock": 10,
                "expiry_date": expiry,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/chemicals/low-stock")
            .insert_header((header::AUTHORIZATION, tech.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/chemicals/expiring-soon?days=5")
            .insert_header((header::AUTHORIZATION, tech.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let req = test::TestRequest::put()
            .uri(&format!("/api/chemicals/{}", id))
            .insert_header((header::AUTHORIZATION, tech.clone()))
            .set_json(json!({"quantity": -2}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/chemicals/{}", id))
            .insert_header((header::AUTHORIZATION, tech.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/chemicals/{}", id))
            .insert_header((header::AUTHORIZATION, admin.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/chemicals/{}", id))
            .insert_header((header::AUTHORIZATION, admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_negative_window_rejected() {
        let pool = memory_pool().await;
        let (_, viewer) = bearer_for(&pool, "viewer", UserRole::Viewer).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(pool)))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/chemicals/expiring-soon?days=-1")
            .insert_header((header::AUTHORIZATION, viewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
