// src/experiment_handlers.rs
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::get_current_identity;
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{CreateExperimentRequest, UpdateExperimentRequest};
use crate::AppState;

pub async fn get_experiments(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let experiments = app_state.experiments.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(experiments)))
}

pub async fn get_my_experiments(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let experiments = app_state.experiments.list_by_owner(&identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(experiments)))
}

pub async fn create_experiment(
    app_state: web::Data<Arc<AppState>>,
    experiment: web::Json<CreateExperimentRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let created = app_state.experiments.create(&identity, experiment.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        created,
        "Experiment created successfully".to_string(),
    )))
}

pub async fn get_experiment(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let experiment = app_state.experiments.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(experiment)))
}

pub async fn update_experiment(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    update: web::Json<UpdateExperimentRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    let experiment_id = path.into_inner();
    let updated = app_state
        .experiments
        .update(&identity, &experiment_id, update.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        updated,
        "Experiment updated successfully".to_string(),
    )))
}

pub async fn delete_experiment(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let identity = get_current_identity(&http_request)?;
    app_state.experiments.delete(&identity, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Experiment deleted successfully".to_string())))
}

#[cfg(test)]
mod tests {
    use crate::configure_routes;
    use crate::models::UserRole;
    use crate::test_support::{bearer_for, memory_pool, test_state};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    #[actix_rt::test]
    async fn test_experiment_ownership_over_http() {
        let pool = memory_pool().await;
        let (owner, alice) = bearer_for(&pool, "alice", UserRole::Technician).await;
        let (_, bob) = bearer_for(&pool, "bob", UserRole::Technician).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(pool)))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/chemicals")
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .set_json(json!({"name": "Ethanol", "quantity": 100, "unit": "ml"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let chemical_id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/experiments")
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .set_json(json!({
                "title": "Titration",
                "chemicals_used": [{"chemical_id": chemical_id, "quantity_used": 12.5, "unit": "ml"}],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "planned");
        assert_eq!(body["data"]["user_id"], owner.user_id.as_str());
        assert_eq!(body["data"]["chemicals_used"][0]["chemical_name"], "Ethanol");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/experiments/{}", id))
            .insert_header((header::AUTHORIZATION, bob.clone()))
            .set_json(json!({"status": "completed"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/experiments/my")
            .insert_header((header::AUTHORIZATION, bob.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let req = test::TestRequest::put()
            .uri(&format!("/api/experiments/{}", id))
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .set_json(json!({"status": "in_progress", "results": "pending"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "in_progress");
        assert_eq!(body["data"]["results"], "pending");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/experiments/{}", id))
            .insert_header((header::AUTHORIZATION, alice))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/experiments/{}", id))
            .insert_header((header::AUTHORIZATION, bob))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_blank_title_rejected() {
        let pool = memory_pool().await;
        let (_, viewer) = bearer_for(&pool, "viewer", UserRole::Viewer).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(pool)))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/experiments")
            .insert_header((header::AUTHORIZATION, viewer.clone()))
            .set_json(json!({"title": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/experiments")
            .insert_header((header::AUTHORIZATION, viewer))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }
}
