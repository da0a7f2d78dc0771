//! Laboratory chemical inventory, experiment log and safety protocol service.

use std::sync::Arc;

use actix_web::{web, HttpRequest};
use actix_web_httpauth::middleware::HttpAuthentication;
use sqlx::SqlitePool;

pub mod auth;
pub mod auth_handlers;
pub mod chemical_handlers;
pub mod config;
pub mod dashboard;
pub mod dashboard_handlers;
pub mod db;
pub mod error;
pub mod experiment_handlers;
pub mod experiments;
pub mod handlers;
pub mod identity;
pub mod inventory;
pub mod models;
pub mod policy;
pub mod repositories;
pub mod safety;
pub mod safety_handlers;
pub mod seed;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

use auth::{BcryptHasher, JwtTokenService, PasswordHasher, TokenService};
use config::Config;
use dashboard::Dashboard;
use error::ApiError;
use experiments::ExperimentLedger;
use identity::IdentityStore;
use inventory::InventoryLedger;
use safety::SafetyCatalog;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub identity: IdentityStore,
    pub inventory: InventoryLedger,
    pub experiments: ExperimentLedger,
    pub safety: SafetyCatalog,
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(config: Config, db_pool: SqlitePool) -> Self {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.auth.bcrypt_cost));
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
            &config.auth.jwt_secret,
            config.auth.token_expiration_hours,
        ));
        Self::with_collaborators(config, db_pool, hasher, tokens)
    }

    pub fn with_collaborators(
        config: Config,
        db_pool: SqlitePool,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let identity = IdentityStore::new(db_pool.clone(), hasher, tokens);
        let inventory = InventoryLedger::new(db_pool.clone());
        let experiments = ExperimentLedger::new(db_pool.clone(), config.experiments.default_status);
        let safety = SafetyCatalog::new(db_pool.clone());
        let dashboard = Dashboard::new(
            inventory.clone(),
            experiments.clone(),
            safety.clone(),
            identity.clone(),
            config.alerts.clone(),
        );

        Self {
            config,
            db_pool,
            identity,
            inventory,
            experiments,
            safety,
            dashboard,
        }
    }
}

fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::ValidationError(format!("Invalid JSON body: {}", err)).into()
}

fn query_error_handler(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::ValidationError(format!("Invalid query string: {}", err)).into()
}

/// Registers every route. Register and login are public; the rest of `/api`
/// sits behind the bearer-token middleware.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let auth_middleware = HttpAuthentication::bearer(auth::jwt_middleware);

    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/health", web::get().to(handlers::health_check))
        .route("/api/auth/register", web::post().to(auth_handlers::register))
        .route("/api/auth/login", web::post().to(auth_handlers::login))
        .service(
            web::scope("/api")
                .wrap(auth_middleware)
                .route("/auth/me", web::get().to(auth_handlers::me))
                .service(
                    web::scope("/users")
                        .route("", web::get().to(auth_handlers::list_users))
                        .route("/{id}/role", web::put().to(auth_handlers::set_user_role)),
                )
                .service(
                    web::scope("/chemicals")
                        .route("", web::get().to(chemical_handlers::get_chemicals))
                        .route("", web::post().to(chemical_handlers::create_chemical))
                        .route("/low-stock", web::get().to(chemical_handlers::get_low_stock))
                        .route("/expiring-soon", web::get().to(chemical_handlers::get_expiring_soon))
                        .route("/{id}", web::get().to(chemical_handlers::get_chemical))
                        .route("/{id}", web::put().to(chemical_handlers::update_chemical))
                        .route("/{id}", web::delete().to(chemical_handlers::delete_chemical)),
                )
                .service(
                    web::scope("/experiments")
                        .route("", web::get().to(experiment_handlers::get_experiments))
                        .route("", web::post().to(experiment_handlers::create_experiment))
                        .route("/my", web::get().to(experiment_handlers::get_my_experiments))
                        .route("/{id}", web::get().to(experiment_handlers::get_experiment))
                        .route("/{id}", web::put().to(experiment_handlers::update_experiment))
                        .route("/{id}", web::delete().to(experiment_handlers::delete_experiment)),
                )
                .service(
                    web::scope("/safety-protocols")
                        .route("", web::get().to(safety_handlers::get_protocols))
                        .route("", web::post().to(safety_handlers::create_protocol))
                        .route("/category/{category}", web::get().to(safety_handlers::get_protocols_by_category))
                        .route("/{id}", web::get().to(safety_handlers::get_protocol))
                        .route("/{id}", web::put().to(safety_handlers::update_protocol))
                        .route("/{id}", web::delete().to(safety_handlers::delete_protocol)),
                )
                .service(
                    web::scope("/dashboard")
                        .route("/metrics", web::get().to(dashboard_handlers::get_metrics))
                        .route("/alerts", web::get().to(dashboard_handlers::get_alerts)),
                ),
        );
}
