// src/main.rs
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chemlab::config::{load_config, Config};
use chemlab::seed::{create_default_admin_if_needed, seed_sample_data};
use chemlab::{configure_routes, db, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let mut config = load_config()?;
    setup_logging(&config)?;
    if config.ensure_jwt_secret()? {
        log::warn!("JWT_SECRET not set, generating an ephemeral secret for this run");
    }
    config.print_startup_info();

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(AppState::new(config.clone(), pool.clone()));

    create_default_admin_if_needed(&app_state.identity)
        .await
        .context("Failed to create default admin")?;

    if config.database.seed_sample_data {
        seed_sample_data(&pool).await.context("Failed to seed sample data")?;
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(address = %bind_address, "Starting server");

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(setup_cors(&server_config))
            .wrap(setup_security_headers())
            .wrap(Logger::default())
            .app_data(web::PayloadConfig::new(server_config.security.max_request_size))
            .app_data(web::Data::new(app_state.clone()))
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

fn setup_cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    let origins = &config.security.allowed_origins;
    if origins.iter().any(|origin| origin == "*") && !config.is_production() {
        log::warn!("⚠️  Using wildcard CORS (*) in development mode");
        return cors.allow_any_origin();
    }

    origins
        .iter()
        .filter(|origin| !origin.is_empty() && origin.as_str() != "*")
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

fn setup_security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialise logging")?;
    }

    Ok(())
}
