// src/config.rs - Configuration management
use anyhow::{bail, Context, Result};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::models::ExperimentStatus;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub experiments: ExperimentConfig,
    pub alerts: AlertConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub seed_sample_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_request_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExperimentConfig {
    pub default_status: ExperimentStatus,
}

/// Thresholds used by the dashboard when deriving stock and expiry alerts.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertConfig {
    pub expiry_window_days: i64,
    pub critical_days: i64,
}

// Dummy secret for tests (no ENV read here)
impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dummy_secret_for_tests_0123456789abcdef".to_string(),
            token_expiration_hours: 1,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            keep_alive: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:chemlab.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            seed_sample_data: false,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_request_size: 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            default_status: ExperimentStatus::Planned,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            expiry_window_days: 30,
            critical_days: 7,
        }
    }
}

pub fn generate_jwt_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = match env::var("CONFIG_FILE") {
        Ok(config_file) => load_config_file(Path::new(&config_file))?,
        Err(_) => Config::default(),
    };

    apply_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate().context("Configuration validation failed")?;

    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Applies overrides from a key lookup (the process environment in production).
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Some(port_str) = lookup("CHEMLAB_PORT") {
        config.server.port = port_str
            .parse::<u16>()
            .with_context(|| format!("Invalid CHEMLAB_PORT: {}", port_str))?;
    }
    if let Some(workers_str) = lookup("CHEMLAB_WORKERS") {
        if let Ok(workers) = workers_str.parse::<usize>() {
            config.server.workers = Some(workers);
        }
    }
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(seed) = lookup("SEED_SAMPLE_DATA") {
        config.database.seed_sample_data = matches!(seed.to_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(jwt_secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = jwt_secret;
    }
    if let Some(expiration_str) = lookup("AUTH_TOKEN_EXPIRATION_HOURS") {
        if let Ok(expiration) = expiration_str.parse::<i64>() {
            config.auth.token_expiration_hours = expiration;
        }
    }
    if let Some(bcrypt_str) = lookup("AUTH_BCRYPT_COST") {
        if let Ok(bcrypt) = bcrypt_str.parse::<u32>() {
            config.auth.bcrypt_cost = bcrypt;
        }
    }
    if let Some(origins_str) = lookup("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(status) = lookup("EXPERIMENT_DEFAULT_STATUS") {
        config.experiments.default_status = ExperimentStatus::from_str(&status)
            .ok_or_else(|| anyhow::anyhow!("Invalid EXPERIMENT_DEFAULT_STATUS: {}", status))?;
    }
    if let Some(level) = lookup("RUST_LOG") {
        config.logging.level = level;
    }

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long (current: {})",
                self.auth.jwt_secret.len()
            ));
        }

        if self.auth.token_expiration_hours <= 0 {
            return Err(anyhow::anyhow!("token_expiration_hours must be positive"));
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(anyhow::anyhow!(
                "bcrypt_cost must be between 4 and 31 (current: {})",
                self.auth.bcrypt_cost
            ));
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(anyhow::anyhow!(
                "max_connections ({}) must be >= min_connections ({})",
                self.database.max_connections,
                self.database.min_connections
            ));
        }

        if self.alerts.expiry_window_days < 0 || self.alerts.critical_days < 0 {
            return Err(anyhow::anyhow!("alert thresholds must not be negative"));
        }

        if self.alerts.critical_days > self.alerts.expiry_window_days {
            return Err(anyhow::anyhow!(
                "critical_days ({}) must be <= expiry_window_days ({})",
                self.alerts.critical_days,
                self.alerts.expiry_window_days
            ));
        }

        Ok(())
    }

    /// Replaces the built-in placeholder secret with a random one when no
    /// layer (.env, TOML, env) supplied a secret. Returns `true` if it did.
    /// Production refuses to start on the placeholder.
    pub fn ensure_jwt_secret(&mut self) -> Result<bool> {
        let production = self.is_production();
        self.ensure_jwt_secret_for(production)
    }

    fn ensure_jwt_secret_for(&mut self, production: bool) -> Result<bool> {
        if self.auth.jwt_secret != AuthConfig::default().jwt_secret {
            return Ok(false);
        }
        if production {
            bail!("JWT_SECRET must be configured in production");
        }
        self.auth.jwt_secret = generate_jwt_secret();
        Ok(true)
    }

    pub fn is_production(&self) -> bool {
        env::var("CHEMLAB_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn print_startup_info(&self) {
        log::info!("🧪 Chemlab starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("💾 Database: {}", self.database.url);
        log::info!("🔒 Auth: JWT ({}h expiration)", self.auth.token_expiration_hours);
        log::info!(
            "⏰ Alerts: expiry window {} days, critical below {} days",
            self.alerts.expiry_window_days,
            self.alerts.critical_days
        );
        log::info!("📊 Logging: {} level", self.logging.level);

        if !self.is_production() {
            log::warn!("🚧 Running in development mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}
