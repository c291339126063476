use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Process-wide configuration, parsed once at startup and shared (cloned)
/// across the gateway and worker binaries.
///
/// Loaded from the process environment, layered over an optional `.env`
/// file read via `dotenvy` before the `config` builder runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_concurrent_screenshots: usize,

    pub browser_type: String,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub webdriver_url: String,

    pub default_image_type: String,
    pub default_image_quality: u8,
    pub default_wait_until: String,
    pub default_timeout_ms: u64,
    pub default_wait_for_selector_timeout: u64,

    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u8,
    pub redis_password: Option<String>,
    pub redis_task_queue: String,
    pub redis_result_prefix: String,
    pub redis_result_ttl_seconds: u64,

    pub json_rpc_version: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_concurrent_screenshots: 5,

            browser_type: "chromium".to_string(),
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            webdriver_url: "http://localhost:4444".to_string(),

            default_image_type: "png".to_string(),
            default_image_quality: 90,
            default_wait_until: "networkidle".to_string(),
            default_timeout_ms: 30_000,
            default_wait_for_selector_timeout: 10_000,

            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            redis_password: None,
            redis_task_queue: "screenshot_tasks".to_string(),
            redis_result_prefix: "screenshot_result:".to_string(),
            redis_result_ttl_seconds: 3600,

            json_rpc_version: "2.0".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `.env` (if present) and the process
    /// environment, falling back to [`AppConfig::default`] for anything
    /// unset.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("loaded environment overrides from {}", path.display()),
            Err(dotenvy::Error::Io(_)) => tracing::debug!("no .env file found, using process environment only"),
            Err(e) => tracing::warn!("failed to parse .env file: {}", e),
        }

        let defaults = AppConfig::default();
        let builder = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("max_concurrent_screenshots", defaults.max_concurrent_screenshots as i64)?
            .set_default("browser_type", defaults.browser_type)?
            .set_default("headless", defaults.headless)?
            .set_default("viewport_width", defaults.viewport_width as i64)?
            .set_default("viewport_height", defaults.viewport_height as i64)?
            .set_default("webdriver_url", defaults.webdriver_url)?
            .set_default("default_image_type", defaults.default_image_type)?
            .set_default("default_image_quality", defaults.default_image_quality as i64)?
            .set_default("default_wait_until", defaults.default_wait_until)?
            .set_default("default_timeout_ms", defaults.default_timeout_ms as i64)?
            .set_default(
                "default_wait_for_selector_timeout",
                defaults.default_wait_for_selector_timeout as i64,
            )?
            .set_default("redis_host", defaults.redis_host)?
            .set_default("redis_port", defaults.redis_port as i64)?
            .set_default("redis_db", defaults.redis_db as i64)?
            .set_default("redis_task_queue", defaults.redis_task_queue)?
            .set_default("redis_result_prefix", defaults.redis_result_prefix)?
            .set_default("redis_result_ttl_seconds", defaults.redis_result_ttl_seconds as i64)?
            .set_default("json_rpc_version", defaults.json_rpc_version)?
            .set_default("log_level", defaults.log_level)?
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .separator("__"),
            );

        let cfg = builder.build().context("failed to build configuration")?;
        cfg.try_deserialize().context("failed to deserialize AppConfig")
    }

    pub fn redis_url(&self) -> String {
        match &self.redis_password {
            Some(pw) => format!(
                "redis://:{}@{}:{}/{}",
                pw, self.redis_host, self.redis_port, self.redis_db
            ),
            None => format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db),
        }
    }

    pub fn gateway_wait_timeout(&self, requested_timeout_ms: u64) -> Duration {
        Duration::from_millis(requested_timeout_ms) + Duration::from_secs(5)
    }
}
