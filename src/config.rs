use anyhow::{Context, Result};
use std::env;

use crate::json::JsonFormat;

/// Default cap on request bodies read by the JSON decoder (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Settings read by the body decoder and the response writers.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub json: JsonFormat,
    /// An incorrect Content-Type is always rejected (JSON sent as `text/plain` bypasses
    /// CORS preflight), but a missing one can be tolerated.
    pub allow_blank_content_type: bool,
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            json: JsonFormat::default(),
            allow_blank_content_type: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
            },
            api: ApiConfig {
                json: env::var("JSON_INDENT")
                    .map(|raw| JsonFormat::from_setting(&raw))
                    .unwrap_or_default(),
                allow_blank_content_type: env::var("ALLOW_BLANK_CONTENT_TYPE")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .context("ALLOW_BLANK_CONTENT_TYPE must be true or false")?,
                max_body_bytes: env::var("MAX_BODY_BYTES")
                    .unwrap_or_else(|_| DEFAULT_MAX_BODY_BYTES.to_string())
                    .parse()
                    .context("MAX_BODY_BYTES must be a valid number")?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
