use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub skip_gemini: bool,
    pub ai_timeout_secs: u64,
    pub max_upload_mb: usize,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

/// Settings for the external text-generation capability.
///
/// Built once at startup and handed to the adapters that need it, so the
/// fallback paths never depend on process state.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[cfg(test)]
impl AiConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            skip_gemini: std::env::var("SKIP_GEMINI")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            ai_timeout_secs: std::env::var("AI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<u64>()
                .context("AI_TIMEOUT_SECS must be a whole number of seconds")?,
            max_upload_mb: std::env::var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "15".to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_MB must be a whole number")?,
            cors_origins: split_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// AI is only switched on when explicitly enabled and a key is present.
    pub fn ai(&self) -> AiConfig {
        AiConfig {
            enabled: !self.skip_gemini && !self.gemini_api_key.trim().is_empty(),
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            timeout: Duration::from_secs(self.ai_timeout_secs),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
impl Config {
    /// Offline configuration with AI disabled.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/allocation_test".to_string(),
            s3_bucket: "resumes".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "minio".to_string(),
            aws_secret_access_key: "minio123".to_string(),
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            skip_gemini: true,
            ai_timeout_secs: 20,
            max_upload_mb: 15,
            cors_origins: vec![],
            port: 5001,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
