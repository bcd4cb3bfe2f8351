// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Duration pre-filled on a fresh draft exam, in minutes.
pub const DEFAULT_DRAFT_DURATION_MINUTES: u32 = 60;

/// Upper bound for a single AI generation request.
pub const MAX_GENERATED_QUESTIONS: u32 = 50;

/// Interval between two session clock ticks in production.
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENERATE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EXTRACT_MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_username: String,
    pub admin_password: String,
    pub gemini: GeminiConfig,
    pub tick_millis: u64,
}

/// Settings for the AI question supplier.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` disables AI generation and PDF/raw-text extraction.
    pub api_key: Option<String>,
    pub base_url: String,
    pub generate_model: String,
    pub extract_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            extract_model: DEFAULT_EXTRACT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "password123".to_string());

        let api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty());

        let gemini = GeminiConfig {
            api_key,
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            generate_model: env::var("GEMINI_GENERATE_MODEL")
                .unwrap_or_else(|_| DEFAULT_GENERATE_MODEL.to_string()),
            extract_model: env::var("GEMINI_EXTRACT_MODEL")
                .unwrap_or_else(|_| DEFAULT_EXTRACT_MODEL.to_string()),
        };

        let tick_millis = env::var("TICK_MILLIS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&ms: &u64| ms > 0)
            .unwrap_or(DEFAULT_TICK_MILLIS);

        Self {
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            admin_username,
            admin_password,
            gemini,
            tick_millis,
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
