use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Relational store
    pub database_url: String,

    // Headless CMS
    pub cms_api_url: String,
    pub cms_dataset: String,
    pub cms_write_token: Option<String>,

    // Translation providers
    pub translate_api_url: String,
    pub translate_api_key: Option<String>,
    pub openrouter_api_url: String,
    pub openrouter_api_key: Option<String>,

    // Admin
    pub admin_token: Option<String>,

    // Uploads
    pub upload_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:portfolio.db?mode=rwc".to_string()),

            // CMS - the dataset API base, e.g. https://<project>.api.sanity.io
            cms_api_url: std::env::var("CMS_API_URL").context("CMS_API_URL not set")?,
            cms_dataset: std::env::var("CMS_DATASET").unwrap_or_else(|_| "production".to_string()),
            cms_write_token: std::env::var("CMS_WRITE_TOKEN").ok(),

            // Primary translation API (Google-style REST)
            translate_api_url: std::env::var("TRANSLATE_API_URL").unwrap_or_else(|_| {
                "https://translation.googleapis.com/language/translate/v2".to_string()
            }),
            translate_api_key: std::env::var("TRANSLATE_API_KEY").ok(),

            // LLM fallback (OpenRouter-style chat completions)
            openrouter_api_url: std::env::var("OPENROUTER_API_URL").unwrap_or_else(|_| {
                "https://openrouter.ai/api/v1/chat/completions".to_string()
            }),
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok(),

            admin_token: std::env::var("ADMIN_API_TOKEN").ok(),

            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string()),
        })
    }
}
