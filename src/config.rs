use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,

    /// HS256 signing secret for access/refresh tokens
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,

    pub hf_api_key: String,
    pub hf_model: String,

    /// Comma-separated allowed CORS origins; empty means permissive
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let origins_str = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();
        let cors_allowed_origins: Vec<String> = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")?,
            access_token_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            refresh_token_ttl_days: std::env::var("REFRESH_TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            hf_api_key: std::env::var("HF_API_KEY")?,
            hf_model: std::env::var("HF_MODEL")
                .unwrap_or_else(|_| "Qwen/Qwen3-235B-A22B-Instruct-2507".to_string()),
            cors_allowed_origins,
        })
    }
}
