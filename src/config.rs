use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub frontend_url: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub sensitive_max_attempts: u32,
    pub sensitive_window_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let frontend_url = required("FRONTEND_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed("APP_PORT", 3000);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours: parsed("JWT_TTL_HOURS", 24),
            frontend_url,
            upload_dir,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            sensitive_max_attempts: parsed("SENSITIVE_MAX_ATTEMPTS", 5),
            sensitive_window_secs: parsed("SENSITIVE_WINDOW_SECS", 900),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
