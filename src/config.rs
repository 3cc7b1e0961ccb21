use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder secret used by local setups. When the configured gateway key
/// equals this value payment verification short-circuits to success.
pub const DEV_GATEWAY_KEY: &str = "CHASECK_TEST-valid-test-key";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub chapa: ChapaConfig,
    pub gemini: GeminiConfig,
    pub frontend_url: String,
    pub media_root: PathBuf,
    pub zego_app_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct ChapaConfig {
    /// `None` when `CHAPA_SECRET_KEY` is unset or blank.
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl ChapaConfig {
    /// Verification skips the gateway round-trip in this mode.
    pub fn is_dev_mode(&self) -> bool {
        match &self.secret_key {
            None => true,
            Some(key) => key == DEV_GATEWAY_KEY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", v.clone()))?,
            Err(_) => 8000,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            port,
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_ttl: Duration::from_secs(parse_u64("JWT_ACCESS_TTL_MINUTES", 60) * 60),
                refresh_ttl: Duration::from_secs(parse_u64("JWT_REFRESH_TTL_DAYS", 1) * 86_400),
            },
            chapa: ChapaConfig {
                secret_key: env::var("CHAPA_SECRET_KEY")
                    .ok()
                    .map(|k| clean_secret(&k))
                    .filter(|k| !k.is_empty()),
                base_url: env::var("CHAPA_BASE_URL")
                    .unwrap_or_else(|_| "https://api.chapa.co/v1".to_string()),
            },
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
                base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
            },
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
            zego_app_id: env::var("ZEGO_APP_ID").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Keys pasted into `.env` files often keep their surrounding quotes.
pub fn clean_secret(raw: &str) -> String {
    raw.trim().trim_matches('"').trim_matches('\'').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_secret_strips_whitespace_and_quotes() {
        assert_eq!(clean_secret("  \"CHASECK-abc\" "), "CHASECK-abc");
        assert_eq!(clean_secret("'CHASECK-abc'"), "CHASECK-abc");
        assert_eq!(clean_secret("CHASECK-abc"), "CHASECK-abc");
    }

    #[test]
    fn dev_mode_when_key_missing_or_placeholder() {
        let mut cfg = ChapaConfig {
            secret_key: None,
            base_url: "http://localhost".into(),
        };
        assert!(cfg.is_dev_mode());

        cfg.secret_key = Some(DEV_GATEWAY_KEY.to_string());
        assert!(cfg.is_dev_mode());

        cfg.secret_key = Some("CHASECK-live-key".to_string());
        assert!(!cfg.is_dev_mode());
    }
}
