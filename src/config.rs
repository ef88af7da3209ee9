use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_EVENT_STATUS_SCHEDULE: &str = "0 */15 * * * *";
const DEFAULT_MATCH_REFRESH_SCHEDULE: &str = "0 0 * * * *";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Allowed origin for the single-page client
    pub cors_origin: Option<String>,

    // Background jobs (cron expressions with seconds)
    pub event_status_schedule: String,
    pub match_refresh_schedule: String,

    // Security
    pub session_secret: Secret<String>,
    pub ticket_signing_key: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            cors_origin: config.get("cors_origin").ok(),

            event_status_schedule: config
                .get("event_status_schedule")
                .unwrap_or_else(|_| DEFAULT_EVENT_STATUS_SCHEDULE.to_string()),
            match_refresh_schedule: config
                .get("match_refresh_schedule")
                .unwrap_or_else(|_| DEFAULT_MATCH_REFRESH_SCHEDULE.to_string()),

            session_secret: Secret::new(config.get("session_secret")?),
            ticket_signing_key: Secret::new(config.get("ticket_signing_key")?),
        })
    }

    /// Session cookies are only marked secure when served over HTTPS
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base_url(base_url: &str) -> Config {
        Config {
            database_url: "postgres://localhost/eventive".to_string(),
            base_url: base_url.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: None,
            event_status_schedule: DEFAULT_EVENT_STATUS_SCHEDULE.to_string(),
            match_refresh_schedule: DEFAULT_MATCH_REFRESH_SCHEDULE.to_string(),
            session_secret: Secret::new("secret".to_string()),
            ticket_signing_key: Secret::new("signing".to_string()),
        }
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(config_with_base_url("https://eventive.example").secure_cookies());
        assert!(!config_with_base_url("http://localhost:8000").secure_cookies());
    }

    #[test]
    fn test_bind_address() {
        let config = config_with_base_url("http://localhost:8000");
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }
}
