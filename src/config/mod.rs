use serde::Deserialize;

/// Service configuration, loaded from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server configuration
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // Database configuration
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    // Identity used as the reporter on automated flags and as the actor on
    // automated admin actions. Provisioned at startup if absent.
    #[serde(default = "default_system_reporter_email")]
    pub system_reporter_email: String,

    // Safety sweep cadence and enforcement thresholds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_auto_suspend_threshold")]
    pub auto_suspend_threshold: i32,
    #[serde(default = "default_auto_suspend_days")]
    pub auto_suspend_days: i64,

    // Optional webhook for borrow lifecycle notifications. When unset,
    // notifications are logged and dropped.
    #[serde(default)]
    pub notification_webhook_url: Option<String>,

    // Service configuration
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_http_port() -> u16 {
    8094
}

fn default_db_max_connections() -> u32 {
    50
}

fn default_system_reporter_email() -> String {
    "system@stufflibrary.org".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_auto_suspend_threshold() -> i32 {
    200
}

fn default_auto_suspend_days() -> i64 {
    30
}

fn default_service_name() -> String {
    "lending-trust-service".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_config() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("AUTO_SUSPEND_THRESHOLD");

        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 8094);
        assert_eq!(config.auto_suspend_threshold, 200);
        assert_eq!(config.auto_suspend_days, 30);
        assert_eq!(config.system_reporter_email, "system@stufflibrary.org");
        assert!(config.notification_webhook_url.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("HTTP_PORT", "9000");
        std::env::set_var("AUTO_SUSPEND_THRESHOLD", "150");

        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.auto_suspend_threshold, 150);

        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("AUTO_SUSPEND_THRESHOLD");
    }
}
