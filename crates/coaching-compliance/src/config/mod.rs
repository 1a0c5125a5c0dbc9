use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Selects where director reports are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    fn from_dev_flag(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("true") {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Top-level configuration for the reporter.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub airtable: AirtableConfig,
    pub email: EmailConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment =
            AppEnvironment::from_dev_flag(&env::var("DEV_MODE").unwrap_or_else(|_| "False".into()));

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let airtable = AirtableConfig {
            api_key: optional_var("AIRTABLE_API_KEY"),
            base_id: var_or("AIRTABLE_BASE_ID", "appfccXiah8EtMfbZ"),
            workers_table: var_or("AIRTABLE_WORKERS_TABLE", "Workers"),
            workers_view: var_or("AIRTABLE_WORKERS_VIEW", "Active Workers"),
            coaching_table: var_or("AIRTABLE_COACHING_TABLE", "tblA4AbLZQcdgi0RC"),
            coaching_view: var_or("AIRTABLE_COACHING_VIEW", "viwdYEfy7lkI2XCsr"),
        };

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "465".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidSmtpPort)?;

        let email = EmailConfig {
            from_name: optional_var("EMAIL_FROM_NAME"),
            from_address: optional_var("EMAIL_FROM"),
            smtp_host: var_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port,
            smtp_username: optional_var("GMAIL_ADDRESS"),
            smtp_password: optional_var("GMAIL_APP_PASSWORD"),
            test_recipient: optional_var("TEST_EMAIL"),
        };

        let report = ReportConfig {
            excluded_worker: optional_var("EXCLUDED_WORKER"),
            csv_path: PathBuf::from(var_or("REPORT_CSV_PATH", "coaching_report.csv")),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            airtable,
            email,
            report,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    optional_var(name).unwrap_or_else(|| default.to_string())
}

fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value.clone().ok_or(ConfigError::Missing(name))
}

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

/// Settings controlling the preview server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Record source location and credentials.
#[derive(Clone)]
pub struct AirtableConfig {
    pub api_key: Option<String>,
    pub base_id: String,
    pub workers_table: String,
    pub workers_view: String,
    pub coaching_table: String,
    pub coaching_view: String,
}

impl fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_id", &self.base_id)
            .field("workers_table", &self.workers_table)
            .field("workers_view", &self.workers_view)
            .field("coaching_table", &self.coaching_table)
            .field("coaching_view", &self.coaching_view)
            .finish()
    }
}

impl AirtableConfig {
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        require(&self.api_key, "AIRTABLE_API_KEY")
    }
}

/// Sender identity, SMTP relay and development recipient.
#[derive(Clone)]
pub struct EmailConfig {
    pub from_name: Option<String>,
    pub from_address: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub test_recipient: Option<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &redacted(&self.smtp_password))
            .field("test_recipient", &self.test_recipient)
            .finish()
    }
}

impl EmailConfig {
    pub fn require_sender(&self) -> Result<(String, String), ConfigError> {
        Ok((
            require(&self.from_name, "EMAIL_FROM_NAME")?,
            require(&self.from_address, "EMAIL_FROM")?,
        ))
    }

    pub fn require_credentials(&self) -> Result<(String, String), ConfigError> {
        Ok((
            require(&self.smtp_username, "GMAIL_ADDRESS")?,
            require(&self.smtp_password, "GMAIL_APP_PASSWORD")?,
        ))
    }

    pub fn require_test_recipient(&self) -> Result<String, ConfigError> {
        require(&self.test_recipient, "TEST_EMAIL")
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub excluded_worker: Option<String>,
    pub csv_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidSmtpPort,
    InvalidHost { source: std::net::AddrParseError },
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::Missing(name) => write!(f, "{name} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidSmtpPort | ConfigError::Missing(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "DEV_MODE",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "AIRTABLE_API_KEY",
            "AIRTABLE_BASE_ID",
            "AIRTABLE_WORKERS_TABLE",
            "AIRTABLE_WORKERS_VIEW",
            "AIRTABLE_COACHING_TABLE",
            "AIRTABLE_COACHING_VIEW",
            "SMTP_HOST",
            "SMTP_PORT",
            "GMAIL_ADDRESS",
            "GMAIL_APP_PASSWORD",
            "EMAIL_FROM",
            "EMAIL_FROM_NAME",
            "TEST_EMAIL",
            "EXCLUDED_WORKER",
            "REPORT_CSV_PATH",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.airtable.workers_table, "Workers");
        assert_eq!(config.airtable.workers_view, "Active Workers");
        assert_eq!(config.airtable.coaching_table, "tblA4AbLZQcdgi0RC");
        assert_eq!(config.airtable.coaching_view, "viwdYEfy7lkI2XCsr");
        assert!(config.email.smtp_username.is_none());
        assert!(config.email.smtp_password.is_none());
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.report.csv_path, PathBuf::from("coaching_report.csv"));
        assert!(config.report.excluded_worker.is_none());
    }

    #[test]
    fn dev_mode_flag_is_case_insensitive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DEV_MODE", "TRUE");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Development);

        env::set_var("DEV_MODE", "yes");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        reset_env();
    }

    #[test]
    fn missing_secrets_surface_only_when_required() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMAIL_FROM_NAME", "Compliance Bot");
        let config = AppConfig::load().expect("config loads without secrets");

        let err = config.airtable.require_api_key().unwrap_err();
        assert_eq!(err.to_string(), "AIRTABLE_API_KEY must be set");

        let err = config.email.require_sender().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("EMAIL_FROM")));
        reset_env();
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("AIRTABLE_API_KEY", "patSecretKey");
        env::set_var("GMAIL_ADDRESS", "bot@example.com");
        env::set_var("GMAIL_APP_PASSWORD", "app-password-123");
        let config = AppConfig::load().expect("config loads");

        let rendered = format!("{config:?}");
        assert!(rendered.contains("bot@example.com"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("patSecretKey"));
        assert!(!rendered.contains("app-password-123"));
        assert_eq!(config.airtable.require_api_key().expect("key set"), "patSecretKey");
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_smtp_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_PORT", "ssl");
        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSmtpPort));
        reset_env();
    }
}
