use chrono_tz::Tz;
use std::env;

use crate::frame::FrameFormat;
use crate::ingest::IngestSettings;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // API settings
    pub api_host: String,
    pub api_port: u16,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: usize,

    // Ingestion
    pub civil_timezone: Tz,
    pub accept_legacy_frames: bool,
    pub ingest_concurrent_limit: usize,

    // TTN integration
    pub ttn_app_id: Option<String>,
    pub ttn_webhook_key: Option<String>,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// or `ConfigError::Invalid` if `CIVIL_TIMEZONE` is not an IANA zone name or
    /// a setting fails [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let civil_timezone = env::var("CIVIL_TIMEZONE")
            .unwrap_or_else(|_| "America/Los_Angeles".to_string());

        let config = Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8006".to_string())
                .parse()
                .unwrap_or(8006),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| "65536".to_string())
                .parse()
                .unwrap_or(65_536), // 64KB, uplinks are well under 1KB

            // Ingestion
            civil_timezone: civil_timezone.parse().map_err(|_| ConfigError::Invalid {
                var: "CIVIL_TIMEZONE",
                value: civil_timezone.clone(),
            })?,
            accept_legacy_frames: env::var("ACCEPT_LEGACY_FRAMES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            ingest_concurrent_limit: env::var("INGEST_CONCURRENT_LIMIT")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .unwrap_or(32),

            // TTN integration
            ttn_app_id: env::var("TTN_APP_ID").ok().filter(|s| !s.is_empty()),
            ttn_webhook_key: env::var("TTN_WEBHOOK_KEY").ok().filter(|s| !s.is_empty()),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but leave the collector unable to work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `INGEST_CONCURRENT_LIMIT` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest_concurrent_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "INGEST_CONCURRENT_LIMIT",
                value: self.ingest_concurrent_limit.to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Accepted frame formats, current first.
    #[must_use]
    pub fn frame_formats(&self) -> Vec<FrameFormat> {
        if self.accept_legacy_frames {
            vec![FrameFormat::V2, FrameFormat::V1]
        } else {
            vec![FrameFormat::V2]
        }
    }

    #[must_use]
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            zone: self.civil_timezone,
            formats: self.frame_formats(),
            app_id: self.ttn_app_id.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
