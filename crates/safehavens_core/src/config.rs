//! Process configuration read once at startup.
//!
//! # Responsibility
//! - Collect bootstrap credentials, bind address, debug flag and storage
//!   locations from the environment.
//!
//! # Invariants
//! - Reading configuration has no side effects; `.env` loading belongs to
//!   the binary.
//! - The admin secret never appears in `Debug` output.

use crate::model::venue::VenueCategories;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_BIND_IP: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_PATH: &str = "safehavens.sqlite3";
pub const DEFAULT_DATASET_PATH: &str = "venues.json";
pub const DEFAULT_VENUES_PER_PAGE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Email and secret used to create the `admin` account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: Option<String>,
    pub secret: Option<String>,
}

impl Debug for AdminCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin: AdminCredentials,
    pub bind_ip: String,
    pub port: u16,
    pub debug: bool,
    pub db_path: PathBuf,
    /// Venue dataset read by the bulk import.
    pub dataset_path: PathBuf,
    pub venues_per_page: u32,
    pub categories: VenueCategories,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin: AdminCredentials::default(),
            bind_ip: DEFAULT_BIND_IP.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            venues_per_page: DEFAULT_VENUES_PER_PAGE,
            categories: VenueCategories::default(),
            log_dir: None,
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => defaults.port,
        };

        let venues_per_page = match get("VENUES_PER_PAGE") {
            Some(value) => match value.parse::<u32>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "VENUES_PER_PAGE",
                        value,
                    })
                }
            },
            None => defaults.venues_per_page,
        };

        let categories = match get("VENUE_EXTRA_CATEGORIES") {
            Some(value) => VenueCategories::with_extra(value.split(',')),
            None => defaults.categories,
        };

        Ok(Self {
            admin: AdminCredentials {
                email: get("MAIL_DEFAULT_SENDER"),
                // Secrets are taken verbatim; only an entirely blank value is unset.
                secret: lookup("ADMIN_PASSWORD").filter(|value| !value.is_empty()),
            },
            bind_ip: get("IP").unwrap_or(defaults.bind_ip),
            port,
            debug: get("APPDEBUG").is_some_and(|value| value.eq_ignore_ascii_case("ON")),
            db_path: get("SAFEHAVENS_DB").map_or(defaults.db_path, PathBuf::from),
            dataset_path: get("VENUES_JSON").map_or(defaults.dataset_path, PathBuf::from),
            venues_per_page,
            categories,
            log_dir: get("SAFEHAVENS_LOG_DIR").map(PathBuf::from),
            log_level: get("SAFEHAVENS_LOG_LEVEL"),
        })
    }

    /// `ip:port` handed to the HTTP collaborator.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DEFAULT_VENUES_PER_PAGE};
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).expect("defaults should load");
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.venues_per_page, DEFAULT_VENUES_PER_PAGE);
        assert!(!config.debug);
        assert_eq!(config.admin.secret, None);
    }

    #[test]
    fn reads_admin_credentials_and_flags() {
        let config = config_from(&[
            ("MAIL_DEFAULT_SENDER", "admin@example.org"),
            ("ADMIN_PASSWORD", "hunter2"),
            ("IP", "0.0.0.0"),
            ("PORT", "8080"),
            ("APPDEBUG", "on"),
            ("VENUE_EXTRA_CATEGORIES", "Library, Park"),
        ])
        .expect("full config should load");

        assert_eq!(config.admin.email.as_deref(), Some("admin@example.org"));
        assert_eq!(config.admin.secret.as_deref(), Some("hunter2"));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.debug);
        assert!(config.categories.contains("Library"));
        assert!(config.categories.contains("Park"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).expect_err("non-numeric port");
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );

        let err = config_from(&[("VENUES_PER_PAGE", "0")]).expect_err("zero page size");
        assert!(matches!(err, ConfigError::Invalid { key: "VENUES_PER_PAGE", .. }));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config =
            config_from(&[("ADMIN_PASSWORD", "hunter2")]).expect("secret-only config should load");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
