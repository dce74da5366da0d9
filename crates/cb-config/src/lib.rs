//! # cb-config
//!
//! Layered runtime configuration: built-in defaults, an optional
//! `club-board.toml`, then `CLUB_BOARD__SECTION__KEY` environment variables.

use std::path::Path;
use std::time::Duration;

use cb_core::models::DEFAULT_NAME;
use cb_core::BoardSettings;
use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Base name of the optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "club-board";
pub const ENV_PREFIX: &str = "CLUB_BOARD";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Read the client address from `X-Forwarded-For`
    pub trust_proxy: bool,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaSettings {
    pub root: String,
    pub url_prefix: String,
    pub max_dimension: u32,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct BoardSection {
    pub page_size: u32,
    pub popular_window_hours: i64,
    pub op_timeout_secs: u64,
    pub default_name: String,
    pub search_limit: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub password: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub board: BoardSection,
    #[serde(default)]
    pub admin: AdminSettings,
}

impl Settings {
    /// Loads from `club-board.toml` (if present) and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::build(Some(Path::new(CONFIG_FILE)), env_source())
    }

    fn build(file: Option<&Path>, env: Environment) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.trust_proxy", false)?
            .set_default("database.url", "sqlite:club_board.db")?
            .set_default("media.root", "./data/uploads")?
            .set_default("media.url_prefix", "/uploads")?
            .set_default("media.max_dimension", 1280)?
            .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("board.page_size", 10)?
            .set_default("board.popular_window_hours", 24)?
            .set_default("board.op_timeout_secs", 10)?
            .set_default("board.default_name", DEFAULT_NAME)?
            .set_default("board.search_limit", 50)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let checks = [
            ("board.page_size", self.board.page_size > 0),
            ("board.popular_window_hours", self.board.popular_window_hours > 0),
            ("board.op_timeout_secs", self.board.op_timeout_secs > 0),
            ("board.search_limit", self.board.search_limit > 0),
            ("media.max_dimension", self.media.max_dimension > 0),
            ("media.max_upload_bytes", self.media.max_upload_bytes > 0),
        ];
        if let Some((key, _)) = checks.iter().find(|(_, ok)| !ok) {
            return Err(SettingsError::Invalid(format!("{key} must be positive")));
        }
        if self.board.default_name.trim().is_empty() {
            return Err(SettingsError::Invalid("board.default_name must not be blank".into()));
        }
        Ok(())
    }

    /// Workflow tunables for [`cb_core::BoardService`].
    pub fn board_settings(&self) -> BoardSettings {
        let admin_password = self
            .admin
            .password
            .as_ref()
            .map(|pw| pw.expose_secret().trim())
            .filter(|pw| !pw.is_empty())
            .map(|pw| SecretString::from(pw.to_string()));
        if admin_password.is_none() {
            log::info!("admin.password is not set; club creation is disabled");
        }

        BoardSettings {
            page_size: self.board.page_size,
            popular_window: chrono::Duration::hours(self.board.popular_window_hours),
            op_timeout: Duration::from_secs(self.board.op_timeout_secs),
            default_name: self.board.default_name.trim().to_string(),
            search_limit: self.board.search_limit,
            admin_password,
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
