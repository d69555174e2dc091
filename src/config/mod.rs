//! Configuration management
//!
//! Configuration is read from a `config.yml` file and can be overridden with
//! `MULTIBLOG_*` environment variables. Missing values fall back to defaults,
//! so an absent or empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Login session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Site-wide listing and publishing behaviour
    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/multiblog.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme directory name under `path`; templates found there override the built-in ones
    #[serde(default = "default_theme")]
    pub active: String,
    /// Path to themes directory
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            active: default_theme(),
            path: default_theme_path(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("themes")
}

/// Login session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub lifetime_days: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_days: default_session_days(),
            secure_cookie: false,
        }
    }
}

fn default_session_days() -> i64 {
    7
}

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_DAYS: i64 = 3650;

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in page headers
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Page size of a blog's post list
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u32,
    /// Number of recent posts on the front page
    #[serde(default = "default_front_page_posts")]
    pub front_page_posts: u32,
    /// Editing a post stamps it as published, even when it was a draft
    #[serde(default = "default_republish_on_edit")]
    pub republish_on_edit: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            posts_per_page: default_posts_per_page(),
            front_page_posts: default_front_page_posts(),
            republish_on_edit: default_republish_on_edit(),
        }
    }
}

fn default_site_name() -> String {
    "Multiblog".to_string()
}

fn default_posts_per_page() -> u32 {
    10
}

fn default_front_page_posts() -> u32 {
    5
}

fn default_republish_on_edit() -> bool {
    true
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns the default configuration.
    /// Invalid YAML is reported with its line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - MULTIBLOG_SERVER_HOST
    /// - MULTIBLOG_SERVER_PORT
    /// - MULTIBLOG_DATABASE_DRIVER
    /// - MULTIBLOG_DATABASE_URL
    /// - MULTIBLOG_THEME_ACTIVE
    /// - MULTIBLOG_THEME_PATH
    /// - MULTIBLOG_SESSION_DAYS
    /// - MULTIBLOG_SITE_NAME
    /// - MULTIBLOG_SITE_POSTS_PER_PAGE
    ///
    /// Values that fail to parse are ignored. The merged result is validated.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if self.site.posts_per_page == 0 {
            return Err(ConfigError::ValidationError(
                "site.posts_per_page must be greater than 0".to_string(),
            ));
        }
        if self.site.front_page_posts == 0 {
            return Err(ConfigError::ValidationError(
                "site.front_page_posts must be greater than 0".to_string(),
            ));
        }
        if !(1..=MAX_SESSION_DAYS).contains(&self.session.lifetime_days) {
            return Err(ConfigError::ValidationError(format!(
                "session.lifetime_days must be between 1 and {}",
                MAX_SESSION_DAYS
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("MULTIBLOG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("MULTIBLOG_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("MULTIBLOG_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("MULTIBLOG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(active) = std::env::var("MULTIBLOG_THEME_ACTIVE") {
            self.theme.active = active;
        }
        if let Ok(path) = std::env::var("MULTIBLOG_THEME_PATH") {
            self.theme.path = PathBuf::from(path);
        }

        if let Ok(days) = std::env::var("MULTIBLOG_SESSION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.session.lifetime_days = days;
            }
        }

        if let Ok(name) = std::env::var("MULTIBLOG_SITE_NAME") {
            self.site.name = name;
        }
        if let Ok(per_page) = std::env::var("MULTIBLOG_SITE_POSTS_PER_PAGE") {
            if let Ok(per_page) = per_page.parse::<u32>() {
                self.site.posts_per_page = per_page;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_VARS: &[&str] = &[
    "MULTIBLOG_SERVER_HOST",
    "MULTIBLOG_SERVER_PORT",
    "MULTIBLOG_DATABASE_DRIVER",
    "MULTIBLOG_DATABASE_URL",
    "MULTIBLOG_THEME_ACTIVE",
    "MULTIBLOG_THEME_PATH",
    "MULTIBLOG_SESSION_DAYS",
    "MULTIBLOG_SITE_NAME",
    "MULTIBLOG_SITE_POSTS_PER_PAGE",
];
