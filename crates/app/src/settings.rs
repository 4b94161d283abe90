//! Handles settings for the application. Configuration is read from
//! `settings.toml` and `RENTAL__*` environment variables, the latter winning.
//!
//! See `settings.example.toml` for the configuration.
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_minutes: i64,
    /// Minutes a notified waiting-list entry may confirm; unset means no
    /// expiry.
    pub notify_timeout_minutes: Option<i64>,
    pub password_cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Server {
    pub fn token_lifetime(&self) -> Result<TimeDelta, ConfigError> {
        minutes("server.token_lifetime_minutes", self.token_lifetime_minutes)
    }

    pub fn notify_timeout(&self) -> Result<Option<TimeDelta>, ConfigError> {
        self.notify_timeout_minutes
            .map(|value| minutes("server.notify_timeout_minutes", value))
            .transpose()
    }
}

/// A positive number of minutes that fits a `TimeDelta`.
fn minutes(key: &str, value: i64) -> Result<TimeDelta, ConfigError> {
    TimeDelta::try_minutes(value)
        .filter(|delta| *delta > TimeDelta::zero())
        .ok_or_else(|| ConfigError::Message(format!("{key} out of range: {value}")))
}

fn default_level() -> String {
    "info".to_string()
}

fn default_token_lifetime() -> i64 {
    60
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", default_level())?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("RENTAL").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
