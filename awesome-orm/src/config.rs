//! Pool configuration
//!
//! Layers, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `[db]` table of the default TOML file
//! 3. `[db]` table of an optional override TOML file
//! 4. `AWESOME_DB_*` environment variables (after `.env` is loaded)
//!
//! `user`, `password` and `db` are mandatory once all layers are applied.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dialect::Driver;
use crate::error::ConfigError;

pub const ENV_DRIVER: &str = "AWESOME_DB_DRIVER";
pub const ENV_HOST: &str = "AWESOME_DB_HOST";
pub const ENV_PORT: &str = "AWESOME_DB_PORT";
pub const ENV_USER: &str = "AWESOME_DB_USER";
pub const ENV_PASSWORD: &str = "AWESOME_DB_PASSWORD";
pub const ENV_NAME: &str = "AWESOME_DB_NAME";

const UNBOUNDED_ACQUIRE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Connection pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub driver: Driver,

    #[serde(default = "default_host")]
    pub host: String,

    /// Falls back to the driver's well-known port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Database name, or the file path for SQLite
    #[serde(default)]
    pub db: Option<String>,

    #[serde(default = "default_charset")]
    pub charset: String,

    /// Default commit mode for writes issued through the pool
    #[serde(default = "default_autocommit")]
    pub autocommit: bool,

    #[serde(default = "default_min_size")]
    pub min_size: u32,

    #[serde(default = "default_max_size")]
    pub max_size: u32,

    /// Optional cap on how long `acquire` waits; unset means wait until a
    /// connection is returned
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_autocommit() -> bool {
    true
}

fn default_min_size() -> u32 {
    1
}

fn default_max_size() -> u32 {
    10
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            driver: Driver::default(),
            host: default_host(),
            port: None,
            user: None,
            password: None,
            db: None,
            charset: default_charset(),
            autocommit: default_autocommit(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            acquire_timeout_secs: None,
        }
    }
}

/// Mandatory credentials, borrowed from a validated config
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub user: &'a str,
    pub password: &'a str,
    pub db: &'a str,
}

impl DbConfig {
    /// Parse the `[db]` table of a TOML document (no env, no validation)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: toml::Table = toml::from_str(content)?;
        Self::from_table(db_table(document))
    }

    fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
        Ok(toml::Value::Table(table).try_into()?)
    }

    /// Load the layered configuration and validate it.
    ///
    /// A missing override file is skipped; a missing default file is an error.
    pub fn load(default_path: &Path, override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = db_table(read_document(default_path)?);

        if let Some(path) = override_path {
            if path.exists() {
                merge(&mut merged, db_table(read_document(path)?));
                debug!("applied config override from {}", path.display());
            } else {
                debug!("no config override at {}", path.display());
            }
        }

        let mut config = Self::from_table(merged)?;
        load_dotenv();
        config.apply_env()?;
        config.validate()?;
        info!(
            driver = %config.driver,
            host = %config.host,
            max_size = config.max_size,
            "loaded database configuration"
        );
        Ok(config)
    }

    /// Apply `AWESOME_DB_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(driver) = lookup(ENV_DRIVER) {
            self.driver = driver.parse()?;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            let port = port
                .parse()
                .map_err(|_| ConfigError::invalid(format!("{ENV_PORT} is not a port: {port}")))?;
            self.port = Some(port);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(db) = lookup(ENV_NAME) {
            self.db = Some(db);
        }
        Ok(())
    }

    /// Check mandatory keys and pool bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials()?;
        if self.max_size == 0 {
            return Err(ConfigError::invalid("max_size must be at least 1"));
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::invalid(format!(
                "min_size ({}) exceeds max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        let user = self.user.as_deref().ok_or(ConfigError::Missing { key: "user" })?;
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError::Missing { key: "password" })?;
        let db = self.db.as_deref().ok_or(ConfigError::Missing { key: "db" })?;
        Ok(Credentials { user, password, db })
    }

    pub fn port(&self) -> Option<u16> {
        self.port.or_else(|| self.driver.default_port())
    }

    /// Wait bound handed to the pool. sqlx adds this to `Instant::now()`,
    /// so the unbounded case is a century rather than `Duration::MAX`.
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout_secs
            .map_or(UNBOUNDED_ACQUIRE, Duration::from_secs)
    }
}

/// Load `.env` from the working directory; existing variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded .env from {}", path.display()),
        Err(_) => debug!("no .env file found, using process environment only"),
    }
}

fn read_document(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn db_table(mut document: toml::Table) -> toml::Table {
    match document.remove("db") {
        Some(toml::Value::Table(table)) => table,
        _ => toml::Table::new(),
    }
}

/// Overlay `overlay` onto `base`, recursing into nested tables
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(nested) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge(existing, nested);
                continue;
            }
            base.insert(key, toml::Value::Table(nested));
        } else {
            base.insert(key, value);
        }
    }
}
