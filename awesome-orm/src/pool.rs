//! Connection pool management
//!
//! One [`Database`] is created at startup from [`DbConfig`] and cloned into
//! every component that needs access; clones share the same sqlx pool.
//! Borrowed connections go back to the pool when the guard drops, which also
//! covers error and cancellation paths.

use std::str::FromStr;

use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, ConnectOptions};
use tracing::info;
use url::Url;

use crate::config::{Credentials, DbConfig};
use crate::dialect::Driver;
use crate::error::{ConfigError, Result};

/// Exclusive pooled connection, returned to the pool on drop
pub type ScopedConnection = PoolConnection<Any>;

/// Shared handle to the process-wide connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    driver: Driver,
    autocommit: bool,
}

impl Database {
    /// Create the pool and open `min_size` connections.
    ///
    /// # Errors
    ///
    /// Returns a config error when `user`/`password`/`db` are absent or the
    /// pool bounds are inconsistent, and an execution error if the first
    /// connections cannot be established.
    pub async fn create_pool(config: &DbConfig) -> Result<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let options = connect_options(config)?;
        info!(
            driver = %config.driver,
            host = %config.host,
            min_size = config.min_size,
            max_size = config.max_size,
            "create database connection pool..."
        );

        let pool = AnyPoolOptions::new()
            .min_connections(config.min_size)
            .max_connections(config.max_size)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            driver: config.driver,
            autocommit: config.autocommit,
        })
    }

    /// Borrow a connection, suspending while all `max_size` are in use.
    /// Callers wanting a deadline wrap this in their own timeout.
    pub async fn acquire(&self) -> Result<ScopedConnection> {
        Ok(self.pool.acquire().await?)
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Default commit mode for record writes
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Open connections, idle or borrowed
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close the pool: new acquires fail, borrowed connections close on return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database connection pool closed");
    }
}

fn connect_options(config: &DbConfig) -> Result<AnyConnectOptions> {
    let credentials = config.credentials()?;
    let options = match config.driver {
        Driver::Sqlite => {
            AnyConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", credentials.db))?
        }
        Driver::Mysql | Driver::Postgres => {
            AnyConnectOptions::from_url(&server_url(config, credentials)?)?
        }
    };
    // Statements are logged by the executor with their arguments
    Ok(options.disable_statement_logging())
}

fn server_url(config: &DbConfig, credentials: Credentials<'_>) -> Result<Url> {
    let mut url = Url::parse(&format!("{}://{}", config.driver.scheme(), config.host))
        .map_err(|e| ConfigError::invalid(format!("invalid host '{}': {e}", config.host)))?;
    url.set_port(config.port())
        .map_err(|_| ConfigError::invalid("host does not accept a port"))?;
    url.set_username(credentials.user)
        .map_err(|_| ConfigError::invalid("host does not accept a user name"))?;
    url.set_password(Some(credentials.password))
        .map_err(|_| ConfigError::invalid("host does not accept a password"))?;
    url.set_path(credentials.db);
    if config.driver == Driver::Mysql {
        url.query_pairs_mut().append_pair("charset", &config.charset);
    }
    Ok(url)
}
