//! SurrealDB connection management.
//!
//! Admin operations run unattended, so [`DbConfig`] reads the
//! `COLLEGIUM_*` environment and [`DbManager::connect`] bounds the
//! handshake with a timeout instead of hanging on a dead endpoint.

use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
    /// Upper bound on the connect-and-signin handshake.
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "collegium".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DbConfig {
    /// Build a configuration from the `COLLEGIUM_DB_*` environment
    /// variables, falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup("COLLEGIUM_DB_CONNECT_TIMEOUT_SECS")
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        Self {
            url: lookup("COLLEGIUM_DB_URL").unwrap_or(defaults.url),
            namespace: lookup("COLLEGIUM_DB_NS").unwrap_or(defaults.namespace),
            database: lookup("COLLEGIUM_DB_NAME").unwrap_or(defaults.database),
            username: lookup("COLLEGIUM_DB_USER").unwrap_or(defaults.username),
            password: lookup("COLLEGIUM_DB_PASS").unwrap_or(defaults.password),
            connect_timeout: timeout,
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager. The whole
    /// handshake is bounded by `config.connect_timeout`.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = tokio::time::timeout(config.connect_timeout, Self::handshake(config))
            .await
            .map_err(|_| {
                DbError::Timeout(format!("connecting to SurrealDB at {}", config.url))
            })??;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    async fn handshake(config: &DbConfig) -> Result<Surreal<Client>, DbError> {
        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(db)
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
