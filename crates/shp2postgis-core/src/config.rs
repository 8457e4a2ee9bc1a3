//! Database connection settings read from the environment.
//!
//! The connection is described by `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`
//! and `DB_PASSWORD`, optionally supplied through a `.env` file. The same
//! settings feed both the `tokio-postgres` client and the `PG:` datasource
//! string handed to ogr2ogr.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::error::ConfigError;

/// Environment variable holding the database host.
pub const DB_HOST: &str = "DB_HOST";
/// Environment variable holding the database port.
pub const DB_PORT: &str = "DB_PORT";
/// Environment variable holding the database name.
pub const DB_NAME: &str = "DB_NAME";
/// Environment variable holding the database user.
pub const DB_USER: &str = "DB_USER";
/// Environment variable holding the database password.
pub const DB_PASSWORD: &str = "DB_PASSWORD";
/// Optional connect timeout in seconds.
pub const DB_CONNECT_TIMEOUT: &str = "DB_CONNECT_TIMEOUT";

/// Connect timeout used when `DB_CONNECT_TIMEOUT` is unset.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const REDACTED: &str = "********";

/// Loads a `.env` file into the process environment.
///
/// Variables that are already set are left untouched. Without an explicit
/// path, `.env` is searched for from the working directory upwards and a
/// missing file is not an error.
///
/// # Errors
///
/// Returns [`ConfigError::EnvFile`] if an explicit `path` cannot be loaded, or
/// if a discovered `.env` exists but cannot be parsed.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("Loaded environment from {}", path.display());
        },
        None => match dotenvy::dotenv() {
            Ok(found) => debug!("Loaded environment from {}", found.display()),
            Err(err) if err.not_found() => debug!("No .env file found"),
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: ".env".into(),
                    source,
                });
            },
        },
    }
    Ok(())
}

/// Connection parameters for the target PostGIS database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Role to connect as
    pub user: String,
    /// Password for `user`
    pub password: String,
    /// How long to wait for the connection to be established
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ConnectionConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] when one of the five `DB_*`
    /// variables is unset or empty, and [`ConfigError::InvalidOption`] when the
    /// port or timeout is not a number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingRequired {
                    option: key.to_string(),
                })
        };

        let host = required(DB_HOST)?;
        let port = required(DB_PORT)?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidOption {
                option: DB_PORT.to_string(),
                message: format!("'{port}' is not a valid port"),
            })?;
        let dbname = required(DB_NAME)?;
        let user = required(DB_USER)?;
        let password = required(DB_PASSWORD)?;

        let connect_timeout = match lookup(DB_CONNECT_TIMEOUT).filter(|v| !v.is_empty()) {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidOption {
                    option: DB_CONNECT_TIMEOUT.to_string(),
                    message: format!("'{secs}' is not a whole number of seconds"),
                })?,
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        Ok(Self {
            host,
            port,
            dbname,
            user,
            password,
            connect_timeout,
        })
    }

    /// Builds the `tokio-postgres` configuration.
    #[must_use]
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .connect_timeout(self.connect_timeout)
            .application_name(env!("CARGO_PKG_NAME"));
        config
    }

    /// The OGR PostgreSQL datasource string, e.g.
    /// `PG:host=localhost port=5432 dbname=gis user=etl password=secret`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use shp2postgis_core::config::ConnectionConfig;
    ///
    /// let config = ConnectionConfig {
    ///     host: "localhost".into(),
    ///     port: 5432,
    ///     dbname: "gis".into(),
    ///     user: "etl".into(),
    ///     password: "s3cret".into(),
    ///     connect_timeout: Duration::from_secs(10),
    /// };
    /// assert_eq!(
    ///     config.ogr_connection_string(),
    ///     "PG:host=localhost port=5432 dbname=gis user=etl password=s3cret"
    /// );
    /// ```
    #[must_use]
    pub fn ogr_connection_string(&self) -> String {
        self.render_ogr(&self.password)
    }

    /// Same as [`ConnectionConfig::ogr_connection_string`] with the password
    /// masked, for logging.
    #[must_use]
    pub fn ogr_connection_string_redacted(&self) -> String {
        self.render_ogr(REDACTED)
    }

    fn render_ogr(&self, password: &str) -> String {
        format!(
            "PG:host={} port={} dbname={} user={} password={}",
            conninfo_value(&self.host),
            self.port,
            conninfo_value(&self.dbname),
            conninfo_value(&self.user),
            conninfo_value(password),
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Quotes a value for a libpq `key=value` connection string when needed.
fn conninfo_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
