//! Custom error types for `shp2postgis` operations.
//!
//! Each stage of a load (configuration, database, ogr2ogr, shapefile
//! inspection, verification) has its own error enum. They are gathered under
//! [`Shp2PostgisError`] so the CLI can render a message and a hint for any
//! failure.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Main error type for `shp2postgis` operations.
#[derive(Debug, Error)]
pub enum Shp2PostgisError {
    /// Configuration errors (environment, options, identifiers)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection and statement errors
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// External tool errors (ogr2ogr)
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Shapefile inspection errors
    #[error(transparent)]
    Shapefile(#[from] ShapefileError),

    /// Post-load verification errors
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Configuration errors.
///
/// These errors occur when the environment or command-line options are
/// missing or invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },

    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Table or column name that cannot be used as an identifier
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// An explicitly requested `.env` file could not be loaded
    #[error("Failed to load environment file '{path}': {source}")]
    EnvFile {
        /// The env file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: dotenvy::Error,
    },
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open a connection
    #[error("Failed to connect to {host}:{port}/{dbname}: {}", pg_cause(.source))]
    Connect {
        /// Database host
        host: String,
        /// Database port
        port: u16,
        /// Database name
        dbname: String,
        /// The underlying error
        #[source]
        source: tokio_postgres::Error,
    },

    /// A statement failed
    #[error("Failed to {operation} '{target}': {}", pg_cause(.source))]
    Statement {
        /// What was being done (e.g., "drop table")
        operation: &'static str,
        /// The object the statement targeted
        target: String,
        /// The underlying error
        #[source]
        source: tokio_postgres::Error,
    },
}

/// Renders a `tokio_postgres::Error` with its cause.
///
/// The error's own `Display` is only its kind ("db error"). Server errors are
/// shown by their message, detail and hint; client-side errors by their
/// source chain.
fn pg_cause(err: &tokio_postgres::Error) -> String {
    if let Some(db) = err.as_db_error() {
        let mut message = db.message().to_string();
        if let Some(detail) = db.detail() {
            message.push_str(&format!(" ({detail})"));
        }
        if let Some(hint) = db.hint() {
            message.push_str(&format!(" [{hint}]"));
        }
        return message;
    }
    error_chain(err)
}

/// Joins an error and its sources with `": "`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = inner.source();
    }
    message
}

/// External tool errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program is not installed or not on `PATH`
    #[error("Program '{program}' not found")]
    NotFound {
        /// The program name or path
        program: String,
    },

    /// The program could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// The program name or path
        program: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("'{program}' exited with {status}")]
    Failed {
        /// The program name or path
        program: String,
        /// Exit status reported by the OS
        status: ExitStatus,
    },
}

/// Shapefile inspection errors.
#[derive(Debug, Error)]
pub enum ShapefileError {
    /// The `.shp` file does not exist
    #[error("Shapefile not found: '{path}'")]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Reading one of the shapefile components failed
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// The file being read
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// Header bytes do not describe a valid shapefile
    #[error("Invalid shapefile header in '{path}': {message}")]
    InvalidHeader {
        /// The file being read
        path: PathBuf,
        /// What is wrong with the header
        message: String,
    },
}

/// Verification errors.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The loaded table does not contain one row per source feature
    #[error("Table '{table}' has {actual} rows but the source has {expected} features")]
    RowCountMismatch {
        /// Destination table
        table: String,
        /// Feature count of the source shapefile
        expected: u64,
        /// Row count of the destination table
        actual: u64,
    },
}

/// Type alias for Results using `Shp2PostgisError`.
pub type Result<T> = std::result::Result<T, Shp2PostgisError>;

impl Shp2PostgisError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Database(e) => format!("Database error: {e}"),
            Self::Tool(e) => e.user_message(),
            Self::Shapefile(e) => e.to_string(),
            Self::Verify(e) => format!("Verification failed: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.recovery_suggestion(),
            Self::Database(e) => e.recovery_suggestion(),
            Self::Tool(e) => e.recovery_suggestion(),
            Self::Shapefile(ShapefileError::NotFound { .. }) => {
                Some("Check that the shapefile path is correct and the file exists.".to_string())
            },
            Self::Shapefile(ShapefileError::InvalidHeader { .. }) => {
                Some("Make sure the path points at the .shp file of a shapefile.".to_string())
            },
            Self::Verify(_) => Some(
                "Inspect the ogr2ogr output above; features may have been skipped.".to_string(),
            ),
            Self::Shapefile(ShapefileError::Read { .. }) => None,
        }
    }
}

impl ConfigError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::MissingRequired { option } if option.starts_with("DB_") => Some(format!(
                "Set {option} in the environment or in a .env file."
            )),
            Self::InvalidIdentifier { .. } => Some(
                "Use letters, digits and underscores, starting with a letter or underscore."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl DatabaseError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Connect { .. } => Some(
                "Check DB_HOST, DB_PORT, DB_NAME, DB_USER and DB_PASSWORD, and that the server is reachable."
                    .to_string(),
            ),
            Self::Statement { operation, .. } if *operation == "query PostGIS version" => {
                Some("Run 'CREATE EXTENSION postgis;' in the target database.".to_string())
            },
            Self::Statement { .. } => None,
        }
    }
}

impl ToolError {
    fn user_message(&self) -> String {
        match self {
            Self::Failed { program, status } => match status.code() {
                Some(code) => format!("{program} failed with exit code {code}"),
                None => format!("{program} was terminated by a signal"),
            },
            _ => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => Some(
                "Install GDAL (which provides ogr2ogr) or pass --ogr2ogr with its full path."
                    .to_string(),
            ),
            Self::Spawn { .. } | Self::Failed { .. } => None,
        }
    }
}
