//! Validated SQL identifiers.
//!
//! Table and column names are interpolated into DDL and passed to ogr2ogr,
//! so they are restricted to plain identifiers. They are emitted unquoted:
//! PostgreSQL folds them to lower case, the same way ogr2ogr launders layer
//! names, so the table created here is the one ogr2ogr writes into.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A single unquoted SQL identifier such as `geom` or `public`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates `name` as an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidIdentifier`] if the name is empty, too
    /// long, or contains anything other than ASCII letters, digits and
    /// underscores, or starts with a digit.
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        validate(name)?;
        Ok(Self(name.to_string()))
    }

    /// Wraps a compile-time constant that is known to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(validate(name).is_ok(), "invalid built-in identifier {name}");
        Self(name.to_string())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A destination table, optionally qualified with a schema.
///
/// # Examples
///
/// ```
/// use shp2postgis_core::identifiers::TableName;
///
/// let table: TableName = "gis.stations".parse().unwrap();
/// assert_eq!(table.schema().map(|s| s.as_str()), Some("gis"));
/// assert_eq!(table.name().as_str(), "stations");
/// assert_eq!(table.to_string(), "gis.stations");
///
/// assert!("1stations".parse::<TableName>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: Option<Identifier>,
    name: Identifier,
}

impl TableName {
    /// Builds a table name from its parts.
    #[must_use]
    pub fn new(schema: Option<Identifier>, name: Identifier) -> Self {
        Self { schema, name }
    }

    /// The schema, if the name was qualified.
    #[must_use]
    pub fn schema(&self) -> Option<&Identifier> {
        self.schema.as_ref()
    }

    /// The unqualified table name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for TableName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((schema, name)) => {
                if name.contains('.') {
                    return Err(invalid(s, "expected at most one '.' (schema.table)"));
                }
                Ok(Self::new(Some(Identifier::new(schema)?), Identifier::new(name)?))
            },
            None => Ok(Self::new(None, Identifier::new(s)?)),
        }
    }
}

fn validate(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid(name, "name is empty"));
    };
    if !is_ident_start(first) || !chars.all(is_ident_continue) {
        return Err(invalid(
            name,
            "must be alphanumeric or underscore and start with a letter or underscore",
        ));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid(
            name,
            &format!("longer than {MAX_IDENTIFIER_LEN} bytes"),
        ));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn is_ident_start(value: char) -> bool {
    value == '_' || value.is_ascii_alphabetic()
}

fn is_ident_continue(value: char) -> bool {
    is_ident_start(value) || value.is_ascii_digit()
}
