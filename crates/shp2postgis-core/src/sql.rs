//! SQL statements issued against the destination database.
//!
//! Identifiers are validated [`Identifier`]/[`TableName`] values, so they are
//! interpolated directly.

use crate::identifiers::{Identifier, TableName};
use crate::types::GeometryType;

/// `DROP TABLE IF EXISTS <table>;`
#[must_use]
pub fn drop_table_if_exists(table: &TableName) -> String {
    format!("DROP TABLE IF EXISTS {table};")
}

/// The destination table: a serial primary key plus one typed geometry column.
///
/// # Examples
///
/// ```
/// use shp2postgis_core::identifiers::{Identifier, TableName};
/// use shp2postgis_core::sql;
/// use shp2postgis_core::types::GeometryType;
///
/// let table: TableName = "stations".parse().unwrap();
/// let geom = Identifier::new("geom").unwrap();
/// let ddl = sql::create_table(&table, &geom, GeometryType::MultiPolygon, 4326);
/// assert!(ddl.contains("geom GEOMETRY(MultiPolygon, 4326)"));
/// ```
#[must_use]
pub fn create_table(
    table: &TableName,
    geometry_column: &Identifier,
    geometry_type: GeometryType,
    srid: u32,
) -> String {
    format!(
        "CREATE TABLE {table} (\n    \
         id SERIAL PRIMARY KEY,\n    \
         {geometry_column} GEOMETRY({}, {srid})\n\
         );",
        geometry_type.postgis_name()
    )
}

/// `SELECT COUNT(*) FROM <table>;`
#[must_use]
pub fn count_rows(table: &TableName) -> String {
    format!("SELECT COUNT(*) FROM {table};")
}

/// Fails unless the PostGIS extension is installed.
#[must_use]
pub fn postgis_version() -> &'static str {
    "SELECT PostGIS_Version();"
}
