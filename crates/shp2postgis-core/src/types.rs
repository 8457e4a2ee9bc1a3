//! Data types describing a load: its options, the destination geometry, and
//! the report produced once it finishes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::identifiers::{Identifier, TableName};

/// Shapefile loaded when no path is given.
pub const DEFAULT_SHAPEFILE: &str = "../assets/stedin/Hoogspanningsstations.shp";

/// Destination table used when no table is given.
pub const DEFAULT_TABLE: &str = "stedin_hoogspanningsstations";

/// Geometry column name shared by the DDL and ogr2ogr's `GEOMETRY_NAME`.
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geom";

/// WGS 84.
pub const DEFAULT_SRID: u32 = 4326;

/// Program invoked to perform the load.
pub const DEFAULT_OGR2OGR: &str = "ogr2ogr";

/// Geometry type of the destination column.
///
/// Each variant knows both its PostGIS spelling (used in `GEOMETRY(type, srid)`)
/// and its ogr2ogr `-nlt` spelling.
///
/// # Examples
///
/// ```
/// use shp2postgis_core::types::GeometryType;
///
/// let ty: GeometryType = "multipolygon".parse().unwrap();
/// assert_eq!(ty, GeometryType::MultiPolygon);
/// assert_eq!(ty.postgis_name(), "MultiPolygon");
/// assert_eq!(ty.ogr_name(), "MULTIPOLYGON");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryType {
    /// Single points.
    Point,
    /// Single line strings.
    LineString,
    /// Single polygons.
    Polygon,
    /// Point collections.
    MultiPoint,
    /// Line string collections.
    MultiLineString,
    /// Polygon collections. Shapefile polygons may hold several rings, so
    /// this is the safe target for polygon layers.
    #[default]
    MultiPolygon,
    /// Any geometry.
    Geometry,
}

impl GeometryType {
    /// All variants, in declaration order.
    pub const ALL: [GeometryType; 7] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
        GeometryType::Geometry,
    ];

    /// The type name used in a PostGIS column definition.
    #[must_use]
    pub fn postgis_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::Geometry => "Geometry",
        }
    }

    /// The type name accepted by ogr2ogr's `-nlt` flag.
    #[must_use]
    pub fn ogr_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::Geometry => "GEOMETRY",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.postgis_name())
    }
}

impl FromStr for GeometryType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometryType::ALL
            .into_iter()
            .find(|ty| ty.ogr_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidOption {
                option: "geometry type".to_string(),
                message: format!(
                    "'{s}' is not one of {}",
                    GeometryType::ALL
                        .iter()
                        .map(GeometryType::postgis_name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}

/// What to do with the row count once the load finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verify {
    /// Do not count rows.
    Skip,
    /// Count rows and report them.
    Report,
    /// Count rows and fail unless they equal the source feature count.
    #[default]
    MatchSource,
}

impl Verify {
    /// Returns `true` if the destination table is counted after the load.
    #[must_use]
    pub fn counts_rows(&self) -> bool {
        !matches!(self, Verify::Skip)
    }
}

/// Everything needed to replace a table with the contents of a shapefile.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Path to the `.shp` file.
    pub shapefile: PathBuf,
    /// Destination table.
    pub table: TableName,
    /// Name of the geometry column.
    pub geometry_column: Identifier,
    /// Geometry type of the destination column.
    pub geometry_type: GeometryType,
    /// Target spatial reference; ogr2ogr reprojects into it.
    pub srid: u32,
    /// Post-load verification.
    pub verify: Verify,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            shapefile: PathBuf::from(DEFAULT_SHAPEFILE),
            table: TableName::new(None, Identifier::from_static(DEFAULT_TABLE)),
            geometry_column: Identifier::from_static(DEFAULT_GEOMETRY_COLUMN),
            geometry_type: GeometryType::default(),
            srid: DEFAULT_SRID,
            verify: Verify::default(),
        }
    }
}

/// Outcome of a completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Destination table
    pub table: String,
    /// Features in the source shapefile, if it was inspected
    pub source_features: Option<u64>,
    /// Rows in the destination table, if they were counted
    pub rows_loaded: Option<u64>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}
