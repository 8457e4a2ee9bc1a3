//! `shp2postgis-core` replaces a PostGIS table with the contents of an ESRI
//! Shapefile.
//!
//! A load is four steps run in sequence on one connection: drop the table,
//! create it with a typed geometry column, load the shapefile with GDAL's
//! `ogr2ogr`, and verify the row count against the shapefile's feature count.
//!
//! - [`config`]: connection settings from `DB_*` environment variables and `.env`.
//! - [`db`]: the `tokio-postgres` backed [`db::PostgisClient`].
//! - [`ogr2ogr`]: the external loader.
//! - [`shapefile`]: header inspection and feature counting.
//! - [`pipeline`]: the step sequence, generic over [`pipeline::SpatialStore`]
//!   and [`pipeline::LayerLoader`].

pub mod config;
pub mod db;
pub mod error;
pub mod identifiers;
pub mod ogr2ogr;
pub mod pipeline;
pub mod shapefile;
pub mod sql;
pub mod types;

pub use error::{Result, Shp2PostgisError};
