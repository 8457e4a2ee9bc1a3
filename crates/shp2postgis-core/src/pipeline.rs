//! The load pipeline: drop, create, load, verify.
//!
//! The database and the loader are reached through the [`SpatialStore`] and
//! [`LayerLoader`] traits so the sequence can run against in-memory fakes.

use std::time::Instant;

use async_trait::async_trait;
use log::{info, warn};

use crate::error::{Result, VerifyError};
use crate::identifiers::{Identifier, TableName};
use crate::shapefile;
use crate::types::{GeometryType, LoadOptions, LoadReport, Verify};

/// Destination database operations used by a load.
#[async_trait]
pub trait SpatialStore: Send {
    /// Drops `table` if it exists.
    async fn drop_table_if_exists(&mut self, table: &TableName) -> Result<()>;

    /// Creates `table` with a serial key and one geometry column.
    async fn create_table(
        &mut self,
        table: &TableName,
        geometry_column: &Identifier,
        geometry_type: GeometryType,
        srid: u32,
    ) -> Result<()>;

    /// Number of rows in `table`.
    async fn count_rows(&mut self, table: &TableName) -> Result<u64>;
}

/// Copies a shapefile into the destination table.
#[async_trait]
pub trait LayerLoader: Send {
    /// Loads `options.shapefile` into `options.table`.
    async fn load(&mut self, options: &LoadOptions) -> Result<()>;
}

/// Replaces `options.table` with the contents of `options.shapefile`.
///
/// Steps run strictly in order and the first failure ends the run:
///
/// 1. inspect the shapefile (unless verification is [`Verify::Skip`]),
/// 2. drop the table if it exists,
/// 3. create the table,
/// 4. load the shapefile,
/// 5. count the rows and apply `options.verify`.
///
/// # Errors
///
/// Returns the error of the first step that fails. Under
/// [`Verify::MatchSource`] a row count that differs from the source feature
/// count is a [`VerifyError::RowCountMismatch`].
pub async fn run_load<S, L>(
    store: &mut S,
    loader: &mut L,
    options: &LoadOptions,
) -> Result<LoadReport>
where
    S: SpatialStore + ?Sized,
    L: LayerLoader + ?Sized,
{
    let started = Instant::now();
    let table = &options.table;

    let source_features = if options.verify.counts_rows() {
        let info = shapefile::inspect(&options.shapefile)?;
        info!(
            "Source {} has {} {} feature(s)",
            info.path.display(),
            info.feature_count,
            info.shape_type
        );
        let native = info.shape_type.geometry_type();
        if options.geometry_type != GeometryType::Geometry
            && native != GeometryType::Geometry
            && native != options.geometry_type
        {
            warn!(
                "Source shapes are {} but the table column is {}; ogr2ogr will convert them",
                info.shape_type, options.geometry_type
            );
        }
        Some(info.feature_count)
    } else {
        None
    };

    store.drop_table_if_exists(table).await?;
    store
        .create_table(
            table,
            &options.geometry_column,
            options.geometry_type,
            options.srid,
        )
        .await?;
    loader.load(options).await?;

    let rows_loaded = if options.verify.counts_rows() {
        info!("Verifying data in PostGIS...");
        let rows = store.count_rows(table).await?;
        info!("Total rows in table '{table}': {rows}");
        Some(rows)
    } else {
        None
    };

    if let (Verify::MatchSource, Some(expected), Some(actual)) =
        (options.verify, source_features, rows_loaded)
    {
        if expected != actual {
            return Err(VerifyError::RowCountMismatch {
                table: table.to_string(),
                expected,
                actual,
            }
            .into());
        }
    }

    Ok(LoadReport {
        table: table.to_string(),
        source_features,
        rows_loaded,
        elapsed: started.elapsed(),
    })
}
