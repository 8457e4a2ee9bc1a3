//! Display utilities for formatting CLI output.
//!
//! Results are printed as two-column property tables with [`tabled`].

use std::time::Duration;

use tabled::{Table, Tabled};

use shp2postgis_core::shapefile::ShapefileInfo;
use shp2postgis_core::types::LoadReport;

/// One line of a property table.
#[derive(Tabled)]
pub struct PropertyRow {
    /// Property name.
    #[tabled(rename = "Property")]
    pub name: String,
    /// Rendered value.
    #[tabled(rename = "Value")]
    pub value: String,
}

impl PropertyRow {
    fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Rows describing a shapefile.
#[must_use]
pub fn shapefile_rows(info: &ShapefileInfo) -> Vec<PropertyRow> {
    vec![
        PropertyRow::new("Path", info.path.display()),
        PropertyRow::new("Shape type", info.shape_type),
        PropertyRow::new("Features", info.feature_count),
        PropertyRow::new("Deleted records", info.deleted_records),
        PropertyRow::new(
            "Counted from",
            if info.indexed { "index (.shx)" } else { "record scan" },
        ),
        PropertyRow::new("Extent", info.bbox),
        PropertyRow::new("Suggested geometry type", info.shape_type.geometry_type()),
    ]
}

/// Rows describing a finished load.
#[must_use]
pub fn load_report_rows(report: &LoadReport) -> Vec<PropertyRow> {
    vec![
        PropertyRow::new("Table", &report.table),
        PropertyRow::new("Source features", or_skipped(report.source_features)),
        PropertyRow::new("Rows loaded", or_skipped(report.rows_loaded)),
        PropertyRow::new("Elapsed", format_elapsed(report.elapsed)),
    ]
}

/// Prints a shapefile summary to standard output.
pub fn display_shapefile_info(info: &ShapefileInfo) {
    println!("\nShapefile: {}\n", info.path.display());
    println!("{}", Table::new(shapefile_rows(info)));
}

/// Prints a load summary to standard output.
pub fn display_load_report(report: &LoadReport) {
    println!("\nLoaded table '{}'\n", report.table);
    println!("{}", Table::new(load_report_rows(report)));
}

fn or_skipped(value: Option<u64>) -> String {
    value.map_or_else(|| "skipped".to_string(), |v| v.to_string())
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}
