//! Loading a shapefile with GDAL's `ogr2ogr`.
//!
//! The layer is written into the PostgreSQL table named by the load options,
//! reprojected to the target SRID, with the geometry column name and type
//! forced to match the table created beforehand.

use std::ffi::OsString;
use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use crate::config::ConnectionConfig;
use crate::error::{Result, ToolError};
use crate::pipeline::LayerLoader;
use crate::types::LoadOptions;

/// Runs `ogr2ogr` against one PostgreSQL database.
#[derive(Debug, Clone)]
pub struct Ogr2Ogr {
    program: String,
    connection: ConnectionConfig,
}

impl Ogr2Ogr {
    /// Creates a loader that invokes `program` (a name on `PATH` or a path).
    #[must_use]
    pub fn new(program: impl Into<String>, connection: ConnectionConfig) -> Self {
        Self {
            program: program.into(),
            connection,
        }
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program for `options`.
    ///
    /// The order is fixed: output format, destination datasource, input
    /// file, then layer name, target SRS, layer creation options and
    /// geometry type.
    #[must_use]
    pub fn args(&self, options: &LoadOptions) -> Vec<OsString> {
        self.args_with_datasource(options, self.connection.ogr_connection_string())
    }

    /// The command line with the password masked.
    #[must_use]
    pub fn display_command(&self, options: &LoadOptions) -> String {
        let args = self
            .args_with_datasource(options, self.connection.ogr_connection_string_redacted());
        std::iter::once(self.program.clone())
            .chain(args.iter().map(|arg| shell_quote(&arg.to_string_lossy())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn args_with_datasource(&self, options: &LoadOptions, datasource: String) -> Vec<OsString> {
        vec![
            "-f".into(),
            "PostgreSQL".into(),
            datasource.into(),
            options.shapefile.clone().into_os_string(),
            "-nln".into(),
            options.table.to_string().into(),
            "-t_srs".into(),
            format!("EPSG:{}", options.srid).into(),
            "-lco".into(),
            format!("GEOMETRY_NAME={}", options.geometry_column).into(),
            "-lco".into(),
            "OVERWRITE=YES".into(),
            "-nlt".into(),
            options.geometry_type.ogr_name().into(),
        ]
    }
}

#[async_trait]
impl LayerLoader for Ogr2Ogr {
    async fn load(&mut self, options: &LoadOptions) -> Result<()> {
        info!("Loading Shapefile into PostGIS...");
        debug!("Running: {}", self.display_command(options));

        let status = Command::new(&self.program)
            .args(self.args(options))
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => ToolError::NotFound {
                    program: self.program.clone(),
                },
                _ => ToolError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;

        if !status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status,
            }
            .into());
        }

        info!("Shapefile loaded successfully.");
        Ok(())
    }
}

/// Quotes an argument for display when it contains whitespace or quotes.
fn shell_quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
