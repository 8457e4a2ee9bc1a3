//! PostGIS access through a single `tokio-postgres` connection.

use async_trait::async_trait;
use log::{debug, error, info};
use tokio_postgres::{Client, NoTls};

use crate::config::ConnectionConfig;
use crate::error::{DatabaseError, Result};
use crate::identifiers::{Identifier, TableName};
use crate::pipeline::SpatialStore;
use crate::sql;
use crate::types::GeometryType;

/// A connected PostGIS database.
///
/// Every statement runs on the same connection, in autocommit mode: each DDL
/// statement is its own transaction.
pub struct PostgisClient {
    client: Client,
}

impl PostgisClient {
    /// Opens a connection and drives it on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connect`] if the server cannot be reached or
    /// rejects the credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!(
            "Connecting to {}:{}/{} as {}",
            config.host, config.port, config.dbname, config.user
        );
        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|source| DatabaseError::Connect {
                host: config.host.clone(),
                port: config.port,
                dbname: config.dbname.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {e}");
            }
        });

        Ok(Self { client })
    }

    /// Version string reported by the PostGIS extension.
    ///
    /// # Errors
    ///
    /// Fails when PostGIS is not installed in the connected database.
    pub async fn postgis_version(&self) -> Result<String> {
        let version = self
            .client
            .query_one(sql::postgis_version(), &[])
            .await
            .and_then(|row| row.try_get::<_, String>(0))
            .map_err(|source| DatabaseError::Statement {
                operation: "query PostGIS version",
                target: "postgis".to_string(),
                source,
            })?;
        Ok(version)
    }

    async fn execute_ddl(
        &self,
        statement: &str,
        operation: &'static str,
        table: &TableName,
    ) -> Result<()> {
        debug!("Executing: {statement}");
        self.client
            .batch_execute(statement)
            .await
            .map_err(|source| DatabaseError::Statement {
                operation,
                target: table.to_string(),
                source,
            })?;
        Ok(())
    }
}

#[async_trait]
impl SpatialStore for PostgisClient {
    async fn drop_table_if_exists(&mut self, table: &TableName) -> Result<()> {
        info!("Dropping table '{table}' if it exists...");
        self.execute_ddl(&sql::drop_table_if_exists(table), "drop table", table)
            .await?;
        info!("Table '{table}' dropped if it existed.");
        Ok(())
    }

    async fn create_table(
        &mut self,
        table: &TableName,
        geometry_column: &Identifier,
        geometry_type: GeometryType,
        srid: u32,
    ) -> Result<()> {
        info!("Creating table '{table}'...");
        let ddl = sql::create_table(table, geometry_column, geometry_type, srid);
        self.execute_ddl(&ddl, "create table", table).await?;
        info!("Table '{table}' created.");
        Ok(())
    }

    async fn count_rows(&mut self, table: &TableName) -> Result<u64> {
        let count = self
            .client
            .query_one(sql::count_rows(table).as_str(), &[])
            .await
            .and_then(|row| row.try_get::<_, i64>(0))
            .map_err(|source| DatabaseError::Statement {
                operation: "count rows in",
                target: table.to_string(),
                source,
            })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::Shp2PostgisError;

    #[tokio::test]
    async fn test_refused_connection_names_the_cause() {
        let config = ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            dbname: "gis".to_string(),
            user: "etl".to_string(),
            password: "secret".to_string(),
            connect_timeout: Duration::from_secs(2),
        };

        let Err(err) = PostgisClient::connect(&config).await else {
            panic!("connected to port 1");
        };
        assert!(matches!(
            err,
            Shp2PostgisError::Database(DatabaseError::Connect { .. })
        ));
        let message = err.to_string();
        assert!(
            message.starts_with("Failed to connect to 127.0.0.1:1/gis: error connecting to server: "),
            "{message}"
        );
        assert!(message.to_lowercase().contains("refused"), "{message}");
    }
}
