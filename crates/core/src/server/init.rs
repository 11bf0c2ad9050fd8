use log::*;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::database::{Database, DatabaseError};
use crate::rest_api::{InvalidTableName, RestApi};

#[derive(Debug, Error)]
pub enum InitError {
  #[error("Connection error: {0}")]
  Connection(#[from] crate::connection::ConnectionError),
  #[error("Config error: {0}")]
  Config(#[from] crate::config::ConfigError),
  #[error("Table error: {0}")]
  Table(#[from] InvalidTableName),
  #[error("Database error: {0}")]
  Database(#[from] DatabaseError),
}

/// Connects to the database and sets up the API for the given table.
pub async fn init_rest_api(
  table_name: &str,
  config: &DatabaseConfig,
) -> Result<RestApi, InitError> {
  let database = Database::connect(config)?;

  // Not an error, the table may well be created later, e.g. through `Database::run`.
  if !table_exists(&database, table_name).await? {
    warn!("Table '{table_name}' doesn't exist (yet)");
  }

  return Ok(RestApi::new(table_name, database)?);
}

async fn table_exists(database: &Database, table_name: &str) -> Result<bool, DatabaseError> {
  let rows = database
    .run(
      "SELECT name FROM sqlite_schema WHERE type IN ('table', 'view') AND name = $1",
      [tablerest_sqlite::Value::Text(table_name.to_string())],
    )
    .await?;
  return Ok(!rows.is_empty());
}
