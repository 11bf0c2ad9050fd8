use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;
use serde::{Deserialize, Serialize};
use tablerest_sqlite::{Connection, Params};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::connection::{ConnectionError, connect};
use crate::sql_to_json::{JsonError, row_to_json, rows_to_json};

/// A single row keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Structured error body: `{"status": "error", "message": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
  pub status: String,
  pub message: String,
}

impl ErrorPayload {
  pub fn new(message: impl Into<String>) -> Self {
    return Self {
      status: "error".to_string(),
      message: message.into(),
    };
  }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
  #[error("Not connected to a database")]
  NotConnected,
  #[error("{}", driver_message(.0))]
  Driver(#[from] tablerest_sqlite::Error),
  #[error("Could not fetch")]
  NotFound,
  #[error("Could not serialize: {0}")]
  Json(#[from] JsonError),
}

impl DatabaseError {
  pub fn status(&self) -> StatusCode {
    // Every failure, including a missing row, is reported as an internal error.
    return match self {
      Self::NotConnected | Self::Driver(_) | Self::NotFound | Self::Json(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
  }

  pub fn payload(&self) -> ErrorPayload {
    return ErrorPayload::new(self.to_string());
  }
}

impl IntoResponse for DatabaseError {
  fn into_response(self) -> Response {
    return (self.status(), Json(self.payload())).into_response();
  }
}

/// Database access object. Thin wrapper over a single, optional connection exposing CRUD-shaped
/// operations, which return rows as JSON records or affected-row counts.
///
/// Failures are logged and returned as [`DatabaseError`], which know their HTTP status.
#[derive(Clone, Debug, Default)]
pub struct Database {
  conn: Option<Connection>,
}

impl Database {
  /// Creates an unconnected instance. Use [`Database::connect`] or [`Database::set_connection`]
  /// before running queries.
  pub fn new() -> Self {
    return Self { conn: None };
  }

  pub fn with_connection(conn: Connection) -> Self {
    return Self { conn: Some(conn) };
  }

  /// Connects according to the given config.
  pub fn connect(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
    return Ok(Self::with_connection(connect(config)?));
  }

  pub fn set_connection(&mut self, conn: Connection) {
    self.conn = Some(conn);
  }

  pub fn is_connected(&self) -> bool {
    return self.conn.is_some();
  }

  pub fn connection(&self) -> Option<&Connection> {
    return self.conn.as_ref();
  }

  fn check_connected(&self) -> Result<&Connection, DatabaseError> {
    return self.conn.as_ref().ok_or(DatabaseError::NotConnected);
  }

  /// Runs a parameter-less query and returns all rows.
  pub async fn find_all(&self, sql: &str) -> Result<Vec<Record>, DatabaseError> {
    let rows = self
      .check_connected()?
      .query(sql, ())
      .await
      .map_err(|err| log_error(sql, err))?;

    return Ok(rows_to_json(rows)?);
  }

  /// Returns the first row of the result or [`DatabaseError::NotFound`].
  pub async fn find(
    &self,
    sql: &str,
    params: impl Params + Send + 'static,
  ) -> Result<Record, DatabaseError> {
    let Some(row) = self
      .check_connected()?
      .query_row(sql, params)
      .await
      .map_err(|err| log_error(sql, err))?
    else {
      debug!("No record for: {sql}");
      return Err(DatabaseError::NotFound);
    };

    return Ok(row_to_json(row)?);
  }

  /// Executes an INSERT, returns the number of inserted rows.
  pub async fn insert(
    &self,
    sql: &str,
    params: impl Params + Send + 'static,
  ) -> Result<usize, DatabaseError> {
    return self.execute(sql, params).await;
  }

  /// Executes an UPDATE, returns the number of updated rows.
  pub async fn update(
    &self,
    sql: &str,
    params: impl Params + Send + 'static,
  ) -> Result<usize, DatabaseError> {
    return self.execute(sql, params).await;
  }

  /// Runs an arbitrary statement and returns all rows it yields, if any.
  pub async fn run(
    &self,
    sql: &str,
    params: impl Params + Send + 'static,
  ) -> Result<Vec<Record>, DatabaseError> {
    let rows = self
      .check_connected()?
      .query(sql, params)
      .await
      .map_err(|err| log_error(sql, err))?;

    return Ok(rows_to_json(rows)?);
  }

  /// Closes the underlying connection, if any.
  pub async fn close(self) -> Result<(), DatabaseError> {
    if let Some(conn) = self.conn {
      conn.close().await?;
    }
    return Ok(());
  }

  async fn execute(
    &self,
    sql: &str,
    params: impl Params + Send + 'static,
  ) -> Result<usize, DatabaseError> {
    return self
      .check_connected()?
      .execute(sql, params)
      .await
      .map_err(|err| log_error(sql, err));
  }
}

fn driver_message(err: &tablerest_sqlite::Error) -> String {
  return err.driver_message();
}

fn log_error(sql: &str, err: tablerest_sqlite::Error) -> DatabaseError {
  warn!("Query failed '{sql}': {err}");
  return DatabaseError::Driver(err);
}
