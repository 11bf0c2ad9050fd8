use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::database::DatabaseError;

/// Publicly visible errors of the REST API.
///
/// NOTE: Do not use thiserror's #from, all mappings should be explicit.
#[derive(Debug, Error)]
pub enum RestApiError {
  #[error("Unknown REQUEST_METHOD")]
  UnknownMethod,
  #[error("Missing record id")]
  MissingRecordId,
  #[error("Bad request: {0}")]
  BadRequest(&'static str),
  #[error("{0}")]
  Database(DatabaseError),
}

impl From<DatabaseError> for RestApiError {
  fn from(err: DatabaseError) -> Self {
    return Self::Database(err);
  }
}

impl From<crate::rest_api::params::ParamsError> for RestApiError {
  fn from(err: crate::rest_api::params::ParamsError) -> Self {
    use crate::rest_api::params::ParamsError;

    return Self::BadRequest(match err {
      ParamsError::UnsupportedContentType => "Unsupported Content-Type",
      ParamsError::NotAnObject => "Expected JSON object",
      ParamsError::Json(_) => "Invalid JSON",
      ParamsError::Form(_) => "Invalid form data",
      ParamsError::InvalidFieldName(_) => "Invalid field name",
    });
  }
}

impl IntoResponse for RestApiError {
  fn into_response(self) -> Response {
    let message = match self {
      Self::Database(err) => return err.into_response(),
      Self::UnknownMethod => "Unknown REQUEST_METHOD",
      Self::MissingRecordId => "Missing record id",
      Self::BadRequest(msg) => msg,
    };

    return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
  }
}
