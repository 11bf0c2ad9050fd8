use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, header};
use axum::routing::any;
use log::*;
use std::borrow::Cow;
use std::sync::Arc;
use tablerest_sqlite::NamedParams;
use thiserror::Error;

mod error;
pub(crate) mod params;
mod query_builder;

pub use error::RestApiError;
pub use params::{Input, ParamsError, id_to_value, json_value_to_param, parse_input};

use crate::constants::RECORD_ID_PARAM;
use crate::database::Database;
use params::is_valid_identifier;
use query_builder::{insert_query, select_all_query, select_by_id_query, update_query};

#[derive(Debug, Error)]
#[error("Invalid table name: {0}")]
pub struct InvalidTableName(pub String);

/// Maps HTTP methods onto SQL statements against a single table:
///
///  * `GET` lists all records or reads the one given by id,
///  * `POST` inserts the request body as a new record,
///  * `PATCH` updates the record given by id with the request body.
#[derive(Clone, Debug)]
pub struct RestApi {
  state: Arc<RestApiState>,
}

#[derive(Debug)]
struct RestApiState {
  table_name: String,
  database: Database,
}

impl RestApi {
  pub fn new(table_name: impl Into<String>, database: Database) -> Result<Self, InvalidTableName> {
    let table_name: String = table_name.into();
    if !is_valid_identifier(&table_name) {
      return Err(InvalidTableName(table_name));
    }

    return Ok(Self {
      state: Arc::new(RestApiState {
        table_name,
        database,
      }),
    });
  }

  pub fn table_name(&self) -> &str {
    return &self.state.table_name;
  }

  pub fn database(&self) -> &Database {
    return &self.state.database;
  }

  /// Dispatches a single request: picks the statement based on `method`, binds `id` and the
  /// decoded `body` and renders the result as JSON.
  pub async fn execute(
    &self,
    method: &Method,
    id: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
  ) -> Result<serde_json::Value, RestApiError> {
    return match *method {
      Method::GET => match id {
        Some(id) => self.find(id).await,
        None => self.find_all().await,
      },
      Method::POST => self.post(parse_body(headers, body)?).await,
      Method::PATCH => {
        let Some(id) = id else {
          return Err(RestApiError::MissingRecordId);
        };
        self.patch(id, parse_body(headers, body)?).await
      }
      _ => {
        debug!("Unknown method: {method}");
        Err(RestApiError::UnknownMethod)
      }
    };
  }

  async fn find_all(&self) -> Result<serde_json::Value, RestApiError> {
    let records = self
      .database()
      .find_all(&select_all_query(self.table_name()))
      .await?;

    return Ok(serde_json::Value::Array(
      records.into_iter().map(serde_json::Value::Object).collect(),
    ));
  }

  async fn find(&self, id: &str) -> Result<serde_json::Value, RestApiError> {
    let params: NamedParams = vec![(Cow::Borrowed(RECORD_ID_PARAM), id_to_value(id))];
    let record = self
      .database()
      .find(&select_by_id_query(self.table_name()), params)
      .await?;

    return Ok(serde_json::Value::Object(record));
  }

  async fn post(&self, input: Input) -> Result<serde_json::Value, RestApiError> {
    let query = insert_query(self.table_name(), &input.column_names());
    let count = self
      .database()
      .insert(&query, input.into_named_params())
      .await?;

    return Ok(serde_json::Value::from(count));
  }

  async fn patch(&self, id: &str, input: Input) -> Result<serde_json::Value, RestApiError> {
    if input.get(&RECORD_ID_PARAM[1..]).is_some() {
      return Err(RestApiError::BadRequest("Invalid field name"));
    }

    let Some(query) = update_query(self.table_name(), &input.column_names()) else {
      return Err(RestApiError::BadRequest("Nothing to update"));
    };

    let mut params = input.into_named_params();
    params.push((Cow::Borrowed(RECORD_ID_PARAM), id_to_value(id)));

    let count = self.database().update(&query, params).await?;

    return Ok(serde_json::Value::from(count));
  }
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Input, RestApiError> {
  let content_type = match headers.get(header::CONTENT_TYPE) {
    // Non-ASCII content types are rejected as unsupported.
    Some(value) => Some(value.to_str().unwrap_or_default()),
    None => None,
  };

  return Ok(parse_input(content_type, body)?);
}

/// Routes for the collection (`/`) and single records (`/{id}`), to be nested under the
/// table's path.
pub fn router(api: RestApi) -> Router {
  return Router::new()
    .route("/", any(collection_handler))
    .route("/{id}", any(record_handler))
    .with_state(api);
}

async fn collection_handler(
  State(api): State<RestApi>,
  method: Method,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<serde_json::Value>, RestApiError> {
  return Ok(Json(api.execute(&method, None, &headers, &body).await?));
}

async fn record_handler(
  State(api): State<RestApi>,
  Path(id): Path<String>,
  method: Method,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<serde_json::Value>, RestApiError> {
  return Ok(Json(api.execute(&method, Some(&id), &headers, &body).await?));
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, StatusCode};
  use axum::response::IntoResponse;
  use serde_json::json;

  use super::*;
  use crate::config::DatabaseConfig;
  use crate::database::DatabaseError;

  async fn test_api() -> RestApi {
    let database = Database::connect(&DatabaseConfig::in_memory()).unwrap();
    database
      .run(
        r#"
          CREATE TABLE table_a (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL DEFAULT 'unnamed'
          )
        "#,
        (),
      )
      .await
      .unwrap();
    database
      .insert(
        "INSERT INTO table_a (id, name) VALUES (1, 'First Item'), (2, 'Second Item')",
        (),
      )
      .await
      .unwrap();

    return RestApi::new("table_a", database).unwrap();
  }

  fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::CONTENT_TYPE,
      HeaderValue::from_static("application/json"),
    );
    return headers;
  }

  #[test]
  fn test_invalid_table_name() {
    assert!(RestApi::new("table_a; DROP TABLE x", Database::new()).is_err());
    assert!(RestApi::new("", Database::new()).is_err());
  }

  #[tokio::test]
  async fn test_get() {
    let api = test_api().await;
    let headers = HeaderMap::new();

    let all = api
      .execute(&Method::GET, None, &headers, b"")
      .await
      .unwrap();
    assert_eq!(
      all,
      json!([
        {"id": 1, "name": "First Item"},
        {"id": 2, "name": "Second Item"},
      ])
    );

    let one = api
      .execute(&Method::GET, Some("2"), &headers, b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": 2, "name": "Second Item"}));

    let err = api
      .execute(&Method::GET, Some("56"), &headers, b"")
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      RestApiError::Database(DatabaseError::NotFound)
    ));
    assert_eq!(
      err.into_response().status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[tokio::test]
  async fn test_post() {
    let api = test_api().await;

    let count = api
      .execute(
        &Method::POST,
        None,
        &json_headers(),
        br#"{"id": 34, "name": "Third Item"}"#,
      )
      .await
      .unwrap();
    assert_eq!(count, json!(1));

    // Form encoded, also the default without content type.
    let count = api
      .execute(&Method::POST, None, &HeaderMap::new(), b"name=Fourth+Item")
      .await
      .unwrap();
    assert_eq!(count, json!(1));

    // Empty body inserts defaults.
    let count = api
      .execute(&Method::POST, None, &json_headers(), b"")
      .await
      .unwrap();
    assert_eq!(count, json!(1));

    let all = api
      .execute(&Method::GET, None, &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(
      all,
      json!([
        {"id": 1, "name": "First Item"},
        {"id": 2, "name": "Second Item"},
        {"id": 34, "name": "Third Item"},
        {"id": 35, "name": "Fourth Item"},
        {"id": 36, "name": "unnamed"},
      ])
    );
  }

  #[tokio::test]
  async fn test_post_errors() {
    let api = test_api().await;

    let err = api
      .execute(&Method::POST, None, &json_headers(), br#"{"missing": 1}"#)
      .await
      .unwrap_err();
    let RestApiError::Database(ref db_err) = err else {
      panic!("unexpected: {err:?}");
    };
    assert!(db_err.to_string().contains("no column named missing"));
    assert_eq!(
      err.into_response().status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );

    let err = api
      .execute(&Method::POST, None, &json_headers(), b"[]")
      .await
      .unwrap_err();
    assert!(matches!(err, RestApiError::BadRequest(_)));
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_patch() {
    let api = test_api().await;

    let count = api
      .execute(
        &Method::PATCH,
        Some("2"),
        &json_headers(),
        br#"{"name": "Updated Item"}"#,
      )
      .await
      .unwrap();
    assert_eq!(count, json!(1));

    let one = api
      .execute(&Method::GET, Some("2"), &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": 2, "name": "Updated Item"}));

    // Unknown records are no error.
    let count = api
      .execute(
        &Method::PATCH,
        Some("69"),
        &json_headers(),
        br#"{"name": "Nothing"}"#,
      )
      .await
      .unwrap();
    assert_eq!(count, json!(0));

    // Non-numeric ids bind as text and thus match nothing.
    let count = api
      .execute(&Method::PATCH, Some("abc"), &HeaderMap::new(), b"name=x")
      .await
      .unwrap();
    assert_eq!(count, json!(0));
  }

  #[tokio::test]
  async fn test_patch_errors() {
    let api = test_api().await;

    assert!(matches!(
      api
        .execute(&Method::PATCH, None, &json_headers(), br#"{"name": "x"}"#)
        .await,
      Err(RestApiError::MissingRecordId)
    ));
    assert!(matches!(
      api
        .execute(&Method::PATCH, Some("1"), &json_headers(), b"")
        .await,
      Err(RestApiError::BadRequest(_))
    ));
    assert!(matches!(
      api
        .execute(
          &Method::PATCH,
          Some("1"),
          &json_headers(),
          br#"{"__record_id": 5}"#
        )
        .await,
      Err(RestApiError::BadRequest(_))
    ));
  }

  #[tokio::test]
  async fn test_text_record_ids() {
    let database = Database::connect(&DatabaseConfig::in_memory()).unwrap();
    database
      .run("CREATE TABLE table_b (id TEXT PRIMARY KEY, name TEXT)", ())
      .await
      .unwrap();
    database
      .insert(
        "INSERT INTO table_b (id, name) VALUES ('007', 'Bond'), ('abc', 'Letters')",
        (),
      )
      .await
      .unwrap();
    let api = RestApi::new("table_b", database).unwrap();

    let one = api
      .execute(&Method::GET, Some("007"), &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": "007", "name": "Bond"}));

    let one = api
      .execute(&Method::GET, Some("abc"), &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": "abc", "name": "Letters"}));

    // "7" is not "007" for TEXT keys.
    assert!(matches!(
      api
        .execute(&Method::GET, Some("7"), &HeaderMap::new(), b"")
        .await,
      Err(RestApiError::Database(DatabaseError::NotFound))
    ));

    let count = api
      .execute(&Method::PATCH, Some("007"), &HeaderMap::new(), b"name=James")
      .await
      .unwrap();
    assert_eq!(count, json!(1));

    let one = api
      .execute(&Method::GET, Some("007"), &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": "007", "name": "James"}));
  }

  #[tokio::test]
  async fn test_integer_ids_bound_as_text() {
    let api = test_api().await;

    // Affinity of the INTEGER key converts the textual id.
    let one = api
      .execute(&Method::GET, Some("02"), &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(one, json!({"id": 2, "name": "Second Item"}));
  }

  #[tokio::test]
  async fn test_unknown_method() {
    let api = test_api().await;

    for method in [Method::DELETE, Method::PUT, Method::OPTIONS] {
      let err = api
        .execute(&method, Some("1"), &HeaderMap::new(), b"")
        .await
        .unwrap_err();
      assert!(matches!(err, RestApiError::UnknownMethod));

      let response = err.into_response();
      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let body: serde_json::Value = crate::test::unpack_json_response(response).await.unwrap();
      assert_eq!(body, json!({"error": "Unknown REQUEST_METHOD"}));
    }

    // Nothing was deleted.
    let all = api
      .execute(&Method::GET, None, &HeaderMap::new(), b"")
      .await
      .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);
  }
}
