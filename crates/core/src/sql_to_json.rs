use base64::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
  #[error("Float not finite")]
  Finite,
}

pub(crate) fn value_to_json(value: rusqlite::types::Value) -> Result<serde_json::Value, JsonError> {
  use rusqlite::types::Value;

  return Ok(match value {
    Value::Null => serde_json::Value::Null,
    Value::Real(real) => {
      let Some(number) = serde_json::Number::from_f64(real) else {
        return Err(JsonError::Finite);
      };
      serde_json::Value::Number(number)
    }
    Value::Integer(integer) => serde_json::Value::Number(serde_json::Number::from(integer)),
    Value::Blob(blob) => serde_json::Value::String(BASE64_URL_SAFE.encode(blob)),
    Value::Text(text) => serde_json::Value::String(text),
  });
}

/// Serialize SQL row to a json object keyed by column name.
///
/// NOTE: For duplicate column names, e.g. `SELECT 1 AS a, 2 AS a`, the last value wins.
pub fn row_to_json(
  row: tablerest_sqlite::Row,
) -> Result<serde_json::Map<String, serde_json::Value>, JsonError> {
  let mut map = serde_json::Map::<String, serde_json::Value>::default();
  for (name, value) in row.into_named_values() {
    map.insert(name, value_to_json(value)?);
  }
  return Ok(map);
}

/// Turns rows into a list of json objects.
pub fn rows_to_json(
  rows: tablerest_sqlite::Rows,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, JsonError> {
  return rows.into_iter().map(row_to_json).collect();
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn test_rows_to_json() {
    let conn = tablerest_sqlite::Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        r#"
          CREATE TABLE test_table (
            id    INTEGER PRIMARY KEY,
            name  TEXT,
            score REAL,
            data  BLOB
          ) STRICT;
          INSERT INTO test_table (id, name, score, data) VALUES (1, 'first', 0.5, X'0102');
          INSERT INTO test_table (id, name, score, data) VALUES (2, NULL, NULL, NULL);
        "#,
      )
      .await
      .unwrap();

    let rows = conn
      .query("SELECT * FROM test_table ORDER BY id", ())
      .await
      .unwrap();
    let json = rows_to_json(rows).unwrap();

    assert_eq!(
      serde_json::Value::Array(json.into_iter().map(serde_json::Value::Object).collect()),
      json!([
        {"id": 1, "name": "first", "score": 0.5, "data": BASE64_URL_SAFE.encode([1u8, 2u8])},
        {"id": 2, "name": null, "score": null, "data": null},
      ])
    );
  }

  #[test]
  fn test_non_finite_real() {
    assert!(matches!(
      value_to_json(rusqlite::types::Value::Real(f64::NAN)),
      Err(JsonError::Finite)
    ));
  }
}
