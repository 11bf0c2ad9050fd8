use log::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tablerest_sqlite::{NamedParams, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
  #[error("Unsupported Content-Type")]
  UnsupportedContentType,
  #[error("Expected JSON object")]
  NotAnObject,
  #[error("Json error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Form error: {0}")]
  Form(#[from] serde_urlencoded::de::Error),
  #[error("Invalid field name: {0}")]
  InvalidFieldName(String),
}

/// Column values parsed from a request body. Keys are validated identifiers and thus safe to
/// interpolate into SQL (quoted).
#[derive(Debug, Default, PartialEq)]
pub struct Input(BTreeMap<String, Value>);

impl Input {
  pub fn is_empty(&self) -> bool {
    return self.0.is_empty();
  }

  pub fn column_names(&self) -> Vec<&str> {
    return self.0.keys().map(|k| k.as_str()).collect();
  }

  pub fn get(&self, column: &str) -> Option<&Value> {
    return self.0.get(column);
  }

  /// Named parameters with a `:` prefix for every column, e.g. `(":name", "foo")`.
  pub fn into_named_params(self) -> NamedParams {
    return self
      .0
      .into_iter()
      .map(|(name, value)| (Cow::Owned(prefix_colon(&name)), value))
      .collect();
  }
}

/// Parses a request body into column values.
///
/// JSON bodies must be objects. Without a Content-Type the body is parsed as
/// `application/x-www-form-urlencoded`.
pub fn parse_input(content_type: Option<&str>, body: &[u8]) -> Result<Input, ParamsError> {
  if body.iter().all(|b| b.is_ascii_whitespace()) {
    return Ok(Input::default());
  }

  let values: Vec<(String, Value)> = match content_type.map(media_type) {
    Some(MediaType::Json) => {
      let serde_json::Value::Object(map) = serde_json::from_slice::<serde_json::Value>(body)? else {
        return Err(ParamsError::NotAnObject);
      };
      map
        .into_iter()
        .map(|(k, v)| (k, json_value_to_param(v)))
        .collect()
    }
    Some(MediaType::Form) | None => parse_form(body)?,
    Some(MediaType::Other) => {
      debug!("Unsupported content type: {content_type:?}");
      return Err(ParamsError::UnsupportedContentType);
    }
  };

  let mut input = BTreeMap::<String, Value>::new();
  for (name, value) in values {
    if !is_valid_identifier(&name) {
      return Err(ParamsError::InvalidFieldName(name));
    }
    input.insert(name, value);
  }

  return Ok(Input(input));
}

#[derive(Debug, PartialEq)]
enum MediaType {
  Json,
  Form,
  Other,
}

/// Media types are matched case-insensitively, parameters such as `charset` are ignored.
fn media_type(content_type: &str) -> MediaType {
  let essence = content_type.split(';').next().unwrap_or_default().trim();
  if essence.eq_ignore_ascii_case("application/json") {
    return MediaType::Json;
  }
  if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
    return MediaType::Form;
  }
  return MediaType::Other;
}

fn parse_form(body: &[u8]) -> Result<Vec<(String, Value)>, ParamsError> {
  let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
  return Ok(
    pairs
      .into_iter()
      .map(|(k, v)| (k, Value::Text(v)))
      .collect(),
  );
}

/// Schema-less mapping of JSON values to SQLite values.
pub fn json_value_to_param(value: serde_json::Value) -> Value {
  return match value {
    serde_json::Value::Null => Value::Null,
    serde_json::Value::Bool(b) => Value::Integer(b as i64),
    serde_json::Value::Number(number) => {
      if let Some(n) = number.as_i64() {
        Value::Integer(n)
      } else if let Some(n) = number.as_f64() {
        // NOTE: u64 beyond i64::MAX end up here, "as" is lossy but doesn't panic.
        Value::Real(n)
      } else {
        warn!("Not a valid number: {number:?}");
        Value::Text(number.to_string())
      }
    }
    serde_json::Value::String(str) => Value::Text(str),
    // Nested structures are stored as JSON text.
    x @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => Value::Text(x.to_string()),
  };
}

/// Record ids are always bound as TEXT. SQLite's column affinity converts them for INTEGER
/// keys, while TEXT keys like "007" still match verbatim.
pub fn id_to_value(id: &str) -> Value {
  return Value::Text(id.to_string());
}

/// Plain SQL identifiers only: `[A-Za-z_][A-Za-z0-9_]*`.
#[inline]
pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  return (first.is_ascii_alphabetic() || first == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
}

#[inline]
pub(crate) fn prefix_colon(s: &str) -> String {
  let mut new = String::with_capacity(s.len() + 1);
  new.push(':');
  new.push_str(s);
  return new;
}
