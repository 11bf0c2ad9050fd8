#![allow(clippy::needless_return)]

mod args;

pub use args::{DefaultCommandLineArgs, ServerArgs, SubCommands};

use tablerest::rest_api::json_value_to_param;
use tablerest_sqlite::Value;

/// Parses a `--param` value as JSON, e.g. `42` or `null`. Anything else is passed as text.
pub fn parse_param(param: String) -> Value {
  return match serde_json::from_str::<serde_json::Value>(&param) {
    Ok(value) => json_value_to_param(value),
    Err(_) => Value::Text(param),
  };
}
