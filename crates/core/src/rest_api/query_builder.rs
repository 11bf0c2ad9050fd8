use itertools::Itertools;

use crate::constants::{RECORD_ID_COLUMN, RECORD_ID_PARAM};

// NOTE: All builders expect table and column names to be validated identifiers, see
// `params::is_valid_identifier`. They're quoted regardless to not clash with keywords.

pub(crate) fn select_all_query(table_name: &str) -> String {
  return format!(r#"SELECT * FROM "{table_name}""#);
}

pub(crate) fn select_by_id_query(table_name: &str) -> String {
  return format!(r#"SELECT * FROM "{table_name}" WHERE "{RECORD_ID_COLUMN}" = {RECORD_ID_PARAM}"#);
}

pub(crate) fn insert_query(table_name: &str, column_names: &[&str]) -> String {
  if column_names.is_empty() {
    return format!(r#"INSERT INTO "{table_name}" DEFAULT VALUES"#);
  }

  let columns = column_names.iter().map(|c| format!(r#""{c}""#)).join(", ");
  let values = column_names.iter().map(|c| format!(":{c}")).join(", ");

  return format!(r#"INSERT INTO "{table_name}" ({columns}) VALUES ({values})"#);
}

/// Returns `None` if there's nothing to update.
pub(crate) fn update_query(table_name: &str, column_names: &[&str]) -> Option<String> {
  if column_names.is_empty() {
    return None;
  }

  let assignments = column_names
    .iter()
    .map(|c| format!(r#""{c}" = :{c}"#))
    .join(", ");

  return Some(format!(
    r#"UPDATE "{table_name}" SET {assignments} WHERE "{RECORD_ID_COLUMN}" = {RECORD_ID_PARAM}"#
  ));
}
