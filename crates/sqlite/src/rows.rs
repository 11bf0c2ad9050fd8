use rusqlite::{Statement, types};
use std::fmt::Debug;
use std::sync::Arc;

pub(crate) type ColumnNames = Arc<Vec<String>>;

pub(crate) fn column_names(stmt: &Statement<'_>) -> ColumnNames {
  return Arc::new(
    stmt
      .column_names()
      .into_iter()
      .map(|name| name.to_string())
      .collect(),
  );
}

/// Fully materialized result set. All rows share the same column names.
#[derive(Debug)]
pub struct Rows(pub(crate) Vec<Row>);

impl Rows {
  pub fn from_rows(mut rows: rusqlite::Rows) -> rusqlite::Result<Self> {
    let names = rows
      .as_ref()
      .map_or_else(|| Arc::new(vec![]), column_names);

    let mut result = vec![];
    while let Some(row) = rows.next()? {
      result.push(Row::from_row(row, names.clone())?);
    }

    return Ok(Self(result));
  }

  pub fn len(&self) -> usize {
    return self.0.len();
  }

  pub fn is_empty(&self) -> bool {
    return self.0.is_empty();
  }
}

impl IntoIterator for Rows {
  type Item = Row;
  type IntoIter = std::vec::IntoIter<Self::Item>;

  fn into_iter(self) -> Self::IntoIter {
    return self.0.into_iter();
  }
}

#[derive(Debug)]
pub struct Row(Vec<types::Value>, ColumnNames);

impl Row {
  pub(crate) fn from_row(row: &rusqlite::Row, names: ColumnNames) -> rusqlite::Result<Self> {
    // Access by index, column names may be duplicate, e.g. for joins.
    let mut values = Vec::<types::Value>::with_capacity(names.len());
    for idx in 0..names.len() {
      values.push(row.get_ref(idx)?.into());
    }

    return Ok(Self(values, names));
  }

  /// Consumes the row yielding `(column name, value)` pairs in column order.
  pub fn into_named_values(self) -> impl Iterator<Item = (String, types::Value)> {
    let Row(values, names) = self;
    return names.iter().cloned().collect::<Vec<_>>().into_iter().zip(values);
  }
}
