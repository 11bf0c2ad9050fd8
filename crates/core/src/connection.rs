use log::*;
use thiserror::Error;

use crate::config::{ConfigError, DatabaseConfig, Dsn};

pub use tablerest_sqlite::Connection;

#[derive(Debug, Error)]
pub enum ConnectionError {
  #[error("Config: {0}")]
  Config(#[from] ConfigError),
  #[error("SQLite: {0}")]
  Sqlite(#[from] tablerest_sqlite::Error),
}

/// Opens a connection as described by the config's DSN.
pub fn connect(config: &DatabaseConfig) -> Result<Connection, ConnectionError> {
  let conn = match config.dsn()? {
    Dsn::SqliteInMemory => {
      debug!("Opening in-memory SQLite DB");
      Connection::open_in_memory()?
    }
    Dsn::SqliteFile(path) => {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
      {
        warn!("Parent directory of '{}' doesn't exist", path.display());
      }
      Connection::open(path, None)?
    }
  };

  return Ok(conn);
}
