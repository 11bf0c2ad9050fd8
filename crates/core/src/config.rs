use std::path::PathBuf;
use thiserror::Error;

use crate::constants::{ENV_DATABASE_DSN, ENV_DATABASE_PASS, ENV_DATABASE_USER, SQLITE_MEMORY};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("Missing database credentials")]
  MissingCredentials,
  #[error("Unsupported database driver: {0}")]
  UnsupportedDriver(String),
  #[error("Invalid DSN: {0}")]
  InvalidDsn(String),
}

/// Connection settings, e.g. `sqlite:./data/main.db`.
///
/// User and password are carried for DSN compatibility. SQLite doesn't authenticate, thus
/// empty values are fine, the DSN however must be present.
#[derive(Clone, Debug, Default)]
pub struct DatabaseConfig {
  pub dsn: Option<String>,
  pub user: Option<String>,
  pub password: Option<String>,
}

impl DatabaseConfig {
  /// Reads `DATABASE_DSN`, `DATABASE_USER` and `DATABASE_PASS` from the environment.
  pub fn from_env() -> Self {
    return Self {
      dsn: std::env::var(ENV_DATABASE_DSN).ok(),
      user: std::env::var(ENV_DATABASE_USER).ok(),
      password: std::env::var(ENV_DATABASE_PASS).ok(),
    };
  }

  pub fn in_memory() -> Self {
    return Self {
      dsn: Some(SQLITE_MEMORY.to_string()),
      ..Default::default()
    };
  }

  pub fn dsn(&self) -> Result<Dsn, ConfigError> {
    return match self.dsn.as_deref() {
      Some(dsn) if !dsn.trim().is_empty() => Dsn::parse(dsn),
      _ => Err(ConfigError::MissingCredentials),
    };
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dsn {
  SqliteInMemory,
  SqliteFile(PathBuf),
}

impl Dsn {
  pub fn parse(dsn: &str) -> Result<Self, ConfigError> {
    let dsn = dsn.trim();
    if dsn == SQLITE_MEMORY {
      return Ok(Dsn::SqliteInMemory);
    }

    let Some((driver, rest)) = dsn.split_once(':') else {
      return Err(ConfigError::InvalidDsn(dsn.to_string()));
    };

    return match driver {
      "sqlite" if rest.is_empty() => Err(ConfigError::InvalidDsn(dsn.to_string())),
      "sqlite" => Ok(Dsn::SqliteFile(PathBuf::from(rest))),
      driver => Err(ConfigError::UnsupportedDriver(driver.to_string())),
    };
  }
}
