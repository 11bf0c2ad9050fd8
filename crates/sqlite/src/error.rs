#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("Connection closed error")]
  ConnectionClosed,

  /// An error occurred while closing the SQLite connection. Carries the [`Connection`] to allow
  /// the caller to retry the close operation.
  ///
  /// [`Connection`]: crate::connection::Connection
  #[error("Close error: {1}")]
  Close(crate::connection::Connection, rusqlite::Error),

  #[error("Rusqlite error: {0}")]
  Rusqlite(#[from] rusqlite::Error),

  #[error("SerdeRusqlite error: {0}")]
  SerdeRusqlite(#[from] serde_rusqlite::Error),

  #[error("Other error: {0}")]
  Other(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
  /// Message as reported by the underlying driver, without this crate's prefix.
  pub fn driver_message(&self) -> String {
    return match self {
      Self::ConnectionClosed => "Connection closed".to_string(),
      Self::Close(_, err) => err.to_string(),
      Self::Rusqlite(err) => err.to_string(),
      Self::SerdeRusqlite(err) => err.to_string(),
      Self::Other(err) => err.to_string(),
    };
  }
}
