//! Error type for `rapport-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored discriminant string (kind, status, tier) was not recognised.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("contact not found: {0}")]
  ContactNotFound(uuid::Uuid),

  #[error("integration not found: {0}")]
  IntegrationNotFound(uuid::Uuid),

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
