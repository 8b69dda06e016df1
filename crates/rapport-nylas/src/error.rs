//! Error type for `rapport-nylas`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport, timeout, or body-decoding failure from the HTTP layer.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status; `detail` carries the
  /// (truncated) response body for diagnosis upstream.
  #[error("nylas api error (status {status}): {detail}")]
  Api { status: u16, detail: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
