//! Sync failure taxonomy.

use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SyncError {
  /// No integration exists for this grant — the run cannot begin.
  #[error("no integration for grant {0:?}")]
  UnknownGrant(String),

  /// Fetching from the provider failed (unreachable, rate-limited, auth
  /// revoked, timed out). The cursor was left unchanged, so the next
  /// attempt retries the same window.
  #[error("provider fetch failed: {detail}")]
  Provider {
    detail: String,
    #[source]
    source: Source,
  },

  /// A structural store failure: the run could not begin, or the cursor
  /// could not be advanced. Never raised for per-contact write failures,
  /// which are logged and skipped.
  #[error("store error: {0}")]
  Store(#[source] Source),
}
