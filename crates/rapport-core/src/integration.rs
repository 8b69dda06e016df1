//! Integration — an authorized connection (grant) to an external
//! email/calendar account, plus its sync-cursor state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an integration.
///
/// `Syncing` is set by the caller for the duration of a sync run and must
/// transition to `Active` (success) or `Error` (failure) before the run's
/// effects are considered durable. The check is advisory — no lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
  Syncing,
  Active,
  Error,
  Revoked,
}

/// Bound on the next incremental fetch: either the timestamp of the newest
/// event already ingested, or an opaque provider-issued delta token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SyncCursor {
  Timestamp(DateTime<Utc>),
  DeltaToken(String),
}

impl SyncCursor {
  /// The time bound carried by this cursor, if it is time-based.
  pub fn timestamp(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Timestamp(ts) => Some(*ts),
      Self::DeltaToken(_) => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
  pub integration_id: Uuid,
  pub user_id:        Uuid,
  /// Provider-issued grant id.
  pub grant_id:       String,
  pub provider:       String,
  pub status:         IntegrationStatus,
  /// Absent until the first successful sync; its presence selects
  /// incremental mode.
  pub cursor:         Option<SyncCursor>,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::ContactStore::add_integration`].
/// `integration_id` and `created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewIntegration {
  pub user_id:  Uuid,
  pub grant_id: String,
  pub provider: String,
  pub status:   IntegrationStatus,
}
