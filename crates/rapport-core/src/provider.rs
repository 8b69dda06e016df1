//! The `ActivityProvider` trait and the normalized event representation
//! that crosses the provider boundary.
//!
//! Provider payloads are loosely shaped. Clients normalise them into
//! [`RemoteInteraction`] before returning, so the sync orchestrator never
//! sees a malformed record.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interaction::InteractionKind;

/// One participant on a remote message or calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteParticipant {
  pub email: String,
  pub name:  Option<String>,
}

/// A normalized interaction fetched from the external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteInteraction {
  pub kind:         InteractionKind,
  pub occurred_at:  DateTime<Utc>,
  /// Provider record id; the dedup key within a contact's timeline.
  pub source_ref:   String,
  pub participants: Vec<RemoteParticipant>,
}

/// The outcome of exchanging an OAuth authorization code.
#[derive(Debug, Clone)]
pub struct GrantCredentials {
  /// Provider-issued grant id.
  pub grant_id: String,
  /// Address of the connected mailbox, when the provider reports it.
  pub email:    Option<String>,
  /// Provider slug, e.g. `"nylas"`.
  pub provider: String,
}

/// Abstraction over the external email/calendar provider.
///
/// `fetch_*` implementations page until the provider is exhausted and
/// return the full batch. `since` bounds incremental fetches; `None`
/// requests the provider's full available history.
pub trait ActivityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_email_activity<'a>(
    &'a self,
    grant_id: &'a str,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<RemoteInteraction>, Self::Error>> + Send + 'a;

  fn fetch_calendar_activity<'a>(
    &'a self,
    grant_id: &'a str,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<RemoteInteraction>, Self::Error>> + Send + 'a;

  /// OAuth completion: exchange an authorization code for a grant.
  fn exchange_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<GrantCredentials, Self::Error>> + Send + 'a;

  /// Revoke a grant upstream. Idempotent from the caller's perspective.
  fn revoke_grant<'a>(
    &'a self,
    grant_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
