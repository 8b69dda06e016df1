//! Interaction events — the append-only per-contact activity timeline.
//!
//! Events are appended by sync runs and never mutated or deleted. Their
//! lifecycle ends there; tiers are recomputed from the whole timeline, so
//! no event-level correction mechanism is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of interaction an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
  Email,
  Meeting,
}

/// One entry in a contact's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
  pub event_id:    Uuid,
  pub contact_id:  Uuid,
  pub kind:        InteractionKind,
  /// When the interaction happened in the real world — distinct from when
  /// it was ingested.
  pub occurred_at: DateTime<Utc>,
  /// Provider message/calendar-event id; the dedup key within a contact's
  /// timeline across full and incremental runs.
  pub source_ref:  String,
  /// Server-assigned timestamp; never changes after creation.
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::ContactStore::append_events`].
/// `event_id` and `recorded_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewInteraction {
  pub kind:        InteractionKind,
  pub occurred_at: DateTime<Utc>,
  pub source_ref:  String,
}
