//! Loosely-shaped Nylas v3 wire types and their normalization into the
//! strict internal event representation.
//!
//! Pipeline:
//!   raw JSON page
//!     └─ Page<WireMessage | WireEvent>   (permissive serde)
//!          └─ normalize_messages / normalize_events
//!               └─ Vec<RemoteInteraction> (strict; malformed records
//!                  dropped with a warning, never an error)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rapport_core::{
  interaction::InteractionKind,
  provider::{RemoteInteraction, RemoteParticipant},
};
use serde::Deserialize;

// ─── Envelope ────────────────────────────────────────────────────────────────

/// One page of a Nylas list endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
  #[serde(default)]
  pub data:        Vec<T>,
  #[serde(default)]
  pub next_cursor: Option<String>,
}

// ─── Participants ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WireParticipant {
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub name:  Option<String>,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// A message from `GET /v3/grants/{id}/messages`. Only the fields the
/// sync pipeline needs; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
  #[serde(default)]
  pub id:   Option<String>,
  /// Unix epoch seconds.
  #[serde(default)]
  pub date: Option<i64>,
  #[serde(default)]
  pub from: Vec<WireParticipant>,
  #[serde(default)]
  pub to:   Vec<WireParticipant>,
  #[serde(default)]
  pub cc:   Vec<WireParticipant>,
}

// ─── Calendar events ─────────────────────────────────────────────────────────

/// The `when` object of a calendar event. Timespan events carry epoch
/// seconds in `start_time`; all-day events carry a `date` or `start_date`
/// calendar string.
#[derive(Debug, Default, Deserialize)]
pub struct WireWhen {
  #[serde(default)]
  pub start_time: Option<i64>,
  #[serde(default)]
  pub date:       Option<String>,
  #[serde(default)]
  pub start_date: Option<String>,
}

/// An event from `GET /v3/grants/{id}/events`.
#[derive(Debug, Deserialize)]
pub struct WireEvent {
  #[serde(default)]
  pub id:           Option<String>,
  #[serde(default)]
  pub when:         Option<WireWhen>,
  #[serde(default)]
  pub participants: Vec<WireParticipant>,
}

// ─── Token exchange ──────────────────────────────────────────────────────────

/// Response body of `POST /v3/connect/token`.
#[derive(Debug, Deserialize)]
pub struct WireTokenResponse {
  pub grant_id: String,
  #[serde(default)]
  pub email:    Option<String>,
}

// ─── Normalization ───────────────────────────────────────────────────────────

fn collect_participants(
  groups: &[&[WireParticipant]],
) -> Vec<RemoteParticipant> {
  groups
    .iter()
    .flat_map(|group| group.iter())
    .filter_map(|p| {
      let email = p.email.as_deref()?.trim().to_lowercase();
      if email.is_empty() {
        return None;
      }
      Some(RemoteParticipant { email, name: p.name.clone() })
    })
    .collect()
}

/// Normalise one message; `None` means the record is unusable (missing id
/// or timestamp) and has been dropped.
pub fn normalize_message(msg: WireMessage) -> Option<RemoteInteraction> {
  let source_ref = match msg.id.as_deref().map(str::trim) {
    Some(id) if !id.is_empty() => id.to_owned(),
    _ => {
      tracing::warn!("dropping message without id");
      return None;
    }
  };

  let Some(occurred_at) =
    msg.date.and_then(|secs| DateTime::from_timestamp(secs, 0))
  else {
    tracing::warn!(source_ref, "dropping message without usable date");
    return None;
  };

  Some(RemoteInteraction {
    kind: InteractionKind::Email,
    occurred_at,
    source_ref,
    participants: collect_participants(&[&msg.from, &msg.to, &msg.cc]),
  })
}

/// Normalise one calendar event; `None` means the record is unusable and
/// has been dropped.
pub fn normalize_event(event: WireEvent) -> Option<RemoteInteraction> {
  let source_ref = match event.id.as_deref().map(str::trim) {
    Some(id) if !id.is_empty() => id.to_owned(),
    _ => {
      tracing::warn!("dropping calendar event without id");
      return None;
    }
  };

  let Some(occurred_at) = event.when.as_ref().and_then(when_to_instant) else {
    tracing::warn!(source_ref, "dropping calendar event without usable time");
    return None;
  };

  Some(RemoteInteraction {
    kind: InteractionKind::Meeting,
    occurred_at,
    source_ref,
    participants: collect_participants(&[&event.participants]),
  })
}

pub fn normalize_messages(batch: Vec<WireMessage>) -> Vec<RemoteInteraction> {
  batch.into_iter().filter_map(normalize_message).collect()
}

pub fn normalize_events(batch: Vec<WireEvent>) -> Vec<RemoteInteraction> {
  batch.into_iter().filter_map(normalize_event).collect()
}

/// All-day events map to midnight UTC on their start date.
fn when_to_instant(when: &WireWhen) -> Option<DateTime<Utc>> {
  if let Some(instant) =
    when.start_time.and_then(|secs| DateTime::from_timestamp(secs, 0))
  {
    return Some(instant);
  }

  let date_str = when.date.as_deref().or(when.start_date.as_deref())?;
  let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
  Some(date.and_time(NaiveTime::MIN).and_utc())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
