//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The sync cursor is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings. Discriminants (kind, status, tier) are stored as their wire
//! strings.

use chrono::{DateTime, Utc};
use rapport_core::{
  contact::Contact,
  integration::{Integration, IntegrationStatus, SyncCursor},
  interaction::{InteractionEvent, InteractionKind},
  strength::NetworkStrength,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── InteractionKind ─────────────────────────────────────────────────────────

pub fn encode_kind(k: InteractionKind) -> &'static str {
  match k {
    InteractionKind::Email => "email",
    InteractionKind::Meeting => "meeting",
  }
}

pub fn decode_kind(s: &str) -> Result<InteractionKind> {
  match s {
    "email" => Ok(InteractionKind::Email),
    "meeting" => Ok(InteractionKind::Meeting),
    other => Err(Error::Decode(format!("unknown interaction kind: {other:?}"))),
  }
}

// ─── NetworkStrength ─────────────────────────────────────────────────────────

pub fn encode_strength(t: NetworkStrength) -> &'static str {
  match t {
    NetworkStrength::High => "HIGH",
    NetworkStrength::Medium => "MEDIUM",
    NetworkStrength::Low => "LOW",
  }
}

pub fn decode_strength(s: &str) -> Result<NetworkStrength> {
  match s {
    "HIGH" => Ok(NetworkStrength::High),
    "MEDIUM" => Ok(NetworkStrength::Medium),
    "LOW" => Ok(NetworkStrength::Low),
    other => Err(Error::Decode(format!("unknown strength tier: {other:?}"))),
  }
}

// ─── IntegrationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: IntegrationStatus) -> &'static str {
  match s {
    IntegrationStatus::Syncing => "syncing",
    IntegrationStatus::Active => "active",
    IntegrationStatus::Error => "error",
    IntegrationStatus::Revoked => "revoked",
  }
}

pub fn decode_status(s: &str) -> Result<IntegrationStatus> {
  match s {
    "syncing" => Ok(IntegrationStatus::Syncing),
    "active" => Ok(IntegrationStatus::Active),
    "error" => Ok(IntegrationStatus::Error),
    "revoked" => Ok(IntegrationStatus::Revoked),
    other => Err(Error::Decode(format!("unknown integration status: {other:?}"))),
  }
}

// ─── SyncCursor ──────────────────────────────────────────────────────────────

pub fn encode_cursor(c: &SyncCursor) -> Result<String> {
  Ok(serde_json::to_string(c)?)
}

pub fn decode_cursor(s: &str) -> Result<SyncCursor> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id:       String,
  pub user_id:          String,
  pub display_name:     String,
  pub email:            Option<String>,
  pub network_strength: String,
  pub created_at:       String,
}

impl RawContact {
  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id:       decode_uuid(&self.contact_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      display_name:     self.display_name,
      email:            self.email,
      network_strength: decode_strength(&self.network_strength)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `interaction_events` row.
pub struct RawInteraction {
  pub event_id:    String,
  pub contact_id:  String,
  pub kind:        String,
  pub occurred_at: String,
  pub source_ref:  String,
  pub recorded_at: String,
}

impl RawInteraction {
  pub fn into_event(self) -> Result<InteractionEvent> {
    Ok(InteractionEvent {
      event_id:    decode_uuid(&self.event_id)?,
      contact_id:  decode_uuid(&self.contact_id)?,
      kind:        decode_kind(&self.kind)?,
      occurred_at: decode_dt(&self.occurred_at)?,
      source_ref:  self.source_ref,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from an `integrations` row.
pub struct RawIntegration {
  pub integration_id: String,
  pub user_id:        String,
  pub grant_id:       String,
  pub provider:       String,
  pub status:         String,
  pub cursor:         Option<String>,
  pub created_at:     String,
}

impl RawIntegration {
  pub fn into_integration(self) -> Result<Integration> {
    Ok(Integration {
      integration_id: decode_uuid(&self.integration_id)?,
      user_id:        decode_uuid(&self.user_id)?,
      grant_id:       self.grant_id,
      provider:       self.provider,
      status:         decode_status(&self.status)?,
      cursor:         self.cursor.as_deref().map(decode_cursor).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}
