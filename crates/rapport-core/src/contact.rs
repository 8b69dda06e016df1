//! Contact — the per-user person record the strength engine ranks.
//!
//! A contact row holds identity metadata plus the derived tier. The
//! interaction timeline is not embedded; it is assembled on read as a
//! [`ContactView`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{interaction::InteractionEvent, strength::NetworkStrength};

/// A person in a user's network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id:       Uuid,
  pub user_id:          Uuid,
  pub display_name:     String,
  /// Lower-cased at the store boundary; the merge key across sync runs.
  pub email:            Option<String>,
  /// Derived, never authoritative — recomputable from timelines at any time.
  pub network_strength: NetworkStrength,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::ContactStore::add_contact`].
/// `contact_id` and `created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub user_id:      Uuid,
  pub display_name: String,
  pub email:        Option<String>,
}

/// A contact bundled with its full interaction timeline — the computed read
/// model for scoring and the detail view, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactView {
  pub contact:  Contact,
  pub timeline: Vec<InteractionEvent>,
}

impl ContactView {
  /// Number of scorable interactions. Every timeline entry is an email or
  /// a meeting, so the timeline length is the count.
  pub fn interaction_count(&self) -> usize { self.timeline.len() }
}
