//! The `ContactStore` trait — abstraction over a persistence backend.
//!
//! The trait is implemented by storage backends (e.g.
//! `rapport-store-sqlite`). Higher layers (`rapport-sync`, `rapport-api`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  contact::{Contact, ContactView, NewContact},
  integration::{Integration, IntegrationStatus, NewIntegration, SyncCursor},
  interaction::{InteractionEvent, NewInteraction},
  strength::NetworkStrength,
  user::{NewUser, User},
};

/// Abstraction over a Rapport persistence backend.
///
/// Interaction events are append-only. Contacts carry a single mutable
/// derived column (`network_strength`), overwritten on every recomputation
/// pass; integrations carry mutable status and cursor columns.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create and persist a new user. Returns an error if the username is
  /// already taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user by username. Returns `None` if not found.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Create and persist a new contact. The email, if present, is stored
  /// lower-cased. New contacts start at [`NetworkStrength::Low`].
  fn add_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// List all contacts owned by `user_id`.
  fn list_contacts(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email address within one user's contacts.
  /// The merge key for sync runs.
  fn find_contact_by_email<'a>(
    &'a self,
    user_id: Uuid,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// Overwrite the derived strength tier for one contact.
  fn set_network_strength(
    &self,
    contact_id: Uuid,
    tier: NetworkStrength,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Timelines — append-only writes ────────────────────────────────────

  /// Append events to a contact's timeline, silently skipping any whose
  /// `source_ref` is already present. Returns the number actually
  /// inserted.
  fn append_events(
    &self,
    contact_id: Uuid,
    events: Vec<NewInteraction>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The full timeline for one contact, ordered by `occurred_at`.
  fn get_timeline(
    &self,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<Vec<InteractionEvent>, Self::Error>> + Send + '_;

  /// Materialise every contact of `user_id` with its full timeline — the
  /// whole population, unpaginated, as percentile ranking requires.
  fn load_timelines(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ContactView>, Self::Error>> + Send + '_;

  // ── Integrations ──────────────────────────────────────────────────────

  fn add_integration(
    &self,
    input: NewIntegration,
  ) -> impl Future<Output = Result<Integration, Self::Error>> + Send + '_;

  fn get_integration(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Integration>, Self::Error>> + Send + '_;

  /// Look up an integration by its provider-issued grant id.
  fn find_integration_by_grant<'a>(
    &'a self,
    user_id: Uuid,
    grant_id: &'a str,
  ) -> impl Future<Output = Result<Option<Integration>, Self::Error>> + Send + 'a;

  fn list_integrations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Integration>, Self::Error>> + Send + '_;

  fn set_integration_status(
    &self,
    id: Uuid,
    status: IntegrationStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Persist the cursor for the next incremental run. `None` clears it,
  /// sending the next sync back to full mode.
  fn set_integration_cursor(
    &self,
    id: Uuid,
    cursor: Option<SyncCursor>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
