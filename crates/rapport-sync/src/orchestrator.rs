//! Contact Sync Orchestrator — pull external activity into per-contact
//! timelines, advance the cursor, and retrigger scoring.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use rapport_core::{
  contact::NewContact,
  integration::SyncCursor,
  interaction::{InteractionKind, NewInteraction},
  provider::{ActivityProvider, RemoteInteraction},
  store::ContactStore,
};

use crate::{engine, error::SyncError};

/// Counts returned to the caller of [`sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
  pub email_count:    usize,
  pub calendar_count: usize,
  pub is_incremental: bool,
}

/// Run one synchronisation pass for `grant_id`.
///
/// Mode is decided by the stored cursor: present means incremental
/// (events after the cursor only), absent means full history. The cursor
/// advances to the newest `occurred_at` observed, and only after the full
/// fetch-and-merge pass succeeds — a provider failure aborts with the
/// cursor untouched, preserving at-least-once delivery; re-fetched
/// duplicates are suppressed by the per-timeline `source_ref` key.
///
/// Integration status transitions are the caller's concern: set `syncing`
/// before invoking this and `active`/`error` from the returned result.
pub async fn sync<S, P>(
  store: &S,
  provider: &P,
  user_id: Uuid,
  grant_id: &str,
) -> Result<SyncOutcome, SyncError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider,
{
  let integration = store
    .find_integration_by_grant(user_id, grant_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| SyncError::UnknownGrant(grant_id.to_owned()))?;

  let is_incremental = integration.cursor.is_some();
  let since = integration.cursor.as_ref().and_then(SyncCursor::timestamp);

  let emails = provider
    .fetch_email_activity(grant_id, since)
    .await
    .map_err(provider_err)?;
  let meetings = provider
    .fetch_calendar_activity(grant_id, since)
    .await
    .map_err(provider_err)?;

  let mut merge = Merge::new(store, user_id);
  let mut email_count = 0usize;
  let mut calendar_count = 0usize;
  let mut latest: Option<DateTime<Utc>> = None;

  for event in emails.into_iter().chain(meetings) {
    latest = latest.max(Some(event.occurred_at));
    if merge.ingest(&event).await {
      match event.kind {
        InteractionKind::Email => email_count += 1,
        InteractionKind::Meeting => calendar_count += 1,
      }
    }
  }

  // A failed cursor advance is surfaced, never masked as success.
  if let Some(boundary) = latest {
    store
      .set_integration_cursor(
        integration.integration_id,
        Some(SyncCursor::Timestamp(boundary)),
      )
      .await
      .map_err(store_err)?;
  }

  // Tiers are eventually consistent: a recompute failure after a
  // successful ingest is logged, and the next pass corrects the scores.
  if let Err(error) = engine::recalculate(store, user_id).await {
    tracing::warn!(%user_id, %error, "post-sync recalculation failed");
  }

  Ok(SyncOutcome { email_count, calendar_count, is_incremental })
}

fn store_err<E>(e: E) -> SyncError
where
  E: std::error::Error + Send + Sync + 'static,
{
  SyncError::Store(Box::new(e))
}

fn provider_err<E>(e: E) -> SyncError
where
  E: std::error::Error + Send + Sync + 'static,
{
  SyncError::Provider { detail: e.to_string(), source: Box::new(e) }
}

// ─── Merge state ─────────────────────────────────────────────────────────────

/// Per-run merge state: contact resolution and timeline-dedup caches,
/// both keyed so repeated participants cost one store round-trip.
struct Merge<'a, S> {
  store:    &'a S,
  user_id:  Uuid,
  by_email: HashMap<String, Uuid>,
  seen:     HashMap<Uuid, HashSet<String>>,
}

impl<'a, S: ContactStore> Merge<'a, S> {
  fn new(store: &'a S, user_id: Uuid) -> Self {
    Self {
      store,
      user_id,
      by_email: HashMap::new(),
      seen: HashMap::new(),
    }
  }

  /// Merge one remote event into every participant's timeline. Returns
  /// true if at least one timeline gained the event. Per-contact failures
  /// are logged and skipped — they never abort the run.
  async fn ingest(&mut self, event: &RemoteInteraction) -> bool {
    let mut ingested = false;

    for participant in &event.participants {
      let address = participant.email.trim().to_lowercase();
      if address.is_empty() {
        continue;
      }

      let contact_id =
        match self.resolve(&address, participant.name.as_deref()).await {
          Ok(id) => id,
          Err(error) => {
            tracing::warn!(address, %error, "skipping participant: contact resolution failed");
            continue;
          }
        };

      let refs = match self.known_refs(contact_id).await {
        Ok(refs) => refs,
        Err(error) => {
          tracing::warn!(%contact_id, %error, "skipping participant: timeline read failed");
          continue;
        }
      };
      if !refs.insert(event.source_ref.clone()) {
        // Already on this timeline — a re-fetch across the cursor
        // boundary, or the same address in several participant roles.
        continue;
      }

      let append = self
        .store
        .append_events(contact_id, vec![NewInteraction {
          kind:        event.kind,
          occurred_at: event.occurred_at,
          source_ref:  event.source_ref.clone(),
        }])
        .await;

      match append {
        Ok(n) if n > 0 => ingested = true,
        Ok(_) => {} // raced with another writer; the row already exists
        Err(error) => {
          tracing::warn!(%contact_id, %error, "failed to append interaction");
        }
      }
    }

    ingested
  }

  /// Resolve a participant address to a contact, creating the contact on
  /// first sight (merge-on-email).
  async fn resolve(
    &mut self,
    address: &str,
    name: Option<&str>,
  ) -> Result<Uuid, S::Error> {
    if let Some(id) = self.by_email.get(address) {
      return Ok(*id);
    }

    let contact = match self
      .store
      .find_contact_by_email(self.user_id, address)
      .await?
    {
      Some(existing) => existing,
      None => {
        let display_name = name
          .map(str::trim)
          .filter(|n| !n.is_empty())
          .unwrap_or(address)
          .to_owned();
        self
          .store
          .add_contact(NewContact {
            user_id: self.user_id,
            display_name,
            email: Some(address.to_owned()),
          })
          .await?
      }
    };

    self.by_email.insert(address.to_owned(), contact.contact_id);
    Ok(contact.contact_id)
  }

  /// The set of `source_ref`s already on a contact's timeline, loaded
  /// once per run.
  async fn known_refs(
    &mut self,
    contact_id: Uuid,
  ) -> Result<&mut HashSet<String>, S::Error> {
    match self.seen.entry(contact_id) {
      Entry::Occupied(entry) => Ok(entry.into_mut()),
      Entry::Vacant(entry) => {
        let refs: HashSet<String> = self
          .store
          .get_timeline(contact_id)
          .await?
          .into_iter()
          .map(|e| e.source_ref)
          .collect();
        Ok(entry.insert(refs))
      }
    }
  }
}
