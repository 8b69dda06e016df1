//! Network Strength Engine — recompute every contact's tier for one user.

use rapport_core::{store::ContactStore, strength};
use uuid::Uuid;

/// Recompute and persist the strength tier of every contact owned by
/// `user_id`.
///
/// Idempotent; the persisted tiers are the only observable output. A
/// failure loading the population aborts the pass and propagates; a
/// failure persisting one contact's tier is logged and swallowed, never
/// affecting siblings. The per-contact updates are dispatched
/// concurrently and awaited as a batch, with no ordering guarantee and no
/// rollback across the batch.
pub async fn recalculate<S>(store: &S, user_id: Uuid) -> Result<(), S::Error>
where
  S: ContactStore + Clone + Send + Sync + 'static,
{
  let views = store.load_timelines(user_id).await?;
  if views.is_empty() {
    return Ok(());
  }

  let counts: Vec<(Uuid, usize)> = views
    .iter()
    .map(|view| (view.contact.contact_id, view.interaction_count()))
    .collect();

  let mut updates = tokio::task::JoinSet::new();
  for (contact_id, tier) in strength::rank(&counts) {
    let store = store.clone();
    updates.spawn(async move {
      if let Err(error) = store.set_network_strength(contact_id, tier).await {
        tracing::warn!(%contact_id, %error, "failed to persist strength tier");
      }
    });
  }
  while updates.join_next().await.is_some() {}

  Ok(())
}
