//! Handlers for `/integrations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/integrations` | All integrations for the authenticated user |
//! | `GET`    | `/integrations/callback?code=…` | OAuth completion; kicks off a detached full sync |
//! | `POST`   | `/integrations/:id/sync` | Manual resync, awaited; returns ingest counts |
//! | `DELETE` | `/integrations/:id` | Revoke the grant upstream and mark it revoked |
//!
//! Status transitions live here, not in the sync core: handlers set
//! `syncing` before a run and `active`/`error` after it, and refuse to
//! start a run while one is already in flight.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rapport_core::{
  integration::{Integration, IntegrationStatus, NewIntegration},
  provider::ActivityProvider,
  store::ContactStore,
};
use rapport_sync::SyncOutcome;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /integrations`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Integration>>, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let integrations = state
    .store
    .list_integrations(user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(integrations))
}

// ─── OAuth callback ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  pub code: String,
}

/// `GET /integrations/callback?code=…` — OAuth completion.
///
/// Exchanges the authorization code, records the grant, and detaches the
/// initial full sync so the response is not held open for it.
pub async fn oauth_callback<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let credentials = state
    .provider
    .exchange_code(&params.code)
    .await
    .map_err(|e| ApiError::Provider(e.to_string()))?;

  let existing = state
    .store
    .find_integration_by_grant(user.user_id, &credentials.grant_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let integration = match existing {
    // Re-authorization of a known grant: reuse the row.
    Some(mut integration) => {
      state
        .store
        .set_integration_status(
          integration.integration_id,
          IntegrationStatus::Syncing,
        )
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?;
      integration.status = IntegrationStatus::Syncing;
      integration
    }
    None => state
      .store
      .add_integration(NewIntegration {
        user_id:  user.user_id,
        grant_id: credentials.grant_id,
        provider: credentials.provider,
        status:   IntegrationStatus::Syncing,
      })
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?,
  };

  spawn_detached_sync(
    state.clone(),
    user.user_id,
    integration.integration_id,
    integration.grant_id.clone(),
  );

  Ok((StatusCode::CREATED, Json(integration)))
}

/// Run a sync in the background. The HTTP response is already on its way,
/// so this task owns the `syncing → active/error` transition and its own
/// error channel — the log.
fn spawn_detached_sync<S, P>(
  state: AppState<S, P>,
  user_id: Uuid,
  integration_id: Uuid,
  grant_id: String,
) where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  tokio::spawn(async move {
    let result =
      rapport_sync::sync(&*state.store, &*state.provider, user_id, &grant_id)
        .await;

    let status = match &result {
      Ok(outcome) => {
        tracing::info!(
          %user_id,
          grant_id,
          emails = outcome.email_count,
          meetings = outcome.calendar_count,
          "background sync finished"
        );
        IntegrationStatus::Active
      }
      Err(error) => {
        tracing::error!(%user_id, grant_id, %error, "background sync failed");
        IntegrationStatus::Error
      }
    };

    if let Err(error) =
      state.store.set_integration_status(integration_id, status).await
    {
      tracing::error!(%integration_id, %error, "failed to record sync status");
    }
  });
}

// ─── Manual resync ────────────────────────────────────────────────────────────

/// `POST /integrations/:id/sync` — awaited resync returning ingest counts.
pub async fn resync<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<SyncOutcome>, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let integration = state
    .store
    .get_integration(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|i| i.user_id == user.user_id)
    .ok_or_else(|| ApiError::NotFound(format!("integration {id} not found")))?;

  // At-most-one sync per grant.
  if integration.status == IntegrationStatus::Syncing {
    return Err(ApiError::Conflict("sync already in progress".into()));
  }

  state
    .store
    .set_integration_status(id, IntegrationStatus::Syncing)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let result = rapport_sync::sync(
    &*state.store,
    &*state.provider,
    user.user_id,
    &integration.grant_id,
  )
  .await;

  let status = if result.is_ok() {
    IntegrationStatus::Active
  } else {
    IntegrationStatus::Error
  };
  state
    .store
    .set_integration_status(id, status)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(result?))
}

// ─── Revoke ───────────────────────────────────────────────────────────────────

/// `DELETE /integrations/:id`
pub async fn revoke<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let integration = state
    .store
    .get_integration(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|i| i.user_id == user.user_id)
    .ok_or_else(|| ApiError::NotFound(format!("integration {id} not found")))?;

  state
    .provider
    .revoke_grant(&integration.grant_id)
    .await
    .map_err(|e| ApiError::Provider(e.to_string()))?;

  state
    .store
    .set_integration_status(id, IntegrationStatus::Revoked)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(StatusCode::NO_CONTENT)
}
