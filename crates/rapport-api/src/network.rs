//! Handler for the manual recalculation action.

use axum::{extract::State, http::StatusCode};
use rapport_core::{provider::ActivityProvider, store::ContactStore};

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `POST /network/recalculate` — recompute every tier for the
/// authenticated user. The same pass runs automatically at the end of
/// every sync; this endpoint exists for manual refreshes.
pub async fn recalculate<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  rapport_sync::recalculate(&*state.store, user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
