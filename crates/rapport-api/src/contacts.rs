//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | All contacts for the authenticated user, tiers included |
//! | `POST` | `/contacts` | Body: `{"display_name":"…","email":"…"}` |
//! | `GET`  | `/contacts/:id` | Contact plus timeline; 404 if absent or not owned |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rapport_core::{
  contact::{Contact, ContactView, NewContact},
  provider::ActivityProvider,
  store::ContactStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let contacts = state
    .store
    .list_contacts(user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(contacts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
  pub email:        Option<String>,
}

/// `POST /contacts` — manual add.
pub async fn create<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  if body.display_name.trim().is_empty() {
    return Err(ApiError::BadRequest("display_name must not be empty".into()));
  }

  let contact = state
    .store
    .add_contact(NewContact {
      user_id:      user.user_id,
      display_name: body.display_name,
      email:        body.email,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/:id` — contact plus its full timeline.
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, ApiError>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  let contact = state
    .store
    .get_contact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|c| c.user_id == user.user_id)
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;

  let timeline = state
    .store
    .get_timeline(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(ContactView { contact, timeline }))
}
