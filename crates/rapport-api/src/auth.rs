//! HTTP Basic-auth extractor resolving the authenticated user.
//!
//! Credentials are verified against the users table: the username selects
//! the row, the password is checked against its argon2 PHC hash. Every
//! failure mode collapses to `Unauthorized` — no oracle for which part
//! was wrong.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rapport_core::{
  provider::ActivityProvider, store::ContactStore, user::User,
};

use crate::{AppState, error::ApiError};

/// Present in a handler signature means the request was authenticated;
/// carries the resolved user row.
pub struct CurrentUser(pub User);

/// Verify credentials directly from headers and resolve the user.
pub async fn verify_auth<S>(
  headers: &HeaderMap,
  store: &S,
) -> Result<User, ApiError>
where
  S: ContactStore,
{
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let user = store
    .find_user(username)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(user)
}

impl<S, P> FromRequestParts<AppState<S, P>> for CurrentUser
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_auth(&parts.headers, &*state.store).await?;
    Ok(CurrentUser(user))
  }
}
