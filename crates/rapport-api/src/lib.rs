//! JSON REST API for Rapport.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rapport_core::store::ContactStore`] and
//! [`rapport_core::provider::ActivityProvider`]. TLS and transport
//! concerns are the caller's responsibility.

pub mod auth;
pub mod contacts;
pub mod error;
pub mod integrations;
pub mod network;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use rapport_core::{provider::ActivityProvider, store::ContactStore};
use rapport_nylas::NylasConfig;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub nylas:      NylasConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, P> {
  pub store:    Arc<S>,
  pub provider: Arc<P>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      provider: self.provider.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: ContactStore + Clone + Send + Sync + 'static,
  P: ActivityProvider + Send + Sync + 'static,
{
  Router::new()
    // Contacts
    .route(
      "/contacts",
      get(contacts::list::<S, P>).post(contacts::create::<S, P>),
    )
    .route("/contacts/{id}", get(contacts::get_one::<S, P>))
    // Network strength
    .route("/network/recalculate", post(network::recalculate::<S, P>))
    // Integrations
    .route("/integrations", get(integrations::list::<S, P>))
    .route(
      "/integrations/callback",
      get(integrations::oauth_callback::<S, P>),
    )
    .route("/integrations/{id}/sync", post(integrations::resync::<S, P>))
    .route("/integrations/{id}", delete(integrations::revoke::<S, P>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use chrono::{DateTime, TimeZone, Utc};
  use rand_core::OsRng;
  use rapport_core::{
    contact::NewContact,
    integration::{IntegrationStatus, NewIntegration},
    interaction::{InteractionKind, NewInteraction},
    provider::{
      ActivityProvider, GrantCredentials, RemoteInteraction,
      RemoteParticipant,
    },
    store::ContactStore,
    strength::NetworkStrength,
    user::{NewUser, User},
  };
  use rapport_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("stub provider error")]
  struct StubError;

  /// Canned provider: fixed email batch, successful code exchange.
  #[derive(Default)]
  struct StubProvider {
    emails: Vec<RemoteInteraction>,
  }

  impl ActivityProvider for StubProvider {
    type Error = StubError;

    async fn fetch_email_activity(
      &self,
      _grant_id: &str,
      _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteInteraction>, StubError> {
      Ok(self.emails.clone())
    }

    async fn fetch_calendar_activity(
      &self,
      _grant_id: &str,
      _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteInteraction>, StubError> {
      Ok(Vec::new())
    }

    async fn exchange_code(
      &self,
      _code: &str,
    ) -> Result<GrantCredentials, StubError> {
      Ok(GrantCredentials {
        grant_id: "grant-test".into(),
        email:    Some("me@example.com".into()),
        provider: "stub".into(),
      })
    }

    async fn revoke_grant(&self, _grant_id: &str) -> Result<(), StubError> {
      Ok(())
    }
  }

  type TestState = AppState<SqliteStore, StubProvider>;

  async fn make_state(provider: StubProvider) -> (TestState, User) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    let user = store
      .create_user(NewUser { username: "user".into(), password_hash: hash })
      .await
      .unwrap();

    let state = AppState {
      store:    Arc::new(store),
      provider: Arc::new(provider),
    };
    (state, user)
  }

  fn auth() -> String {
    format!("Basic {}", B64.encode("user:secret"))
  }

  async fn send(
    state: TestState,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, auth());
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    router(state)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn email_event(source_ref: &str, secs: i64, address: &str) -> RemoteInteraction {
    RemoteInteraction {
      kind:         InteractionKind::Email,
      occurred_at:  Utc.timestamp_opt(secs, 0).unwrap(),
      source_ref:   source_ref.into(),
      participants: vec![RemoteParticipant {
        email: address.into(),
        name:  None,
      }],
    }
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let (state, _user) = make_state(StubProvider::default()).await;
    let resp = router(state)
      .oneshot(Request::builder().uri("/contacts").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Contacts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_list_contacts() {
    let (state, _user) = make_state(StubProvider::default()).await;

    let resp = send(
      state.clone(),
      "POST",
      "/contacts",
      Some(serde_json::json!({
        "display_name": "Bob",
        "email": "Bob@Example.com"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["network_strength"], "LOW");
    assert_eq!(created["email"], "bob@example.com");

    let resp = send(state, "GET", "/contacts", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn create_contact_with_blank_name_is_rejected() {
    let (state, _user) = make_state(StubProvider::default()).await;
    let resp = send(
      state,
      "POST",
      "/contacts",
      Some(serde_json::json!({ "display_name": "  " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn get_contact_includes_timeline() {
    let (state, user) = make_state(StubProvider::default()).await;
    let contact = state
      .store
      .add_contact(NewContact {
        user_id:      user.user_id,
        display_name: "Bob".into(),
        email:        Some("bob@example.com".into()),
      })
      .await
      .unwrap();
    state
      .store
      .append_events(contact.contact_id, vec![NewInteraction {
        kind:        InteractionKind::Meeting,
        occurred_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        source_ref:  "evt-1".into(),
      }])
      .await
      .unwrap();

    let resp = send(
      state,
      "GET",
      &format!("/contacts/{}", contact.contact_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    assert_eq!(view["timeline"].as_array().unwrap().len(), 1);
    assert_eq!(view["timeline"][0]["kind"], "meeting");
  }

  #[tokio::test]
  async fn contact_of_another_user_is_not_found() {
    let (state, _user) = make_state(StubProvider::default()).await;
    let other = state
      .store
      .create_user(NewUser {
        username:      "other".into(),
        password_hash: "$argon2id$v=19$x".into(),
      })
      .await
      .unwrap();
    let foreign = state
      .store
      .add_contact(NewContact {
        user_id:      other.user_id,
        display_name: "Hidden".into(),
        email:        None,
      })
      .await
      .unwrap();

    let resp = send(
      state,
      "GET",
      &format!("/contacts/{}", foreign.contact_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Network strength ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn recalculate_returns_no_content_and_updates_tiers() {
    let (state, user) = make_state(StubProvider::default()).await;
    let contact = state
      .store
      .add_contact(NewContact {
        user_id:      user.user_id,
        display_name: "Bob".into(),
        email:        Some("bob@example.com".into()),
      })
      .await
      .unwrap();
    state
      .store
      .append_events(contact.contact_id, vec![NewInteraction {
        kind:        InteractionKind::Email,
        occurred_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        source_ref:  "m-1".into(),
      }])
      .await
      .unwrap();

    let resp = send(state.clone(), "POST", "/network/recalculate", None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let fetched = state
      .store
      .get_contact(contact.contact_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(fetched.network_strength, NetworkStrength::High);
  }

  // ── Integrations ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn resync_returns_counts_and_activates() {
    let provider = StubProvider {
      emails: vec![
        email_event("m-1", 1_000, "bob@example.com"),
        email_event("m-2", 2_000, "bob@example.com"),
      ],
    };
    let (state, user) = make_state(provider).await;
    let integration = state
      .store
      .add_integration(NewIntegration {
        user_id:  user.user_id,
        grant_id: "grant-1".into(),
        provider: "stub".into(),
        status:   IntegrationStatus::Active,
      })
      .await
      .unwrap();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/integrations/{}/sync", integration.integration_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let outcome = json_body(resp).await;
    assert_eq!(outcome["emailCount"], 2);
    assert_eq!(outcome["calendarCount"], 0);
    assert_eq!(outcome["isIncremental"], false);

    let fetched = state
      .store
      .get_integration(integration.integration_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(fetched.status, IntegrationStatus::Active);
    assert!(fetched.cursor.is_some(), "cursor advanced after the run");
  }

  #[tokio::test]
  async fn resync_while_syncing_conflicts() {
    let (state, user) = make_state(StubProvider::default()).await;
    let integration = state
      .store
      .add_integration(NewIntegration {
        user_id:  user.user_id,
        grant_id: "grant-1".into(),
        provider: "stub".into(),
        status:   IntegrationStatus::Syncing,
      })
      .await
      .unwrap();

    let resp = send(
      state,
      "POST",
      &format!("/integrations/{}/sync", integration.integration_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn resync_unknown_integration_is_not_found() {
    let (state, _user) = make_state(StubProvider::default()).await;
    let resp = send(
      state,
      "POST",
      &format!("/integrations/{}/sync", Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn oauth_callback_records_the_grant() {
    let (state, user) = make_state(StubProvider::default()).await;

    let resp = send(
      state.clone(),
      "GET",
      "/integrations/callback?code=auth-code",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let integration = state
      .store
      .find_integration_by_grant(user.user_id, "grant-test")
      .await
      .unwrap();
    assert!(integration.is_some());
  }

  #[tokio::test]
  async fn revoke_marks_integration_revoked() {
    let (state, user) = make_state(StubProvider::default()).await;
    let integration = state
      .store
      .add_integration(NewIntegration {
        user_id:  user.user_id,
        grant_id: "grant-1".into(),
        provider: "stub".into(),
        status:   IntegrationStatus::Active,
      })
      .await
      .unwrap();

    let resp = send(
      state.clone(),
      "DELETE",
      &format!("/integrations/{}", integration.integration_id),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let fetched = state
      .store
      .get_integration(integration.integration_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(fetched.status, IntegrationStatus::Revoked);
  }
}
