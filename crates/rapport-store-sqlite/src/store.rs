//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rapport_core::{
  contact::{Contact, ContactView, NewContact},
  integration::{Integration, IntegrationStatus, NewIntegration, SyncCursor},
  interaction::{InteractionEvent, NewInteraction},
  store::ContactStore,
  strength::NetworkStrength,
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    RawContact, RawIntegration, RawInteraction, RawUser, encode_cursor,
    encode_dt, encode_kind, encode_status, encode_strength, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rapport store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row-reading helpers ─────────────────────────────────────────────────────

fn read_contact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    contact_id:       row.get(0)?,
    user_id:          row.get(1)?,
    display_name:     row.get(2)?,
    email:            row.get(3)?,
    network_strength: row.get(4)?,
    created_at:       row.get(5)?,
  })
}

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInteraction> {
  Ok(RawInteraction {
    event_id:    row.get(0)?,
    contact_id:  row.get(1)?,
    kind:        row.get(2)?,
    occurred_at: row.get(3)?,
    source_ref:  row.get(4)?,
    recorded_at: row.get(5)?,
  })
}

fn read_integration_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawIntegration> {
  Ok(RawIntegration {
    integration_id: row.get(0)?,
    user_id:        row.get(1)?,
    grant_id:       row.get(2)?,
    provider:       row.get(3)?,
    status:         row.get(4)?,
    cursor:         row.get(5)?,
    created_at:     row.get(6)?,
  })
}

const CONTACT_COLS: &str =
  "contact_id, user_id, display_name, email, network_strength, created_at";
const EVENT_COLS: &str =
  "event_id, contact_id, kind, occurred_at, source_ref, recorded_at";
const INTEGRATION_COLS: &str =
  "integration_id, user_id, grant_id, provider, status, cursor, created_at";

/// Decode raw event rows, dropping any that fail with a warning. A
/// malformed row counts as zero interactions; it never fails a scoring or
/// read pass.
fn decode_events_lenient(raws: Vec<RawInteraction>) -> Vec<InteractionEvent> {
  raws
    .into_iter()
    .filter_map(|raw| match raw.into_event() {
      Ok(event) => Some(event),
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed interaction row");
        None
      }
    })
    .collect()
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    if self.find_user(&input.username).await?.is_some() {
      return Err(Error::UsernameTaken(input.username));
    }

    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, username, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, password_hash, created_at
               FROM users WHERE username = ?1",
              rusqlite::params![username],
              |row| {
                Ok(RawUser {
                  user_id:       row.get(0)?,
                  username:      row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn add_contact(&self, input: NewContact) -> Result<Contact> {
    let contact = Contact {
      contact_id:       Uuid::new_v4(),
      user_id:          input.user_id,
      display_name:     input.display_name,
      email:            input.email.map(|e| e.trim().to_lowercase()),
      network_strength: NetworkStrength::Low,
      created_at:       Utc::now(),
    };

    let id_str   = encode_uuid(contact.contact_id);
    let user_str = encode_uuid(contact.user_id);
    let name     = contact.display_name.clone();
    let email    = contact.email.clone();
    let tier_str = encode_strength(contact.network_strength).to_owned();
    let at_str   = encode_dt(contact.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts
             (contact_id, user_id, display_name, email, network_strength, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, user_str, name, email, tier_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTACT_COLS} FROM contacts WHERE contact_id = ?1"),
              rusqlite::params![id_str],
              read_contact_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn list_contacts(&self, user_id: Uuid) -> Result<Vec<Contact>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLS} FROM contacts
           WHERE user_id = ?1 ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], read_contact_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn find_contact_by_email(
    &self,
    user_id: Uuid,
    email: &str,
  ) -> Result<Option<Contact>> {
    let user_str  = encode_uuid(user_id);
    let email_key = email.trim().to_lowercase();

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CONTACT_COLS} FROM contacts
                 WHERE user_id = ?1 AND email = ?2"
              ),
              rusqlite::params![user_str, email_key],
              read_contact_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn set_network_strength(
    &self,
    contact_id: Uuid,
    tier: NetworkStrength,
  ) -> Result<()> {
    let id_str   = encode_uuid(contact_id);
    let tier_str = encode_strength(tier).to_owned();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contacts SET network_strength = ?2 WHERE contact_id = ?1",
          rusqlite::params![id_str, tier_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ContactNotFound(contact_id));
    }
    Ok(())
  }

  // ── Timelines — append-only writes ────────────────────────────────────────

  async fn append_events(
    &self,
    contact_id: Uuid,
    events: Vec<NewInteraction>,
  ) -> Result<usize> {
    if events.is_empty() {
      return Ok(0);
    }

    let contact_str = encode_uuid(contact_id);
    let rows: Vec<(String, String, String, String, String)> = events
      .into_iter()
      .map(|e| {
        (
          encode_uuid(Uuid::new_v4()),
          encode_kind(e.kind).to_owned(),
          encode_dt(e.occurred_at),
          e.source_ref,
          encode_dt(Utc::now()),
        )
      })
      .collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          // OR IGNORE backs the (contact_id, source_ref) dedup contract:
          // re-fetched events never produce duplicate rows.
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO interaction_events
               (event_id, contact_id, kind, occurred_at, source_ref, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (event_id, kind, occurred_at, source_ref, recorded_at) in &rows {
            inserted += stmt.execute(rusqlite::params![
              event_id,
              contact_str,
              kind,
              occurred_at,
              source_ref,
              recorded_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn get_timeline(&self, contact_id: Uuid) -> Result<Vec<InteractionEvent>> {
    let contact_str = encode_uuid(contact_id);

    let raws: Vec<RawInteraction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLS} FROM interaction_events
           WHERE contact_id = ?1 ORDER BY occurred_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![contact_str], read_event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_events_lenient(raws))
  }

  async fn load_timelines(&self, user_id: Uuid) -> Result<Vec<ContactView>> {
    let contacts = self.list_contacts(user_id).await?;
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawInteraction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT e.event_id, e.contact_id, e.kind, e.occurred_at,
                  e.source_ref, e.recorded_at
           FROM interaction_events e
           JOIN contacts c ON c.contact_id = e.contact_id
           WHERE c.user_id = ?1
           ORDER BY e.occurred_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], read_event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut timelines: HashMap<Uuid, Vec<InteractionEvent>> = HashMap::new();
    for event in decode_events_lenient(raws) {
      timelines.entry(event.contact_id).or_default().push(event);
    }

    Ok(
      contacts
        .into_iter()
        .map(|contact| {
          let timeline =
            timelines.remove(&contact.contact_id).unwrap_or_default();
          ContactView { contact, timeline }
        })
        .collect(),
    )
  }

  // ── Integrations ──────────────────────────────────────────────────────────

  async fn add_integration(&self, input: NewIntegration) -> Result<Integration> {
    let integration = Integration {
      integration_id: Uuid::new_v4(),
      user_id:        input.user_id,
      grant_id:       input.grant_id,
      provider:       input.provider,
      status:         input.status,
      cursor:         None,
      created_at:     Utc::now(),
    };

    let id_str     = encode_uuid(integration.integration_id);
    let user_str   = encode_uuid(integration.user_id);
    let grant      = integration.grant_id.clone();
    let provider   = integration.provider.clone();
    let status_str = encode_status(integration.status).to_owned();
    let at_str     = encode_dt(integration.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO integrations
             (integration_id, user_id, grant_id, provider, status, cursor, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
          rusqlite::params![id_str, user_str, grant, provider, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(integration)
  }

  async fn get_integration(&self, id: Uuid) -> Result<Option<Integration>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIntegration> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INTEGRATION_COLS} FROM integrations
                 WHERE integration_id = ?1"
              ),
              rusqlite::params![id_str],
              read_integration_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIntegration::into_integration).transpose()
  }

  async fn find_integration_by_grant(
    &self,
    user_id: Uuid,
    grant_id: &str,
  ) -> Result<Option<Integration>> {
    let user_str = encode_uuid(user_id);
    let grant    = grant_id.to_owned();

    let raw: Option<RawIntegration> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INTEGRATION_COLS} FROM integrations
                 WHERE user_id = ?1 AND grant_id = ?2"
              ),
              rusqlite::params![user_str, grant],
              read_integration_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIntegration::into_integration).transpose()
  }

  async fn list_integrations(&self, user_id: Uuid) -> Result<Vec<Integration>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawIntegration> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INTEGRATION_COLS} FROM integrations
           WHERE user_id = ?1 ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], read_integration_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawIntegration::into_integration)
      .collect()
  }

  async fn set_integration_status(
    &self,
    id: Uuid,
    status: IntegrationStatus,
  ) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_status(status).to_owned();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE integrations SET status = ?2 WHERE integration_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::IntegrationNotFound(id));
    }
    Ok(())
  }

  async fn set_integration_cursor(
    &self,
    id: Uuid,
    cursor: Option<SyncCursor>,
  ) -> Result<()> {
    let id_str     = encode_uuid(id);
    let cursor_str = cursor.as_ref().map(encode_cursor).transpose()?;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE integrations SET cursor = ?2 WHERE integration_id = ?1",
          rusqlite::params![id_str, cursor_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::IntegrationNotFound(id));
    }
    Ok(())
  }
}
