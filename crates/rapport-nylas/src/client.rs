//! Async HTTP client wrapping the Nylas v3 API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rapport_core::provider::{
  ActivityProvider, GrantCredentials, RemoteInteraction,
};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result, wire};

/// Page size requested from list endpoints.
const PAGE_LIMIT: usize = 200;

/// Cap on the response-body excerpt attached to API errors.
const DETAIL_LIMIT: usize = 512;

/// Connection settings for the Nylas API.
#[derive(Debug, Clone, Deserialize)]
pub struct NylasConfig {
  /// E.g. `https://api.us.nylas.com`.
  pub api_base:     String,
  pub api_key:      String,
  pub client_id:    String,
  /// Must match the redirect URI registered with the provider.
  pub redirect_uri: String,
  /// Per-request timeout in seconds.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

/// Async HTTP client for the Nylas v3 API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct NylasClient {
  client: Client,
  config: NylasConfig,
}

impl NylasClient {
  pub fn new(config: NylasConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.api_base.trim_end_matches('/'))
  }

  /// Fetch every page of a list endpoint, following `next_cursor` tokens
  /// until the provider is exhausted.
  async fn fetch_paged<T: DeserializeOwned>(
    &self,
    path: &str,
    base_query: Vec<(String, String)>,
  ) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let mut query = base_query.clone();
      query.push(("limit".into(), PAGE_LIMIT.to_string()));
      if let Some(token) = &page_token {
        query.push(("page_token".into(), token.clone()));
      }

      let resp = self
        .client
        .get(self.url(path))
        .bearer_auth(&self.config.api_key)
        .query(&query)
        .send()
        .await?;
      let page: wire::Page<T> = read_json(resp).await?;

      out.extend(page.data);
      match page.next_cursor {
        Some(token) if !token.is_empty() => page_token = Some(token),
        _ => break,
      }
    }

    Ok(out)
  }
}

/// Decode a JSON body, or surface a non-success status with a body
/// excerpt attached.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let detail = excerpt(resp.text().await.unwrap_or_default());
    return Err(Error::Api { status: status.as_u16(), detail });
  }
  Ok(resp.json().await?)
}

/// Cap an error body at [`DETAIL_LIMIT`] bytes without splitting a
/// character.
fn excerpt(mut body: String) -> String {
  if body.len() > DETAIL_LIMIT {
    let mut cut = DETAIL_LIMIT;
    while !body.is_char_boundary(cut) {
      cut -= 1;
    }
    body.truncate(cut);
  }
  body
}

// ─── ActivityProvider impl ───────────────────────────────────────────────────

impl ActivityProvider for NylasClient {
  type Error = Error;

  async fn fetch_email_activity(
    &self,
    grant_id: &str,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<RemoteInteraction>> {
    let mut query = Vec::new();
    if let Some(ts) = since {
      query.push(("received_after".into(), ts.timestamp().to_string()));
    }

    let messages: Vec<wire::WireMessage> = self
      .fetch_paged(&format!("/v3/grants/{grant_id}/messages"), query)
      .await?;
    Ok(wire::normalize_messages(messages))
  }

  async fn fetch_calendar_activity(
    &self,
    grant_id: &str,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<RemoteInteraction>> {
    let mut query = vec![("calendar_id".into(), "primary".into())];
    if let Some(ts) = since {
      query.push(("start".into(), ts.timestamp().to_string()));
    }

    let events: Vec<wire::WireEvent> = self
      .fetch_paged(&format!("/v3/grants/{grant_id}/events"), query)
      .await?;
    Ok(wire::normalize_events(events))
  }

  async fn exchange_code(&self, code: &str) -> Result<GrantCredentials> {
    let resp = self
      .client
      .post(self.url("/v3/connect/token"))
      .json(&serde_json::json!({
        "code": code,
        "client_id": self.config.client_id,
        "redirect_uri": self.config.redirect_uri,
        "grant_type": "authorization_code",
      }))
      .send()
      .await?;

    let token: wire::WireTokenResponse = read_json(resp).await?;
    Ok(GrantCredentials {
      grant_id: token.grant_id,
      email:    token.email,
      provider: "nylas".into(),
    })
  }

  async fn revoke_grant(&self, grant_id: &str) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/v3/grants/{grant_id}")))
      .bearer_auth(&self.config.api_key)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let detail = excerpt(resp.text().await.unwrap_or_default());
      return Err(Error::Api { status: status.as_u16(), detail });
    }
    Ok(())
  }
}
