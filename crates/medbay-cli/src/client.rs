//! Async HTTP client wrapping the medbay JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use medbay_core::{
  injury::InjuryRecord,
  report::{Bucket, Dimension, Period, Summary, Trends},
  roster::{Player, Position},
  store::InjuryQuery,
};
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

const NO_QUERY: &[(&str, &str)] = &[];

/// Connection settings for the medbay API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Report filter parameters shared by every `/reports/*` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub squad:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub position:    Option<Position>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub injury_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub from:        Option<chrono::NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub to:          Option<chrono::NaiveDate>,
}

/// Async HTTP client for the medbay JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Turn a non-success response into an error carrying the server's message
/// and, for blocked submissions, every violation.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: Value = resp.json().await.unwrap_or(Value::Null);
  let mut message = format!("{what} → {status}");
  if let Some(error) = body["error"].as_str() {
    message.push_str(&format!(": {error}"));
  }
  if let Some(violations) = body["violations"].as_array() {
    for v in violations.iter().filter_map(Value::as_str) {
      message.push_str(&format!("\n  - {v}"));
    }
  }
  Err(anyhow!(message))
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
  {
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let resp = check(resp, &format!("GET {path}")).await?;
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }

  async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let resp = self
      .auth(self.client.post(self.url(path)))
      .json(body)
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    let resp = check(resp, &format!("POST {path}")).await?;
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }

  // ── Roster ────────────────────────────────────────────────────────────────

  /// `GET /players[?squad=&position=]`
  pub async fn list_players(
    &self,
    squad: Option<String>,
    position: Option<Position>,
  ) -> Result<Vec<Player>> {
    let mut query = Vec::new();
    if let Some(squad) = squad {
      query.push(("squad", squad));
    }
    if let Some(position) = position {
      query.push(("position", position.to_string()));
    }
    self.get("/players", &query).await
  }

  // ── Injuries ──────────────────────────────────────────────────────────────

  /// `GET /injuries`
  pub async fn list_injuries(&self, query: &InjuryQuery) -> Result<Vec<InjuryRecord>> {
    // Drop unset fields so the server sees no empty parameters.
    let params: Vec<(String, String)> = match serde_json::to_value(query)? {
      Value::Object(map) => map
        .into_iter()
        .filter_map(|(k, v)| match v {
          Value::Null => None,
          Value::String(s) => Some((k, s)),
          other => Some((k, other.to_string())),
        })
        .collect(),
      _ => Vec::new(),
    };
    self.get("/injuries", &params).await
  }

  /// `GET /injuries/{id}`
  pub async fn get_injury(&self, id: &str) -> Result<InjuryRecord> {
    self.get(&format!("/injuries/{id}"), NO_QUERY).await
  }

  /// `GET /players/{id}/injuries`
  pub async fn player_injuries(&self, player_id: &str) -> Result<Vec<InjuryRecord>> {
    self.get(&format!("/players/{player_id}/injuries"), NO_QUERY).await
  }

  /// `POST /injuries`: `form` is the registration form including
  /// `id_jugadora`.
  pub async fn register(&self, form: &Value) -> Result<InjuryRecord> {
    self.post("/injuries", form).await
  }

  /// `POST /injuries/{id}/follow-ups`
  pub async fn follow_up(&self, id: &str, form: &Value) -> Result<InjuryRecord> {
    self.post(&format!("/injuries/{id}/follow-ups"), form).await
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  /// `GET /reports/summary`
  pub async fn summary(&self, filter: &ReportFilter) -> Result<Summary> {
    self.get("/reports/summary", filter).await
  }

  /// `GET /reports/trends?period=`
  pub async fn trends(&self, filter: &ReportFilter, period: Period) -> Result<Trends> {
    let resp = self
      .auth(self.client.get(self.url("/reports/trends")))
      .query(filter)
      .query(&[("period", period.to_string())])
      .send()
      .await
      .context("GET /reports/trends failed")?;
    let resp = check(resp, "GET /reports/trends").await?;
    resp.json().await.context("deserialising trends")
  }

  /// `GET /reports/distribution?dimension=`
  pub async fn distribution(
    &self,
    filter: &ReportFilter,
    dimension: Dimension,
  ) -> Result<Vec<Bucket>> {
    let resp = self
      .auth(self.client.get(self.url("/reports/distribution")))
      .query(filter)
      .query(&[("dimension", dimension.to_string())])
      .send()
      .await
      .context("GET /reports/distribution failed")?;
    let resp = check(resp, "GET /reports/distribution").await?;
    resp.json().await.context("deserialising distribution")
  }

  // ── Import / export ───────────────────────────────────────────────────────

  /// `GET /export`: the JSON-lines document.
  pub async fn export(&self) -> Result<String> {
    let resp = self
      .auth(self.client.get(self.url("/export")))
      .send()
      .await
      .context("GET /export failed")?;
    let resp = check(resp, "GET /export").await?;
    resp.text().await.context("reading export body")
  }

  /// `POST /import`: returns the server's import report.
  pub async fn import(&self, body: String) -> Result<Value> {
    let resp = self
      .auth(self.client.post(self.url("/import")))
      .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
      .body(body)
      .send()
      .await
      .context("POST /import failed")?;
    let resp = check(resp, "POST /import").await?;
    resp.json().await.context("deserialising import report")
  }
}
