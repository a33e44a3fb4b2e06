//! Handlers for `GET /export` and `POST /import` (JSON lines).

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use medbay_core::store::{InjuryQuery, InjuryStore};
use serde::Serialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

const NDJSON: &str = "application/x-ndjson";

/// `GET /export`: every record as canonical JSON lines.
pub async fn export<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InjuryStore + 'static,
{
  let records = state
    .store
    .list_injuries(&InjuryQuery::default())
    .await
    .map_err(ApiError::store)?;
  let body = medbay_jsonl::encode_many(&records)?;
  Ok(([(header::CONTENT_TYPE, NDJSON)], body))
}

#[derive(Debug, Serialize)]
pub struct RejectedLine {
  pub line:  usize,
  pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
  pub imported: Vec<String>,
  /// Ids already present in the store.
  pub skipped:  Vec<String>,
  pub rejected: Vec<RejectedLine>,
}

/// `POST /import`: body: JSON lines, canonical or legacy.
pub async fn import<S>(
  Authenticated(username): Authenticated,
  State(state): State<AppState<S>>,
  body: String,
) -> Result<Json<ImportReport>, ApiError>
where
  S: InjuryStore + 'static,
{
  let store = state.store.as_ref();
  let catalog = store.catalog().await.map_err(ApiError::store)?;
  let mut report = ImportReport::default();

  for (line, decoded) in medbay_jsonl::decode_many(&body, &catalog) {
    let record = match decoded {
      Ok(record) => record,
      Err(e) => {
        tracing::warn!(line, error = %e, "skipping unreadable line");
        report.rejected.push(RejectedLine { line, error: e.to_string() });
        continue;
      }
    };
    let id = record.injury_id.clone();
    if store.get_injury(id.clone()).await.map_err(ApiError::store)?.is_some() {
      report.skipped.push(id);
      continue;
    }
    store.insert_injury(record).await.map_err(ApiError::store)?;
    report.imported.push(id);
  }

  tracing::info!(
    user = %username,
    imported = report.imported.len(),
    skipped = report.skipped.len(),
    rejected = report.rejected.len(),
    "import finished"
  );
  Ok(Json(report))
}
