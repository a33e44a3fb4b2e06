//! Handlers for `/injuries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/injuries` | [`InjuryQuery`] parameters |
//! | `POST` | `/injuries` | Registration form plus `id_jugadora`; 201 or 422 |
//! | `GET`  | `/injuries/{id}` | 404 if not found |
//! | `POST` | `/injuries/{id}/follow-ups` | Follow-up form; 200 or 422 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use medbay_core::{
  injury::InjuryRecord,
  lifecycle::{self, FollowUpForm, NewInjuryForm, PriorInjuries, SessionContext},
  store::{InjuryQuery, InjuryStore},
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError, roster::require_player};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /injuries[?player_id=&squad=&position=&injury_type=&status=&from=&to=&limit=&offset=]`
pub async fn list<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(query): Query<InjuryQuery>,
) -> Result<Json<Vec<InjuryRecord>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let injuries = state.store.list_injuries(&query).await.map_err(ApiError::store)?;
  Ok(Json(injuries))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

pub(crate) async fn require_injury<S>(store: &S, id: String) -> Result<InjuryRecord, ApiError>
where
  S: InjuryStore,
{
  store
    .get_injury(id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("injury {id} not found")))
}

/// `GET /injuries/{id}`
pub async fn get_one<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<InjuryRecord>, ApiError>
where
  S: InjuryStore + 'static,
{
  Ok(Json(require_injury(state.store.as_ref(), id).await?))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub id_jugadora: String,
  #[serde(flatten)]
  pub form:        NewInjuryForm,
}

/// `POST /injuries`
pub async fn create<S>(
  Authenticated(username): Authenticated,
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InjuryStore + 'static,
{
  let store = state.store.as_ref();
  let player = require_player(store, body.id_jugadora).await?;

  let catalog = store.catalog().await.map_err(ApiError::store)?;
  let last_id = store
    .last_injury_id(player.player_id.clone())
    .await
    .map_err(ApiError::store)?;
  let history = store
    .injuries_for_player(player.player_id.clone())
    .await
    .map_err(ApiError::store)?;

  let ctx = SessionContext::at(username, Utc::now());
  let prior = PriorInjuries { last_injury_id: last_id.as_deref(), records: &history };
  let record = lifecycle::create(&ctx, &catalog, &player, prior, &body.form)
    .into_result()
    .map_err(|errors| {
      tracing::info!(player = %player.player_id, violations = errors.len(), "registration blocked");
      ApiError::Validation(errors)
    })?;

  if store
    .get_injury(record.injury_id.clone())
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!("injury {} already exists", record.injury_id)));
  }

  let record = store.insert_injury(record).await.map_err(ApiError::store)?;
  tracing::info!(injury = %record.injury_id, user = %ctx.username, "injury registered");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Follow-up ────────────────────────────────────────────────────────────────

/// `POST /injuries/{id}/follow-ups`
pub async fn follow_up<S>(
  Authenticated(username): Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(form): Json<FollowUpForm>,
) -> Result<Json<InjuryRecord>, ApiError>
where
  S: InjuryStore + 'static,
{
  let store = state.store.as_ref();
  let record = require_injury(store, id).await?;
  let catalog = store.catalog().await.map_err(ApiError::store)?;

  let ctx = SessionContext::at(username, Utc::now());
  let submission = lifecycle::follow_up(&ctx, &catalog, record, &form);
  if submission.follow_up_disabled && submission.is_valid() {
    return Err(ApiError::Conflict(format!(
      "injury {} is closed; only follow-up entries can be added",
      submission.record.injury_id
    )));
  }
  let record = submission.into_result().map_err(|errors| {
    tracing::info!(violations = errors.len(), "follow-up blocked");
    ApiError::Validation(errors)
  })?;

  let record = store.update_lifecycle(record).await.map_err(ApiError::store)?;
  Ok(Json(record))
}
