//! Handlers for `/reports/*` endpoints.
//!
//! Every report accepts the same filter parameters (`squad`, `position`,
//! `injury_type`, `from`, `to`); the filter is applied before aggregation.

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use medbay_core::{
  injury::InjuryRecord,
  report::{self, Bucket, Dimension, Period, RecordFilter, Summary, Trends},
  roster::Position,
  store::{InjuryQuery, InjuryStore},
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
  /// Squad code.
  pub squad:       Option<String>,
  pub position:    Option<Position>,
  pub injury_type: Option<String>,
  pub from:        Option<NaiveDate>,
  pub to:          Option<NaiveDate>,
  pub period:      Option<Period>,
  pub dimension:   Option<Dimension>,
}

/// Every stored record plus the filter described by `params`.
async fn load<S>(store: &S, params: &ReportParams) -> Result<(Vec<InjuryRecord>, RecordFilter), ApiError>
where
  S: InjuryStore,
{
  let players = match &params.squad {
    Some(code) => {
      let roster = store
        .list_players(Some(code.clone()), None)
        .await
        .map_err(ApiError::store)?;
      Some(roster.into_iter().map(|p| p.player_id).collect::<BTreeSet<_>>())
    }
    None => None,
  };
  let filter = RecordFilter {
    players,
    position: params.position,
    injury_type: params.injury_type.clone(),
    from: params.from,
    to: params.to,
  };
  let records = store
    .list_injuries(&InjuryQuery::default())
    .await
    .map_err(ApiError::store)?;
  Ok((records, filter))
}

/// `GET /reports/summary`
pub async fn summary<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<Summary>, ApiError>
where
  S: InjuryStore + 'static,
{
  let (records, filter) = load(state.store.as_ref(), &params).await?;
  Ok(Json(report::summarize(&filter.apply(&records))))
}

/// `GET /reports/trends[?period=week|month]`
pub async fn trends<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<Trends>, ApiError>
where
  S: InjuryStore + 'static,
{
  let (records, filter) = load(state.store.as_ref(), &params).await?;
  let period = params.period.unwrap_or_default();
  Ok(Json(report::trends(&filter.apply(&records), period)))
}

/// `GET /reports/recent[?period=week|month]`: records within the window
/// ending at the latest injury date.
pub async fn recent<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<Vec<InjuryRecord>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let (records, filter) = load(state.store.as_ref(), &params).await?;
  let period = params.period.unwrap_or_default();
  let window = report::recent(&filter.apply(&records), period);
  Ok(Json(window.into_iter().cloned().collect()))
}

/// `GET /reports/distribution?dimension=<zone|injury_type|…>`
pub async fn distribution<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<Vec<Bucket>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let dimension = params
    .dimension
    .ok_or_else(|| ApiError::BadRequest("dimension is required".into()))?;
  let (records, filter) = load(state.store.as_ref(), &params).await?;
  Ok(Json(report::distribution(&filter.apply(&records), dimension)))
}
