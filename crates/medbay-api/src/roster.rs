//! Handlers for `/squads` and `/players` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/squads` | |
//! | `GET`  | `/players` | Optional `?squad=<code>&position=<POR\|DEF\|MC\|DEL>` |
//! | `POST` | `/players` | Upsert by `id_jugadora` |
//! | `GET`  | `/players/{id}` | 404 if not found |
//! | `GET`  | `/players/{id}/injuries` | Most recently registered first |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use medbay_core::{
  injury::InjuryRecord,
  roster::{Player, Position, Squad},
  store::InjuryStore,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Squads ───────────────────────────────────────────────────────────────────

/// `GET /squads`
pub async fn list_squads<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Squad>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let squads = state.store.list_squads().await.map_err(ApiError::store)?;
  Ok(Json(squads))
}

// ─── Players ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub squad:    Option<String>,
  pub position: Option<Position>,
}

/// `GET /players[?squad=<code>&position=<code>]`
pub async fn list_players<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Player>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let players = state
    .store
    .list_players(params.squad, params.position)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(players))
}

/// `POST /players`: insert or replace by id.
pub async fn upsert_player<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Json(player): Json<Player>,
) -> Result<Json<Player>, ApiError>
where
  S: InjuryStore + 'static,
{
  if player.player_id.trim().is_empty() {
    return Err(ApiError::BadRequest("id_jugadora is required".into()));
  }
  let player = state.store.upsert_player(player).await.map_err(ApiError::store)?;
  Ok(Json(player))
}

/// Load a player or fail with 404.
pub(crate) async fn require_player<S>(store: &S, id: String) -> Result<Player, ApiError>
where
  S: InjuryStore,
{
  store
    .get_player(id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("player {id} not found")))
}

/// `GET /players/{id}`
pub async fn get_player<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Player>, ApiError>
where
  S: InjuryStore + 'static,
{
  Ok(Json(require_player(state.store.as_ref(), id).await?))
}

/// `GET /players/{id}/injuries`
pub async fn player_injuries<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<InjuryRecord>>, ApiError>
where
  S: InjuryStore + 'static,
{
  let player = require_player(state.store.as_ref(), id).await?;
  let injuries = state
    .store
    .injuries_for_player(player.player_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(injuries))
}
