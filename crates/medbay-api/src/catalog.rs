//! Handler for `GET /catalog`.

use axum::{Json, extract::State};
use medbay_core::{catalog::Catalog, store::InjuryStore};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /catalog`: every lookup table.
pub async fn get<S>(
  _user: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<Catalog>, ApiError>
where
  S: InjuryStore + 'static,
{
  let catalog = state.store.catalog().await.map_err(ApiError::store)?;
  Ok(Json(catalog))
}
