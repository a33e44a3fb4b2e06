//! The `InjuryStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `medbay-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  catalog::Catalog,
  injury::{InjuryRecord, InjuryStatus},
  roster::{Player, Position, Squad},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`InjuryStore::list_injuries`]. Every field narrows the
/// result; an empty query returns every record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjuryQuery {
  pub player_id:   Option<String>,
  /// Squad code; matches players registered in that squad.
  pub squad:       Option<String>,
  pub position:    Option<Position>,
  /// Injury type name, compared case-insensitively.
  pub injury_type: Option<String>,
  pub status:      Option<InjuryStatus>,
  /// Inclusive lower bound on the injury date.
  pub from:        Option<NaiveDate>,
  /// Inclusive upper bound on the injury date.
  pub to:          Option<NaiveDate>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an injury register backend.
///
/// Each write is a single statement: one INSERT per new injury, one UPDATE
/// per follow-up. Concurrent edits of the same injury are not reconciled;
/// the last write wins.
///
/// All methods return `Send` futures so the trait can be used behind `axum`
/// on a multi-threaded runtime.
pub trait InjuryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Load every lookup table.
  fn catalog(&self) -> impl Future<Output = Result<Catalog, Self::Error>> + Send + '_;

  // ── Roster ────────────────────────────────────────────────────────────

  fn list_squads(&self) -> impl Future<Output = Result<Vec<Squad>, Self::Error>> + Send + '_;

  /// Insert a squad, or rename the one with the same code.
  fn upsert_squad(&self, squad: Squad) -> impl Future<Output = Result<Squad, Self::Error>> + Send + '_;

  /// Players ordered by last then first name, optionally filtered.
  fn list_players(
    &self,
    squad: Option<String>,
    position: Option<Position>,
  ) -> impl Future<Output = Result<Vec<Player>, Self::Error>> + Send + '_;

  fn get_player(
    &self,
    player_id: String,
  ) -> impl Future<Output = Result<Option<Player>, Self::Error>> + Send + '_;

  /// Insert a player, or replace the one with the same id.
  fn upsert_player(
    &self,
    player: Player,
  ) -> impl Future<Output = Result<Player, Self::Error>> + Send + '_;

  // ── Injuries: reads ───────────────────────────────────────────────────

  fn list_injuries<'a>(
    &'a self,
    query: &'a InjuryQuery,
  ) -> impl Future<Output = Result<Vec<InjuryRecord>, Self::Error>> + Send + 'a;

  fn get_injury(
    &self,
    injury_id: String,
  ) -> impl Future<Output = Result<Option<InjuryRecord>, Self::Error>> + Send + '_;

  /// A player's injuries, most recently registered first.
  fn injuries_for_player(
    &self,
    player_id: String,
  ) -> impl Future<Output = Result<Vec<InjuryRecord>, Self::Error>> + Send + '_;

  /// Id of the player's most recently registered injury.
  fn last_injury_id(
    &self,
    player_id: String,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  // ── Injuries: writes ──────────────────────────────────────────────────

  /// Persist a new record. Fails if the id is already taken.
  fn insert_injury(
    &self,
    record: InjuryRecord,
  ) -> impl Future<Output = Result<InjuryRecord, Self::Error>> + Send + '_;

  /// Persist the lifecycle fields of an existing record: evolution log,
  /// clearance and observation dates, status, estimated days and severity.
  /// Classification fields are left untouched.
  fn update_lifecycle(
    &self,
    record: InjuryRecord,
  ) -> impl Future<Output = Result<InjuryRecord, Self::Error>> + Send + '_;
}
