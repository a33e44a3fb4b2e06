//! Players and squads.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Playing position, stored by its short code.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Position {
  #[serde(rename = "POR")]
  #[strum(to_string = "POR", serialize = "PORTERA")]
  Goalkeeper,
  #[serde(rename = "DEF")]
  #[strum(to_string = "DEF", serialize = "DEFENSA")]
  Defender,
  #[serde(rename = "MC")]
  #[strum(to_string = "MC", serialize = "CENTRO", serialize = "MEDIO CENTRO")]
  Midfielder,
  #[serde(rename = "DEL")]
  #[strum(to_string = "DEL", serialize = "DELANTERA")]
  Forward,
}

impl Position {
  /// Human-readable label shown in rosters and reports.
  pub fn label(self) -> &'static str {
    match self {
      Self::Goalkeeper => "Portera",
      Self::Defender => "Defensa",
      Self::Midfielder => "Centro",
      Self::Forward => "Delantera",
    }
  }
}

/// A squad (competition roster) players belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
  pub id:   i64,
  #[serde(rename = "nombre")]
  pub name: String,
  #[serde(rename = "codigo")]
  pub code: String,
}

/// A rostered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
  #[serde(rename = "id_jugadora")]
  pub player_id:  String,
  #[serde(rename = "nombre")]
  pub first_name: String,
  #[serde(rename = "apellido")]
  pub last_name:  String,
  #[serde(rename = "posicion")]
  pub position:   Option<Position>,
  /// Code of the squad the player is registered in.
  #[serde(rename = "plantel")]
  pub squad:      Option<String>,
  #[serde(rename = "activo", default = "default_active")]
  pub active:     bool,
}

fn default_active() -> bool { true }

impl Player {
  /// `"first last"`, trimmed; used for display and for injury id initials.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name.trim(), self.last_name.trim())
      .trim()
      .to_owned()
  }
}
