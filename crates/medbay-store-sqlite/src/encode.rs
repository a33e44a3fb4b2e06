//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Injury rows map column-for-column onto [`InjuryRow`], the same flat shape
//! used on the wire, so decoding shares the lenient rules in `medbay-core`.
//! Treatment lists and the evolution log are stored as JSON text.

use chrono::NaiveDate;
use medbay_core::{
  injury::{InjuryRecord, InjuryRow},
  roster::{Player, Position, Squad},
};
use rusqlite::types::Value as SqlValue;

use crate::Result;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

fn text(v: Option<String>) -> SqlValue { v.map_or(SqlValue::Null, SqlValue::Text) }

fn integer(v: Option<i64>) -> SqlValue { v.map_or(SqlValue::Null, SqlValue::Integer) }

fn json_text(v: Option<&serde_json::Value>) -> Result<SqlValue> {
  Ok(SqlValue::Text(match v {
    Some(v) => serde_json::to_string(v)?,
    None => "[]".to_owned(),
  }))
}

// ─── Injuries ────────────────────────────────────────────────────────────────

/// Column list shared by every injury SELECT and the INSERT, in
/// [`read_injury_row`] order.
pub const INJURY_COLUMNS: &str = "id_lesion, id_jugadora, posicion, fecha_lesion,
  lugar_id, lugar, segmento_id, segmento, zona_cuerpo_id, zona_cuerpo,
  zona_especifica_id, zona_especifica, lateralidad,
  tipo_lesion_id, tipo_lesion, tipo_especifico_id, tipo_especifico,
  es_recidiva, tipo_recidiva, dias_baja_estimado, impacto_dias_baja_estimado,
  mecanismo_id, mecanismo, tipo_tratamiento, personal_reporta,
  fecha_alta_diagnostico, fecha_alta_medica, fecha_alta_deportiva,
  fecha_observacion_activa, fecha_observacion_inactiva,
  estado_lesion, diagnostico, descripcion, evolucion,
  fecha_hora_registro, usuario";

pub const INJURY_COLUMN_COUNT: usize = 36;

pub fn read_injury_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InjuryRow> {
  let json = |idx: usize| -> rusqlite::Result<Option<serde_json::Value>> {
    Ok(row.get::<_, Option<String>>(idx)?.map(serde_json::Value::String))
  };
  Ok(InjuryRow {
    id_lesion:                  row.get(0)?,
    id_jugadora:                row.get(1)?,
    posicion:                   row.get(2)?,
    fecha_lesion:               row.get(3)?,
    lugar_id:                   row.get(4)?,
    lugar:                      row.get(5)?,
    segmento_id:                row.get(6)?,
    segmento:                   row.get(7)?,
    zona_cuerpo_id:             row.get(8)?,
    zona_cuerpo:                row.get(9)?,
    zona_especifica_id:         row.get(10)?,
    zona_especifica:            row.get(11)?,
    lateralidad:                row.get(12)?,
    tipo_lesion_id:             row.get(13)?,
    tipo_lesion:                row.get(14)?,
    tipo_especifico_id:         row.get(15)?,
    tipo_especifico:            row.get(16)?,
    es_recidiva:                row.get(17)?,
    tipo_recidiva:              row.get(18)?,
    dias_baja_estimado:         row.get(19)?,
    impacto_dias_baja_estimado: row.get(20)?,
    mecanismo_id:               row.get(21)?,
    mecanismo:                  row.get(22)?,
    tipo_tratamiento:           json(23)?,
    personal_reporta:           row.get(24)?,
    fecha_alta_diagnostico:     row.get(25)?,
    fecha_alta_medica:          row.get(26)?,
    fecha_alta_deportiva:       row.get(27)?,
    fecha_observacion_activa:   row.get(28)?,
    fecha_observacion_inactiva: row.get(29)?,
    estado_lesion:              row.get(30)?,
    diagnostico:                row.get(31)?,
    descripcion:                row.get(32)?,
    evolucion:                  json(33)?,
    fecha_hora_registro:        row.get(34)?,
    usuario:                    row.get(35)?,
    sesiones:                   0,
  })
}

/// Every column value of a record, in [`INJURY_COLUMNS`] order.
pub fn injury_values(record: InjuryRecord) -> Result<Vec<SqlValue>> {
  let r = InjuryRow::from(record);
  Ok(vec![
    text(r.id_lesion),
    text(r.id_jugadora),
    text(r.posicion),
    text(r.fecha_lesion),
    integer(r.lugar_id),
    text(r.lugar),
    integer(r.segmento_id),
    text(r.segmento),
    integer(r.zona_cuerpo_id),
    text(r.zona_cuerpo),
    integer(r.zona_especifica_id),
    text(r.zona_especifica),
    text(r.lateralidad),
    integer(r.tipo_lesion_id),
    text(r.tipo_lesion),
    integer(r.tipo_especifico_id),
    text(r.tipo_especifico),
    SqlValue::Integer(i64::from(r.es_recidiva.unwrap_or(false))),
    text(r.tipo_recidiva),
    integer(r.dias_baja_estimado),
    text(r.impacto_dias_baja_estimado),
    integer(r.mecanismo_id),
    text(r.mecanismo),
    json_text(r.tipo_tratamiento.as_ref())?,
    text(r.personal_reporta),
    text(r.fecha_alta_diagnostico),
    text(r.fecha_alta_medica),
    text(r.fecha_alta_deportiva),
    text(r.fecha_observacion_activa),
    text(r.fecha_observacion_inactiva),
    text(r.estado_lesion),
    text(r.diagnostico),
    text(r.descripcion),
    json_text(r.evolucion.as_ref())?,
    text(r.fecha_hora_registro),
    text(r.usuario),
  ])
}

/// Values for the lifecycle UPDATE, ending with the id for the WHERE clause.
pub fn lifecycle_values(record: &InjuryRecord) -> Result<Vec<SqlValue>> {
  Ok(vec![
    SqlValue::Text(record.evolution.to_json_string()?),
    text(record.estimated_clearance_date.map(encode_date)),
    text(record.medical_clearance_date.map(encode_date)),
    text(record.sports_clearance_date.map(encode_date)),
    text(record.observation_active_since.map(encode_date)),
    text(record.observation_inactive_since.map(encode_date)),
    SqlValue::Text(record.status.to_string()),
    integer(record.estimated_days_out),
    text(record.severity.clone()),
    SqlValue::Text(record.injury_id.clone()),
  ])
}

pub fn decode_injury(row: InjuryRow) -> Result<InjuryRecord> { Ok(InjuryRecord::try_from(row)?) }

// ─── Roster ──────────────────────────────────────────────────────────────────

/// Raw values read directly from a `jugadoras` row.
pub struct RawPlayer {
  pub player_id:  String,
  pub first_name: String,
  pub last_name:  String,
  pub position:   Option<String>,
  pub squad:      Option<String>,
  pub active:     bool,
}

pub const PLAYER_COLUMNS: &str = "id_jugadora, nombre, apellido, posicion, plantel, activo";

impl RawPlayer {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:  row.get(0)?,
      first_name: row.get(1)?,
      last_name:  row.get(2)?,
      position:   row.get(3)?,
      squad:      row.get(4)?,
      active:     row.get(5)?,
    })
  }

  /// Unknown position codes decode as `None` rather than failing the roster.
  pub fn into_player(self) -> Player {
    let position = self.position.as_deref().and_then(|p| match p.parse::<Position>() {
      Ok(p) => Some(p),
      Err(_) => {
        tracing::warn!(player = %self.player_id, position = p, "unknown position code");
        None
      }
    });
    Player {
      player_id: self.player_id,
      first_name: self.first_name,
      last_name: self.last_name,
      position,
      squad: self.squad,
      active: self.active,
    }
  }
}

pub fn read_squad(row: &rusqlite::Row<'_>) -> rusqlite::Result<Squad> {
  Ok(Squad { id: row.get(0)?, name: row.get(1)?, code: row.get(2)? })
}
