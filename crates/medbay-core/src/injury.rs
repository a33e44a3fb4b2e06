//! Injury records: classification, clearance dates, status and the evolution
//! log of follow-up entries.
//!
//! [`InjuryRecord`] is the typed model the rest of the workspace works with.
//! On the wire (API JSON, JSON lines, the SQLite row) it travels as a flat
//! [`InjuryRow`] using the persisted column names. Rows are decoded
//! leniently so that historic data with loose formats still loads.

use std::{collections::BTreeSet, str::FromStr as _};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::{
  Error,
  catalog::{CatalogRef, same_name},
  derive::{self, days_between, parse_date, parse_timestamp},
  roster::Position,
};

/// Sentinel stored for a subtype or recurrence type that does not apply.
pub const NOT_APPLICABLE: &str = "NO APLICA";

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Clinical status. Variants are ordered; a record only ever moves forward.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum InjuryStatus {
  /// Reported but not yet counting as time-loss.
  #[default]
  #[serde(rename = "OBSERVACION")]
  #[strum(to_string = "OBSERVACION", serialize = "OBSERVACIÓN")]
  Observation,
  /// Time-loss is accruing.
  #[serde(rename = "ACTIVO")]
  #[strum(to_string = "ACTIVO", serialize = "ACTIVA")]
  Active,
  /// Closed. Only the evolution log may still grow.
  #[serde(rename = "INACTIVO")]
  #[strum(to_string = "INACTIVO", serialize = "INACTIVA")]
  Inactive,
}

/// Recurrence class by time elapsed since the previous clearance.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum RecurrenceType {
  /// Within two months.
  #[serde(rename = "TEMPRANA")]
  #[strum(to_string = "TEMPRANA")]
  Early,
  /// Between two and twelve months.
  #[serde(rename = "TARDIA")]
  #[strum(to_string = "TARDIA", serialize = "TARDÍA")]
  Late,
  /// After more than twelve months.
  #[serde(rename = "REMOTA")]
  #[strum(to_string = "REMOTA")]
  Remote,
}

impl RecurrenceType {
  /// Parse a stored label. Older rows carry a descriptive suffix such as
  /// `"TEMPRANA (≤ 2 MESES)"`; only the first word is significant.
  pub fn parse_label(s: &str) -> Option<Self> {
    let word = s.split_whitespace().next()?;
    Self::from_str(&word.to_uppercase()).ok()
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Laterality {
  #[serde(rename = "DERECHA")]
  #[strum(to_string = "DERECHA")]
  Right,
  #[serde(rename = "IZQUIERDA")]
  #[strum(to_string = "IZQUIERDA")]
  Left,
  #[serde(rename = "BILATERAL")]
  #[strum(to_string = "BILATERAL")]
  Bilateral,
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Where and how the injury happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
  pub place:              Option<CatalogRef>,
  pub segment:            CatalogRef,
  pub body_zone:          CatalogRef,
  pub specific_structure: Option<CatalogRef>,
  pub mechanism:          CatalogRef,
  pub injury_type:        CatalogRef,
  /// `None` when no subtype applies to the (mechanism, type) pair.
  pub injury_subtype:     Option<CatalogRef>,
  pub laterality:         Option<Laterality>,
}

// ─── Evolution log ───────────────────────────────────────────────────────────

/// One follow-up visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionEntry {
  #[serde(rename = "fecha_control", with = "lenient::date")]
  pub control_date:       NaiveDate,
  #[serde(rename = "tratamiento_aplicado", default)]
  pub applied_treatments: BTreeSet<String>,
  #[serde(rename = "personal_seguimiento", default)]
  pub following_staff:    Option<String>,
  #[serde(rename = "observaciones", default)]
  pub notes:              Option<String>,
  #[serde(rename = "fecha_hora_registro", with = "lenient::timestamp")]
  pub recorded_at:        DateTime<Utc>,
  #[serde(rename = "usuario", default)]
  pub recorded_by:        String,
}

/// The ordered, append-only list of follow-up entries for one injury.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvolutionLog(Vec<EvolutionEntry>);

impl EvolutionLog {
  /// Decode a stored evolution value: a JSON array, or a string holding a
  /// JSON array. Entries that cannot be read are skipped; anything else
  /// yields an empty log.
  pub fn decode_lenient(raw: Option<&Value>) -> Self {
    let items = match raw {
      Some(Value::Array(items)) => items.clone(),
      Some(Value::String(text)) if !text.trim().is_empty() => {
        match serde_json::from_str::<Value>(text) {
          Ok(Value::Array(items)) => items,
          Ok(_) | Err(_) => {
            tracing::warn!("evolution log is not a JSON array; treating as empty");
            return Self::default();
          }
        }
      }
      _ => return Self::default(),
    };

    let entries = items
      .into_iter()
      .enumerate()
      .filter_map(|(i, item)| match serde_json::from_value(item) {
        Ok(entry) => Some(entry),
        Err(e) => {
          tracing::warn!(index = i, error = %e, "skipping unreadable evolution entry");
          None
        }
      })
      .collect();
    Self(entries)
  }

  pub fn entries(&self) -> &[EvolutionEntry] { &self.0 }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn last(&self) -> Option<&EvolutionEntry> { self.0.last() }

  /// Append a follow-up entry. There is no way to remove one.
  pub fn append(&mut self, entry: EvolutionEntry) { self.0.push(entry); }

  /// Canonical JSON text, as written to storage.
  pub fn to_json_string(&self) -> crate::Result<String> {
    Ok(serde_json::to_string(&self.0)?)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One tracked injury event for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "InjuryRow", try_from = "InjuryRow")]
pub struct InjuryRecord {
  pub injury_id:                  String,
  pub player_id:                  String,
  pub position:                   Option<Position>,
  pub injury_date:                NaiveDate,
  pub classification:             Classification,
  pub estimated_days_out:         Option<i64>,
  /// Severity label from the catalog's ranges.
  pub severity:                   Option<String>,
  pub is_recurrence:              bool,
  pub recurrence_type:            Option<RecurrenceType>,
  pub estimated_clearance_date:   Option<NaiveDate>,
  pub medical_clearance_date:     Option<NaiveDate>,
  pub sports_clearance_date:      Option<NaiveDate>,
  pub observation_active_since:   Option<NaiveDate>,
  pub observation_inactive_since: Option<NaiveDate>,
  pub diagnosis:                  Option<String>,
  pub description:                Option<String>,
  pub reporting_staff:            String,
  pub treatment_types:            BTreeSet<String>,
  pub status:                     InjuryStatus,
  pub evolution:                  EvolutionLog,
  pub recorded_at:                DateTime<Utc>,
  pub recorded_by:                String,
}

impl InjuryRecord {
  /// The date time-loss starts counting from.
  pub fn time_loss_start(&self) -> NaiveDate {
    self.observation_active_since.unwrap_or(self.injury_date)
  }

  /// Days out as finalised by the medical clearance. `None` until the
  /// clearance is recorded.
  pub fn real_days_out(&self) -> Option<i64> {
    days_between(self.time_loss_start(), self.medical_clearance_date?)
  }

  /// Number of follow-up sessions recorded.
  pub fn session_count(&self) -> usize { self.evolution.len() }

  /// Days out used by reports: the real figure once known, the estimate
  /// otherwise.
  pub fn effective_days_out(&self) -> Option<i64> {
    self.real_days_out().or(self.estimated_days_out)
  }
}

// ─── Wire row ────────────────────────────────────────────────────────────────

/// Flat wire form of an [`InjuryRecord`], keyed by the persisted column
/// names.
///
/// Every field is optional and loosely typed so that legacy rows decode;
/// validation happens in the conversion to [`InjuryRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjuryRow {
  #[serde(deserialize_with = "lenient::opt_string")]
  pub id_lesion:                  Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub id_jugadora:                Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub posicion:                   Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_lesion:               Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub lugar_id:                   Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub lugar:                      Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub segmento_id:                Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub segmento:                   Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub zona_cuerpo_id:             Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub zona_cuerpo:                Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub zona_especifica_id:         Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub zona_especifica:            Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub lateralidad:                Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub tipo_lesion_id:             Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub tipo_lesion:                Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub tipo_especifico_id:         Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub tipo_especifico:            Option<String>,
  #[serde(deserialize_with = "lenient::opt_bool")]
  pub es_recidiva:                Option<bool>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub tipo_recidiva:              Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub dias_baja_estimado:         Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub impacto_dias_baja_estimado: Option<String>,
  #[serde(deserialize_with = "lenient::opt_i64")]
  pub mecanismo_id:               Option<i64>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub mecanismo:                  Option<String>,
  pub tipo_tratamiento:           Option<Value>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub personal_reporta:           Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_alta_diagnostico:     Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_alta_medica:          Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_alta_deportiva:       Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_observacion_activa:   Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_observacion_inactiva: Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub estado_lesion:              Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub diagnostico:                Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub descripcion:                Option<String>,
  pub evolucion:                  Option<Value>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub fecha_hora_registro:        Option<String>,
  #[serde(deserialize_with = "lenient::opt_string")]
  pub usuario:                    Option<String>,
  /// Number of evolution entries. Written for readers; ignored on input.
  #[serde(skip_deserializing)]
  pub sesiones:                   usize,
}

fn iso(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

fn split_ref(r: Option<CatalogRef>) -> (Option<i64>, Option<String>) {
  match r {
    Some(r) => (r.id, Some(r.name)),
    None => (None, None),
  }
}

impl From<InjuryRecord> for InjuryRow {
  fn from(r: InjuryRecord) -> Self {
    let c = r.classification;
    let (lugar_id, lugar) = split_ref(c.place);
    let (zona_especifica_id, zona_especifica) = split_ref(c.specific_structure);
    let (tipo_especifico_id, tipo_especifico) = match c.injury_subtype {
      Some(s) => (s.id, s.name),
      None => (None, NOT_APPLICABLE.to_owned()),
    };
    let tipo_recidiva = match (r.is_recurrence, r.recurrence_type) {
      (true, Some(t)) => t.to_string(),
      _ => NOT_APPLICABLE.to_owned(),
    };
    let treatments: Vec<Value> = r.treatment_types.into_iter().map(Value::String).collect();
    let sesiones = r.evolution.len();

    Self {
      id_lesion: Some(r.injury_id),
      id_jugadora: Some(r.player_id),
      posicion: r.position.map(|p| p.to_string()),
      fecha_lesion: Some(iso(r.injury_date)),
      lugar_id,
      lugar,
      segmento_id: c.segment.id,
      segmento: Some(c.segment.name),
      zona_cuerpo_id: c.body_zone.id,
      zona_cuerpo: Some(c.body_zone.name),
      zona_especifica_id,
      zona_especifica,
      lateralidad: c.laterality.map(|l| l.to_string()),
      tipo_lesion_id: c.injury_type.id,
      tipo_lesion: Some(c.injury_type.name),
      tipo_especifico_id,
      tipo_especifico: Some(tipo_especifico),
      es_recidiva: Some(r.is_recurrence),
      tipo_recidiva: Some(tipo_recidiva),
      dias_baja_estimado: r.estimated_days_out,
      impacto_dias_baja_estimado: r.severity,
      mecanismo_id: c.mechanism.id,
      mecanismo: Some(c.mechanism.name),
      tipo_tratamiento: Some(Value::Array(treatments)),
      personal_reporta: Some(r.reporting_staff),
      fecha_alta_diagnostico: r.estimated_clearance_date.map(iso),
      fecha_alta_medica: r.medical_clearance_date.map(iso),
      fecha_alta_deportiva: r.sports_clearance_date.map(iso),
      fecha_observacion_activa: r.observation_active_since.map(iso),
      fecha_observacion_inactiva: r.observation_inactive_since.map(iso),
      estado_lesion: Some(r.status.to_string()),
      diagnostico: r.diagnosis,
      descripcion: r.description,
      evolucion: Some(serde_json::to_value(&r.evolution).unwrap_or_default()),
      fecha_hora_registro: Some(r.recorded_at.to_rfc3339()),
      usuario: Some(r.recorded_by),
      sesiones,
    }
  }
}

/// Trimmed, non-empty text.
fn present(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Trimmed, non-empty text that is not the not-applicable sentinel.
fn applicable(s: Option<String>) -> Option<String> {
  present(s).filter(|s| !same_name(s, NOT_APPLICABLE))
}

fn required(s: Option<String>, field: &'static str) -> Result<String, Error> {
  present(s).ok_or(Error::MissingField(field))
}

fn required_ref(id: Option<i64>, name: Option<String>, field: &'static str) -> Result<CatalogRef, Error> {
  Ok(CatalogRef { id, name: required(name, field)? })
}

fn optional_ref(id: Option<i64>, name: Option<String>) -> Option<CatalogRef> {
  applicable(name).map(|name| CatalogRef { id, name })
}

/// Optional dates are read leniently: unreadable text is dropped with a
/// warning rather than failing the whole row.
fn optional_date(s: Option<String>, field: &'static str) -> Option<NaiveDate> {
  let text = present(s)?;
  let parsed = parse_date(&text);
  if parsed.is_none() {
    tracing::warn!(field, value = %text, "ignoring unreadable date");
  }
  parsed
}

/// Status for rows that predate the status column.
fn infer_status(row: &InjuryRow) -> InjuryStatus {
  let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
  if set(&row.fecha_alta_deportiva) || set(&row.fecha_observacion_inactiva) {
    InjuryStatus::Inactive
  } else if set(&row.fecha_alta_diagnostico) || set(&row.fecha_observacion_activa) {
    InjuryStatus::Active
  } else {
    InjuryStatus::Observation
  }
}

impl TryFrom<InjuryRow> for InjuryRecord {
  type Error = Error;

  fn try_from(row: InjuryRow) -> Result<Self, Error> {
    let status = match present(row.estado_lesion.clone()) {
      Some(s) => InjuryStatus::from_str(&s).map_err(|_| Error::UnknownStatus(s))?,
      None => infer_status(&row),
    };

    let date_text = required(row.fecha_lesion, "fecha_lesion")?;
    let injury_date = parse_date(&date_text).ok_or(Error::InvalidDate {
      field: "fecha_lesion",
      value: date_text,
    })?;

    let classification = Classification {
      place:              optional_ref(row.lugar_id, row.lugar),
      segment:            required_ref(row.segmento_id, row.segmento, "segmento")?,
      body_zone:          required_ref(row.zona_cuerpo_id, row.zona_cuerpo, "zona_cuerpo")?,
      specific_structure: optional_ref(row.zona_especifica_id, row.zona_especifica),
      mechanism:          required_ref(row.mecanismo_id, row.mecanismo, "mecanismo")?,
      injury_type:        required_ref(row.tipo_lesion_id, row.tipo_lesion, "tipo_lesion")?,
      injury_subtype:     optional_ref(row.tipo_especifico_id, row.tipo_especifico),
      laterality:         present(row.lateralidad).and_then(|l| l.parse().ok()),
    };

    let is_recurrence = row.es_recidiva.unwrap_or(false);
    let recurrence_type = applicable(row.tipo_recidiva)
      .filter(|_| is_recurrence)
      .and_then(|t| RecurrenceType::parse_label(&t));

    let recorded_at = present(row.fecha_hora_registro)
      .and_then(|s| parse_timestamp(&s))
      .or_else(|| injury_date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
      .ok_or(Error::MissingField("fecha_hora_registro"))?;

    Ok(Self {
      injury_id: required(row.id_lesion, "id_lesion")?,
      player_id: required(row.id_jugadora, "id_jugadora")?,
      position: present(row.posicion).and_then(|p| p.parse().ok()),
      injury_date,
      classification,
      estimated_days_out: row.dias_baja_estimado,
      severity: present(row.impacto_dias_baja_estimado),
      is_recurrence,
      recurrence_type,
      estimated_clearance_date: optional_date(row.fecha_alta_diagnostico, "fecha_alta_diagnostico"),
      medical_clearance_date: optional_date(row.fecha_alta_medica, "fecha_alta_medica"),
      sports_clearance_date: optional_date(row.fecha_alta_deportiva, "fecha_alta_deportiva"),
      observation_active_since: optional_date(
        row.fecha_observacion_activa,
        "fecha_observacion_activa",
      ),
      observation_inactive_since: optional_date(
        row.fecha_observacion_inactiva,
        "fecha_observacion_inactiva",
      ),
      diagnosis: present(row.diagnostico),
      description: present(row.descripcion),
      reporting_staff: present(row.personal_reporta).unwrap_or_default(),
      treatment_types: derive::normalize_treatment_list(row.tipo_tratamiento.as_ref()),
      status,
      evolution: EvolutionLog::decode_lenient(row.evolucion.as_ref()),
      recorded_at,
      recorded_by: present(row.usuario).unwrap_or_default(),
    })
  }
}

// ─── Lenient field decoding ──────────────────────────────────────────────────

mod lenient {
  use serde::{Deserialize, Deserializer};
  use serde_json::Value;

  fn scalar(v: Value) -> Option<String> {
    match v {
      Value::String(s) => Some(s),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar(Value::deserialize(d)?))
  }

  /// Integers, floats with no fraction, and numeric text.
  pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
      Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
      Value::String(s) => {
        let s = s.trim();
        s.parse::<i64>()
          .ok()
          .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
      }
      _ => None,
    })
  }

  /// Booleans, `0`/`1`, and `true`/`false`/`si`/`no` text.
  pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
      Value::Bool(b) => Some(b),
      Value::Number(n) => n.as_i64().map(|i| i != 0),
      Value::String(s) => match s.trim().to_lowercase().as_str() {
        "true" | "1" | "si" | "sí" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
      },
      _ => None,
    })
  }

  pub mod date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
      s.collect_str(&d.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
      let text = String::deserialize(d)?;
      crate::derive::parse_date(&text)
        .ok_or_else(|| D::Error::custom(format!("unreadable date {text:?}")))
    }
  }

  pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
      s.serialize_str(&t.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
      let text = String::deserialize(d)?;
      crate::derive::parse_timestamp(&text)
        .ok_or_else(|| D::Error::custom(format!("unreadable timestamp {text:?}")))
    }
  }
}


#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::{fixtures::record, *};

  fn entry(day: u32, notes: &str) -> EvolutionEntry {
    EvolutionEntry {
      control_date:       NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
      applied_treatments: BTreeSet::from(["FISIOTERAPIA".to_owned()]),
      following_staff:    Some("Fisio".into()),
      notes:              Some(notes.into()),
      recorded_at:        NaiveDate::from_ymd_opt(2025, 10, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
        .and_utc(),
      recorded_by:        "staff".into(),
    }
  }

  #[test]
  fn status_labels_parse_case_insensitively() {
    assert_eq!("activo".parse::<InjuryStatus>().unwrap(), InjuryStatus::Active);
    assert_eq!("Observacion".parse::<InjuryStatus>().unwrap(), InjuryStatus::Observation);
    assert!("CERRADO".parse::<InjuryStatus>().is_err());
    assert_eq!(InjuryStatus::Inactive.to_string(), "INACTIVO");
    assert!(InjuryStatus::Observation < InjuryStatus::Active);
  }

  #[test]
  fn recurrence_label_ignores_suffix() {
    assert_eq!(RecurrenceType::parse_label("TEMPRANA (≤ 2 MESES)"), Some(RecurrenceType::Early));
    assert_eq!(RecurrenceType::parse_label("Tardía (2-12 meses)"), Some(RecurrenceType::Late));
    assert_eq!(RecurrenceType::parse_label(NOT_APPLICABLE), None);
  }

  #[test]
  fn record_round_trips_through_json() {
    let mut r = record();
    r.evolution.append(entry(3, "primera"));
    r.evolution.append(entry(8, "segunda"));

    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["fecha_lesion"], "2025-10-01");
    assert_eq!(json["es_recidiva"], false);
    assert_eq!(json["tipo_recidiva"], NOT_APPLICABLE);
    assert_eq!(json["sesiones"], 2);
    assert_eq!(json["evolucion"][1]["observaciones"], "segunda");

    let back: InjuryRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, r);
  }

  #[test]
  fn absent_subtype_is_written_as_sentinel() {
    let mut r = record();
    r.classification.injury_subtype = None;
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["tipo_especifico"], NOT_APPLICABLE);
    assert_eq!(json["tipo_especifico_id"], Value::Null);
    let back: InjuryRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back.classification.injury_subtype, None);
  }

  #[test]
  fn evolution_decodes_from_json_text() {
    let text = serde_json::to_string(&vec![entry(3, "a"), entry(5, "b")]).unwrap();
    let log = EvolutionLog::decode_lenient(Some(&Value::String(text)));
    assert_eq!(log.len(), 2);
    assert_eq!(log.last().and_then(|e| e.notes.as_deref()), Some("b"));
  }

  #[test]
  fn evolution_decode_never_fails() {
    assert!(EvolutionLog::decode_lenient(Some(&json!("not json"))).is_empty());
    assert!(EvolutionLog::decode_lenient(Some(&json!({"a": 1}))).is_empty());
    assert!(EvolutionLog::decode_lenient(None).is_empty());

    let mixed = json!([
      {"fecha_control": "2025-10-03", "fecha_hora_registro": "2025-10-03T10:00:00"},
      {"fecha_control": "someday"}
    ]);
    assert_eq!(EvolutionLog::decode_lenient(Some(&mixed)).len(), 1);
  }

  #[test]
  fn legacy_row_decodes_leniently() {
    let row = json!({
      "id_lesion": "AG20240301-1",
      "id_jugadora": 17,
      "posicion": "Medio centro",
      "fecha_lesion": "01/03/2024",
      "segmento": "TREN INFERIOR",
      "zona_cuerpo": "RODILLA",
      "mecanismo": "SIN CONTACTO",
      "tipo_lesion": "LIGAMENTARIA",
      "tipo_especifico": "NO APLICA",
      "es_recidiva": "false",
      "tipo_recidiva": "TEMPRANA",
      "dias_baja_estimado": "21",
      "tipo_tratamiento": "[\"reposo\"]",
      "fecha_alta_medica": "pronto",
      "fecha_alta_deportiva": "2024-03-25",
      "evolucion": "[]"
    });
    let r: InjuryRecord = serde_json::from_value(row).unwrap();
    assert_eq!(r.player_id, "17");
    assert_eq!(r.position, Some(Position::Midfielder));
    assert_eq!(r.injury_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(r.classification.injury_subtype, None);
    assert_eq!(r.classification.body_zone.id, None);
    assert_eq!(r.recurrence_type, None);
    assert_eq!(r.estimated_days_out, Some(21));
    assert_eq!(r.medical_clearance_date, None);
    assert_eq!(r.status, InjuryStatus::Inactive);
    assert!(r.treatment_types.contains("REPOSO"));
  }

  #[test]
  fn row_without_zone_is_rejected() {
    let row = json!({
      "id_lesion": "X-1",
      "id_jugadora": "P1",
      "fecha_lesion": "2025-10-01",
      "segmento": "TREN INFERIOR",
      "mecanismo": "SIN CONTACTO",
      "tipo_lesion": "MUSCULAR"
    });
    let err = serde_json::from_value::<InjuryRecord>(row).unwrap_err();
    assert!(err.to_string().contains("zona_cuerpo"));
  }

  #[test]
  fn real_days_out_counts_from_observation_activation() {
    let mut r = record();
    assert_eq!(r.real_days_out(), None);
    r.medical_clearance_date = NaiveDate::from_ymd_opt(2025, 10, 20);
    assert_eq!(r.real_days_out(), Some(19));
    r.observation_active_since = NaiveDate::from_ymd_opt(2025, 10, 5);
    assert_eq!(r.real_days_out(), Some(15));
    assert_eq!(r.effective_days_out(), Some(15));
  }
}
