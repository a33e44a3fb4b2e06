//! The injury lifecycle controller.
//!
//! Two flows are supported: [`create`] assembles a new record from the
//! registration form, and [`follow_up`] applies a follow-up or clearance
//! submission to an existing record. Neither touches storage. Each returns a
//! [`Submission`] holding the assembled record and every violated rule; the
//! caller persists the record only when the error list is empty.
//!
//! Status moves forward only:
//!
//! ```text
//! OBSERVACION ──(observation active / estimated clearance)──▶ ACTIVO
//!      │                                                        │
//!      └──(observation inactive)──▶ INACTIVO ◀──(sports clearance)
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  catalog::{Catalog, CatalogRef, same_name},
  derive::{
    classify_recurrence, classify_severity, estimated_days_out, generate_injury_id,
    is_subtype_eligible, normalize_treatments,
  },
  injury::{
    Classification, EvolutionEntry, EvolutionLog, InjuryRecord, InjuryStatus, Laterality,
    NOT_APPLICABLE, RecurrenceType,
  },
  roster::Player,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Per-request context. The controller reads no clock or global state.
#[derive(Debug, Clone)]
pub struct SessionContext {
  /// Staff member performing the submission; becomes `usuario`.
  pub username: String,
  pub today:    NaiveDate,
  pub now:      DateTime<Utc>,
}

impl SessionContext {
  pub fn at(username: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self { username: username.into(), today: now.date_naive(), now }
  }
}

/// The registration form for a new injury. Catalog values are submitted by
/// name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewInjuryForm {
  #[serde(rename = "fecha_lesion")]
  pub injury_date:              Option<NaiveDate>,
  #[serde(rename = "lugar")]
  pub place:                    Option<String>,
  #[serde(rename = "segmento")]
  pub segment:                  Option<String>,
  #[serde(rename = "zona_cuerpo")]
  pub body_zone:                Option<String>,
  #[serde(rename = "zona_especifica")]
  pub specific_structure:       Option<String>,
  #[serde(rename = "lateralidad")]
  pub laterality:               Option<Laterality>,
  #[serde(rename = "mecanismo")]
  pub mechanism:                Option<String>,
  #[serde(rename = "tipo_lesion")]
  pub injury_type:              Option<String>,
  #[serde(rename = "tipo_especifico")]
  pub injury_subtype:           Option<String>,
  #[serde(rename = "es_recidiva")]
  pub is_recurrence:            bool,
  #[serde(rename = "tipo_recidiva")]
  pub recurrence_type:          Option<RecurrenceType>,
  #[serde(rename = "fecha_alta_diagnostico")]
  pub estimated_clearance_date: Option<NaiveDate>,
  #[serde(rename = "tipo_tratamiento")]
  pub treatment_types:          Vec<String>,
  #[serde(rename = "personal_reporta")]
  pub reporting_staff:          Option<String>,
  #[serde(rename = "diagnostico")]
  pub diagnosis:                Option<String>,
  #[serde(rename = "descripcion")]
  pub description:              Option<String>,
}

/// A follow-up or clearance submission against an existing injury.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpForm {
  /// Whether an evolution entry is being recorded.
  #[serde(rename = "agregar_seguimiento")]
  pub add_follow_up:              bool,
  /// Defaults to the session's `today`.
  #[serde(rename = "fecha_control")]
  pub control_date:               Option<NaiveDate>,
  #[serde(rename = "tratamiento_aplicado")]
  pub applied_treatments:         Vec<String>,
  #[serde(rename = "personal_seguimiento")]
  pub following_staff:            Option<String>,
  #[serde(rename = "observaciones")]
  pub notes:                      Option<String>,
  #[serde(rename = "fecha_alta_diagnostico")]
  pub estimated_clearance_date:   Option<NaiveDate>,
  #[serde(rename = "fecha_observacion_activa")]
  pub observation_active_since:   Option<NaiveDate>,
  #[serde(rename = "fecha_observacion_inactiva")]
  pub observation_inactive_since: Option<NaiveDate>,
  #[serde(rename = "fecha_alta_medica")]
  pub medical_clearance_date:     Option<NaiveDate>,
  #[serde(rename = "fecha_alta_deportiva")]
  pub sports_clearance_date:      Option<NaiveDate>,
}

/// What the controller knows about a player's earlier injuries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorInjuries<'a> {
  /// Id of the most recently registered injury; continues the id sequence.
  pub last_injury_id: Option<&'a str>,
  /// Earlier records, used to suggest a recurrence class.
  pub records:        &'a [InjuryRecord],
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// One violated rule. A blocked submission carries one per violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  Required(&'static str),

  #[error("unknown {table} value {value:?}")]
  UnknownCatalogEntry { table: &'static str, value: String },

  #[error("zone {zone:?} does not belong to segment {segment:?}")]
  ZoneOutsideSegment { zone: String, segment: String },

  #[error("structure {structure:?} does not belong to zone {zone:?}")]
  StructureOutsideZone { structure: String, zone: String },

  #[error("injury type {injury_type:?} is not allowed for mechanism {mechanism:?}")]
  TypeNotAllowedForMechanism { injury_type: String, mechanism: String },

  #[error("subtype {subtype:?} is not compatible with {mechanism:?} / {injury_type:?}")]
  IncompatibleSubtype { subtype: String, mechanism: String, injury_type: String },

  #[error("injury date {0} is in the future")]
  InjuryDateInFuture(NaiveDate),

  #[error("{field} ({date}) is before the injury date ({injury_date})")]
  BeforeInjuryDate { field: &'static str, date: NaiveDate, injury_date: NaiveDate },

  #[error("{field} ({date}) is before time loss started ({start})")]
  BeforeTimeLossStart { field: &'static str, date: NaiveDate, start: NaiveDate },

  #[error("sports clearance ({sports}) is before medical clearance ({medical})")]
  SportsBeforeMedical { sports: NaiveDate, medical: NaiveDate },

  #[error("sports clearance requires a medical clearance")]
  SportsWithoutMedical,

  #[error("medical clearance can only be recorded on an active injury")]
  MedicalClearanceWhileNotActive,

  #[error("observation ended ({inactive}) before it became active ({active})")]
  InactiveBeforeActive { active: NaiveDate, inactive: NaiveDate },

  #[error("observation dates can only be set while the injury is under observation")]
  NotUnderObservation,

  #[error("{field} is already recorded and cannot change")]
  AlreadyRecorded { field: &'static str },

  #[error("the injury is closed; {field} cannot change")]
  RecordClosed { field: &'static str },

  #[error("following staff is required when adding a follow-up")]
  FollowUpStaffRequired,
}

/// The assembled record plus everything wrong with it.
#[derive(Debug, Clone)]
pub struct Submission {
  pub record:             InjuryRecord,
  pub errors:             Vec<ValidationError>,
  /// True when the injury is closed and no follow-up was requested; the
  /// caller disables its save action.
  pub follow_up_disabled: bool,
}

impl Submission {
  pub fn is_valid(&self) -> bool { self.errors.is_empty() }

  /// The record if it may be persisted, the violations otherwise.
  pub fn into_result(self) -> Result<InjuryRecord, Vec<ValidationError>> {
    if self.errors.is_empty() { Ok(self.record) } else { Err(self.errors) }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn present(s: &Option<String>) -> Option<&str> {
  s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Look a submitted name up in one catalog table, recording a violation for
/// a missing required value or an unknown name.
fn resolve<'c, T>(
  errors: &mut Vec<ValidationError>,
  table: &'static str,
  submitted: &Option<String>,
  required: bool,
  lookup: impl FnOnce(&str) -> Option<&'c T>,
) -> Option<&'c T> {
  let Some(name) = present(submitted) else {
    if required {
      errors.push(ValidationError::Required(table));
    }
    return None;
  };
  let found = lookup(name);
  if found.is_none() {
    errors.push(ValidationError::UnknownCatalogEntry { table, value: name.to_owned() });
  }
  found
}

/// The submitted value as a reference: linked when resolved, otherwise kept
/// as typed so the returned working copy still shows it.
fn to_ref<T>(resolved: Option<&T>, submitted: &Option<String>) -> CatalogRef
where
  for<'a> &'a T: Into<CatalogRef>,
{
  resolved
    .map(Into::into)
    .unwrap_or_else(|| CatalogRef::unlinked(present(submitted).unwrap_or_default()))
}

fn not_before_injury(
  errors: &mut Vec<ValidationError>,
  field: &'static str,
  date: Option<NaiveDate>,
  injury_date: NaiveDate,
) {
  if let Some(date) = date.filter(|d| *d < injury_date) {
    errors.push(ValidationError::BeforeInjuryDate { field, date, injury_date });
  }
}

/// Dates before the injury itself are reported by [`not_before_injury`];
/// this only catches those that fall between the injury and the point the
/// observation became active. Returns whether `date` may be applied.
fn not_before_time_loss(
  errors: &mut Vec<ValidationError>,
  field: &'static str,
  date: NaiveDate,
  record: &InjuryRecord,
) -> bool {
  let start = record.time_loss_start();
  if date < start && date >= record.injury_date {
    errors.push(ValidationError::BeforeTimeLossStart { field, date, start });
  }
  date >= start
}

/// Most recent clearance on an earlier injury, on or before `injury_date`.
fn previous_clearance(records: &[InjuryRecord], injury_date: NaiveDate) -> Option<NaiveDate> {
  records
    .iter()
    .filter_map(|r| r.sports_clearance_date.or(r.medical_clearance_date))
    .filter(|d| *d <= injury_date)
    .max()
}

/// Recompute estimated days out and severity after any relevant date change.
fn refresh_derived(record: &mut InjuryRecord, catalog: &Catalog) {
  record.estimated_days_out =
    estimated_days_out(record.time_loss_start(), record.estimated_clearance_date);
  record.severity = classify_severity(record.effective_days_out(), &catalog.severity_ranges)
    .map(str::to_owned);
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Assemble a new injury record from the registration form.
pub fn create(
  ctx: &SessionContext,
  catalog: &Catalog,
  player: &Player,
  prior: PriorInjuries<'_>,
  form: &NewInjuryForm,
) -> Submission {
  let mut errors = Vec::new();

  let injury_date = match form.injury_date {
    Some(d) => d,
    None => {
      errors.push(ValidationError::Required("fecha_lesion"));
      ctx.today
    }
  };
  if injury_date > ctx.today {
    errors.push(ValidationError::InjuryDateInFuture(injury_date));
  }

  let place = resolve(&mut errors, "lugar", &form.place, false, |n| catalog.place(n));
  let segment = resolve(&mut errors, "segmento", &form.segment, true, |n| catalog.segment(n));
  let zone = resolve(&mut errors, "zona_cuerpo", &form.body_zone, true, |n| catalog.zone(n));
  let structure = resolve(&mut errors, "zona_especifica", &form.specific_structure, false, |n| {
    catalog.structure(n)
  });
  let mechanism = resolve(&mut errors, "mecanismo", &form.mechanism, true, |n| catalog.mechanism(n));
  let injury_type =
    resolve(&mut errors, "tipo_lesion", &form.injury_type, true, |n| catalog.injury_type(n));

  if let (Some(segment), Some(zone)) = (segment, zone)
    && zone.segment_id != segment.id
  {
    errors.push(ValidationError::ZoneOutsideSegment {
      zone:    zone.name.clone(),
      segment: segment.name.clone(),
    });
  }
  if let (Some(zone), Some(structure)) = (zone, structure)
    && structure.zone_id != zone.id
  {
    errors.push(ValidationError::StructureOutsideZone {
      structure: structure.name.clone(),
      zone:      zone.name.clone(),
    });
  }

  let mut subtype = None;
  if let (Some(mechanism), Some(injury_type)) = (mechanism, injury_type) {
    if !catalog.types_for_mechanism(mechanism.id).iter().any(|t| t.id == injury_type.id) {
      errors.push(ValidationError::TypeNotAllowedForMechanism {
        injury_type: injury_type.name.clone(),
        mechanism:   mechanism.name.clone(),
      });
    }
    let submitted = present(&form.injury_subtype).filter(|s| !same_name(s, NOT_APPLICABLE));
    if is_subtype_eligible(mechanism.id, injury_type.id, &catalog.subtype_compatibility)
      && let Some(name) = submitted
    {
      subtype = catalog
        .subtypes_for(mechanism.id, injury_type.id)
        .into_iter()
        .find(|s| same_name(&s.name, name))
        .map(CatalogRef::from);
      if subtype.is_none() {
        errors.push(ValidationError::IncompatibleSubtype {
          subtype:     name.to_owned(),
          mechanism:   mechanism.name.clone(),
          injury_type: injury_type.name.clone(),
        });
      }
    }
  }

  let reporting_staff = present(&form.reporting_staff).unwrap_or_default().to_owned();
  if reporting_staff.is_empty() {
    errors.push(ValidationError::Required("personal_reporta"));
  }

  not_before_injury(&mut errors, "fecha_alta_diagnostico", form.estimated_clearance_date, injury_date);

  let treatment_types = normalize_treatments(&form.treatment_types);
  for t in &treatment_types {
    if !catalog.treatments.iter().any(|c| same_name(&c.name, t)) {
      errors.push(ValidationError::UnknownCatalogEntry { table: "tratamientos", value: t.clone() });
    }
  }

  let recurrence_type = if form.is_recurrence {
    form.recurrence_type.or_else(|| {
      previous_clearance(prior.records, injury_date)
        .and_then(|cleared| classify_recurrence(cleared, injury_date))
    })
  } else {
    None
  };

  let status = if form.estimated_clearance_date.is_some() {
    InjuryStatus::Active
  } else {
    InjuryStatus::Observation
  };

  let mut record = InjuryRecord {
    injury_id: generate_injury_id(
      &player.full_name(),
      &player.player_id,
      prior.last_injury_id,
      injury_date,
    ),
    player_id: player.player_id.clone(),
    position: player.position,
    injury_date,
    classification: Classification {
      place:              place.map(CatalogRef::from),
      segment:            to_ref(segment, &form.segment),
      body_zone:          to_ref(zone, &form.body_zone),
      specific_structure: structure.map(CatalogRef::from),
      mechanism:          to_ref(mechanism, &form.mechanism),
      injury_type:        to_ref(injury_type, &form.injury_type),
      injury_subtype:     subtype,
      laterality:         form.laterality,
    },
    estimated_days_out: None,
    severity: None,
    is_recurrence: form.is_recurrence,
    recurrence_type,
    estimated_clearance_date: form.estimated_clearance_date,
    medical_clearance_date: None,
    sports_clearance_date: None,
    observation_active_since: None,
    observation_inactive_since: None,
    diagnosis: present(&form.diagnosis).map(str::to_owned),
    description: present(&form.description).map(str::to_owned),
    reporting_staff,
    treatment_types,
    status,
    evolution: EvolutionLog::default(),
    recorded_at: ctx.now,
    recorded_by: ctx.username.clone(),
  };
  refresh_derived(&mut record, catalog);

  Submission { record, errors, follow_up_disabled: false }
}

// ─── Follow-up ───────────────────────────────────────────────────────────────

/// Write `new` into `slot` unless a different value is already there.
/// Returns whether the slot changed.
fn record_once(
  errors: &mut Vec<ValidationError>,
  field: &'static str,
  slot: &mut Option<NaiveDate>,
  new: Option<NaiveDate>,
) -> bool {
  match (new, *slot) {
    (None, _) => false,
    (Some(new), Some(current)) if new == current => false,
    (Some(_), Some(_)) => {
      errors.push(ValidationError::AlreadyRecorded { field });
      false
    }
    (Some(new), None) => {
      *slot = Some(new);
      true
    }
  }
}

/// Apply a follow-up submission to a working copy of `record`.
pub fn follow_up(
  ctx: &SessionContext,
  catalog: &Catalog,
  mut record: InjuryRecord,
  form: &FollowUpForm,
) -> Submission {
  let mut errors = Vec::new();
  let injury_date = record.injury_date;
  let initial_status = record.status;

  let date_changes = [
    ("fecha_alta_diagnostico", form.estimated_clearance_date, record.estimated_clearance_date),
    ("fecha_observacion_activa", form.observation_active_since, record.observation_active_since),
    ("fecha_observacion_inactiva", form.observation_inactive_since, record.observation_inactive_since),
    ("fecha_alta_medica", form.medical_clearance_date, record.medical_clearance_date),
    ("fecha_alta_deportiva", form.sports_clearance_date, record.sports_clearance_date),
  ];

  if initial_status == InjuryStatus::Inactive {
    for (field, new, current) in date_changes {
      if new.is_some() && new != current {
        errors.push(ValidationError::RecordClosed { field });
      }
    }
  } else {
    for (field, new, _) in date_changes {
      not_before_injury(&mut errors, field, new, injury_date);
    }
    apply_dates(&mut errors, &mut record, form);
    refresh_derived(&mut record, catalog);
  }

  if form.add_follow_up {
    let control_date = form.control_date.unwrap_or(ctx.today);
    not_before_injury(&mut errors, "fecha_control", Some(control_date), injury_date);

    let following_staff = present(&form.following_staff).map(str::to_owned);
    if following_staff.is_none() {
      errors.push(ValidationError::FollowUpStaffRequired);
    }
    let applied_treatments: BTreeSet<String> = normalize_treatments(&form.applied_treatments);
    let notes = present(&form.notes).map(str::to_owned);

    if !applied_treatments.is_empty() || following_staff.is_some() || notes.is_some() {
      record.evolution.append(EvolutionEntry {
        control_date,
        applied_treatments,
        following_staff,
        notes,
        recorded_at: ctx.now,
        recorded_by: ctx.username.clone(),
      });
    }
  }

  debug_assert!(record.status >= initial_status);
  let follow_up_disabled = initial_status == InjuryStatus::Inactive && !form.add_follow_up;
  Submission { record, errors, follow_up_disabled }
}

/// Clearance and observation dates, and the status transitions they drive.
fn apply_dates(errors: &mut Vec<ValidationError>, record: &mut InjuryRecord, form: &FollowUpForm) {
  let changes = |new: Option<NaiveDate>, current: Option<NaiveDate>| new.is_some() && new != current;
  let wants_active = changes(form.observation_active_since, record.observation_active_since);
  let wants_inactive = changes(form.observation_inactive_since, record.observation_inactive_since);

  if wants_active || wants_inactive {
    if record.status != InjuryStatus::Observation {
      errors.push(ValidationError::NotUnderObservation);
    } else {
      if record_once(
        errors,
        "fecha_observacion_activa",
        &mut record.observation_active_since,
        form.observation_active_since,
      ) {
        record.status = InjuryStatus::Active;
      }
      if record_once(
        errors,
        "fecha_observacion_inactiva",
        &mut record.observation_inactive_since,
        form.observation_inactive_since,
      ) {
        record.status = InjuryStatus::Inactive;
      }
      if let (Some(active), Some(inactive)) =
        (record.observation_active_since, record.observation_inactive_since)
        && inactive < active
      {
        errors.push(ValidationError::InactiveBeforeActive { active, inactive });
      }
    }
  }

  if let Some(estimate) = form.estimated_clearance_date {
    if record.status == InjuryStatus::Inactive {
      if record.estimated_clearance_date != Some(estimate) {
        errors.push(ValidationError::RecordClosed { field: "fecha_alta_diagnostico" });
      }
    } else if not_before_time_loss(errors, "fecha_alta_diagnostico", estimate, record) {
      record.estimated_clearance_date = Some(estimate);
      if record.status == InjuryStatus::Observation {
        record.status = InjuryStatus::Active;
      }
    }
  }

  if let Some(medical) = form.medical_clearance_date
    && record.medical_clearance_date != Some(medical)
  {
    if record.status != InjuryStatus::Active {
      errors.push(ValidationError::MedicalClearanceWhileNotActive);
    } else if not_before_time_loss(errors, "fecha_alta_medica", medical, record) {
      record_once(errors, "fecha_alta_medica", &mut record.medical_clearance_date, Some(medical));
    }
  }

  if let Some(sports) = form.sports_clearance_date
    && record.sports_clearance_date != Some(sports)
  {
    match record.medical_clearance_date {
      None => errors.push(ValidationError::SportsWithoutMedical),
      Some(medical) if sports < medical => {
        errors.push(ValidationError::SportsBeforeMedical { sports, medical });
      }
      Some(_) => {
        if record_once(errors, "fecha_alta_deportiva", &mut record.sports_clearance_date, Some(sports))
        {
          record.status = InjuryStatus::Inactive;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{catalog::fixtures::catalog, injury::fixtures::record, roster::Position};

  fn d(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

  fn ctx(today: &str) -> SessionContext {
    SessionContext::at("staff", d(today).and_hms_opt(12, 0, 0).unwrap().and_utc())
  }

  fn ana() -> Player {
    Player {
      player_id:  "P1".into(),
      first_name: "Ana".into(),
      last_name:  "Gómez".into(),
      position:   Some(Position::Defender),
      squad:      Some("A".into()),
      active:     true,
    }
  }

  fn thigh_strain() -> NewInjuryForm {
    NewInjuryForm {
      injury_date: Some(d("2025-10-01")),
      place: Some("ENTRENAMIENTO".into()),
      segment: Some("TREN INFERIOR".into()),
      body_zone: Some("MUSLO".into()),
      specific_structure: Some("ISQUIOTIBIALES".into()),
      mechanism: Some("SIN CONTACTO".into()),
      injury_type: Some("MUSCULAR".into()),
      injury_subtype: Some("DISTENSIÓN".into()),
      estimated_clearance_date: Some(d("2025-10-15")),
      treatment_types: vec!["crioterapia".into()],
      reporting_staff: Some("Dra. López".into()),
      ..Default::default()
    }
  }

  fn observed() -> InjuryRecord {
    let mut r = record();
    r.status = InjuryStatus::Observation;
    r.estimated_clearance_date = None;
    r.estimated_days_out = None;
    r.severity = None;
    r
  }

  #[test]
  fn create_registers_active_injury() {
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), PriorInjuries::default(), &thigh_strain());
    assert!(sub.is_valid(), "{:?}", sub.errors);
    let r = sub.record;
    assert_eq!(r.injury_id, "AG20251001-1");
    assert_eq!(r.estimated_days_out, Some(14));
    assert_eq!(r.severity.as_deref(), Some("GRAVE"));
    assert_eq!(r.status, InjuryStatus::Active);
    assert_eq!(r.classification.body_zone.id, Some(12));
    assert_eq!(r.classification.injury_subtype.map(|s| s.id), Some(Some(1)));
    assert_eq!(r.recorded_by, "staff");
    assert!(r.treatment_types.contains("CRIOTERAPIA"));
  }

  #[test]
  fn create_without_estimate_starts_under_observation() {
    let form = NewInjuryForm { estimated_clearance_date: None, ..thigh_strain() };
    let prior = PriorInjuries { last_injury_id: Some("AG20250301-3"), records: &[] };
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), prior, &form);
    assert!(sub.is_valid());
    assert_eq!(sub.record.status, InjuryStatus::Observation);
    assert_eq!(sub.record.severity, None);
    assert_eq!(sub.record.injury_id, "AG20251001-4");
  }

  #[test]
  fn excluded_pair_forces_subtype_absent() {
    let form = NewInjuryForm {
      mechanism: Some("SOBRECARGA".into()),
      injury_subtype: Some("ROTURA FIBRILAR".into()),
      ..thigh_strain()
    };
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), PriorInjuries::default(), &form);
    assert!(sub.is_valid(), "{:?}", sub.errors);
    assert_eq!(sub.record.classification.injury_subtype, None);
  }

  #[test]
  fn create_reports_every_violation() {
    let form = NewInjuryForm {
      injury_date: Some(d("2025-10-10")),
      body_zone: Some("HOMBRO".into()),
      specific_structure: Some("LCA".into()),
      mechanism: Some("SOBRECARGA".into()),
      injury_type: Some("LIGAMENTARIA".into()),
      estimated_clearance_date: Some(d("2025-10-01")),
      reporting_staff: None,
      ..thigh_strain()
    };
    let sub = create(&ctx("2025-10-05"), &catalog(), &ana(), PriorInjuries::default(), &form);
    let errors = sub.errors;
    assert!(errors.contains(&ValidationError::InjuryDateInFuture(d("2025-10-10"))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::ZoneOutsideSegment { .. })));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::StructureOutsideZone { .. })));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::TypeNotAllowedForMechanism { .. })));
    assert!(errors.contains(&ValidationError::Required("personal_reporta")));
    assert!(errors.iter().any(|e| matches!(
      e,
      ValidationError::BeforeInjuryDate { field: "fecha_alta_diagnostico", .. }
    )));
  }

  #[test]
  fn create_rejects_unknown_names() {
    let form = NewInjuryForm { body_zone: Some("CODO".into()), ..thigh_strain() };
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), PriorInjuries::default(), &form);
    assert_eq!(sub.errors, [ValidationError::UnknownCatalogEntry {
      table: "zona_cuerpo",
      value: "CODO".into(),
    }]);
  }

  #[test]
  fn recurrence_type_is_suggested_from_history() {
    let mut earlier = record();
    earlier.medical_clearance_date = Some(d("2025-08-20"));
    earlier.sports_clearance_date = Some(d("2025-08-25"));
    let history = [earlier];
    let prior = PriorInjuries { last_injury_id: Some("AG20250801-1"), records: &history };

    let form = NewInjuryForm { is_recurrence: true, ..thigh_strain() };
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), prior, &form);
    assert_eq!(sub.record.recurrence_type, Some(RecurrenceType::Early));

    let form = NewInjuryForm { recurrence_type: Some(RecurrenceType::Late), ..thigh_strain() };
    let sub = create(&ctx("2025-10-02"), &catalog(), &ana(), prior, &form);
    assert_eq!(sub.record.recurrence_type, None);
  }

  #[test]
  fn observation_to_active_to_inactive() {
    let c = catalog();
    let ctx = ctx("2025-10-30");

    let form = FollowUpForm {
      observation_active_since: Some(d("2025-10-05")),
      estimated_clearance_date: Some(d("2025-10-12")),
      ..Default::default()
    };
    let sub = follow_up(&ctx, &c, observed(), &form);
    assert!(sub.is_valid(), "{:?}", sub.errors);
    assert_eq!(sub.record.status, InjuryStatus::Active);
    assert_eq!(sub.record.estimated_days_out, Some(7));
    assert_eq!(sub.record.severity.as_deref(), Some("MODERADA"));

    let form = FollowUpForm { medical_clearance_date: Some(d("2025-10-20")), ..Default::default() };
    let sub = follow_up(&ctx, &c, sub.record, &form);
    assert!(sub.is_valid(), "{:?}", sub.errors);
    assert_eq!(sub.record.status, InjuryStatus::Active);
    assert_eq!(sub.record.real_days_out(), Some(15));
    assert_eq!(sub.record.severity.as_deref(), Some("GRAVE"));

    let form = FollowUpForm { sports_clearance_date: Some(d("2025-10-25")), ..Default::default() };
    let sub = follow_up(&ctx, &c, sub.record, &form);
    assert!(sub.is_valid(), "{:?}", sub.errors);
    assert_eq!(sub.record.status, InjuryStatus::Inactive);
  }

  #[test]
  fn observation_can_close_directly() {
    let form = FollowUpForm { observation_inactive_since: Some(d("2025-10-03")), ..Default::default() };
    let sub = follow_up(&ctx("2025-10-04"), &catalog(), observed(), &form);
    assert!(sub.is_valid());
    assert_eq!(sub.record.status, InjuryStatus::Inactive);
    assert_eq!(sub.record.real_days_out(), None);
  }

  #[test]
  fn clearance_ordering_is_enforced() {
    let c = catalog();
    let ctx = ctx("2025-10-30");

    let form = FollowUpForm { medical_clearance_date: Some(d("2025-10-20")), ..Default::default() };
    let sub = follow_up(&ctx, &c, observed(), &form);
    assert_eq!(sub.errors, [ValidationError::MedicalClearanceWhileNotActive]);

    let form = FollowUpForm { sports_clearance_date: Some(d("2025-10-20")), ..Default::default() };
    let sub = follow_up(&ctx, &c, record(), &form);
    assert_eq!(sub.errors, [ValidationError::SportsWithoutMedical]);
    assert_eq!(sub.record.status, InjuryStatus::Active);

    let form = FollowUpForm {
      medical_clearance_date: Some(d("2025-10-20")),
      sports_clearance_date: Some(d("2025-10-18")),
      ..Default::default()
    };
    let sub = follow_up(&ctx, &c, record(), &form);
    assert!(sub.errors.iter().any(|e| matches!(e, ValidationError::SportsBeforeMedical { .. })));

    let form = FollowUpForm { medical_clearance_date: Some(d("2025-09-20")), ..Default::default() };
    let sub = follow_up(&ctx, &c, record(), &form);
    assert!(!sub.is_valid());
  }

  #[test]
  fn clearance_before_activation_is_rejected() {
    let c = catalog();
    let ctx = ctx("2025-10-30");

    let form = FollowUpForm { observation_active_since: Some(d("2025-10-10")), ..Default::default() };
    let activated = follow_up(&ctx, &c, observed(), &form).record;
    assert_eq!(activated.status, InjuryStatus::Active);

    let form = FollowUpForm { medical_clearance_date: Some(d("2025-10-05")), ..Default::default() };
    let sub = follow_up(&ctx, &c, activated, &form);
    assert_eq!(sub.errors, [ValidationError::BeforeTimeLossStart {
      field: "fecha_alta_medica",
      date:  d("2025-10-05"),
      start: d("2025-10-10"),
    }]);
    assert_eq!(sub.record.medical_clearance_date, None);
    assert_eq!(sub.record.real_days_out(), None);

    let form = FollowUpForm {
      observation_active_since: Some(d("2025-10-10")),
      estimated_clearance_date: Some(d("2025-10-05")),
      ..Default::default()
    };
    let sub = follow_up(&ctx, &c, observed(), &form);
    assert_eq!(sub.errors, [ValidationError::BeforeTimeLossStart {
      field: "fecha_alta_diagnostico",
      date:  d("2025-10-05"),
      start: d("2025-10-10"),
    }]);
    assert_eq!(sub.record.estimated_clearance_date, None);
  }

  #[test]
  fn estimate_is_rejected_when_observation_closes() {
    let form = FollowUpForm {
      observation_inactive_since: Some(d("2025-10-10")),
      estimated_clearance_date: Some(d("2025-10-20")),
      ..Default::default()
    };
    let sub = follow_up(&ctx("2025-10-12"), &catalog(), observed(), &form);
    assert_eq!(sub.errors, [ValidationError::RecordClosed { field: "fecha_alta_diagnostico" }]);
    assert_eq!(sub.record.status, InjuryStatus::Inactive);
    assert_eq!(sub.record.estimated_clearance_date, None);
  }

  #[test]
  fn stored_clearance_cannot_change() {
    let mut r = record();
    r.medical_clearance_date = Some(d("2025-10-20"));
    let form = FollowUpForm { medical_clearance_date: Some(d("2025-10-22")), ..Default::default() };
    let sub = follow_up(&ctx("2025-10-30"), &catalog(), r, &form);
    assert_eq!(sub.errors, [ValidationError::AlreadyRecorded { field: "fecha_alta_medica" }]);
    assert_eq!(sub.record.medical_clearance_date, Some(d("2025-10-20")));
  }

  #[test]
  fn follow_up_appends_entry() {
    let form = FollowUpForm {
      add_follow_up: true,
      control_date: Some(d("2025-10-04")),
      applied_treatments: vec!["fisioterapia".into()],
      following_staff: Some("Fisio".into()),
      notes: Some("Mejor".into()),
      ..Default::default()
    };
    let sub = follow_up(&ctx("2025-10-04"), &catalog(), record(), &form);
    assert!(sub.is_valid());
    assert_eq!(sub.record.session_count(), 1);
    let entry = sub.record.evolution.last().unwrap();
    assert!(entry.applied_treatments.contains("FISIOTERAPIA"));
    assert_eq!(entry.recorded_by, "staff");
  }

  #[test]
  fn follow_up_requires_staff_and_skips_empty_entries() {
    let form = FollowUpForm { add_follow_up: true, ..Default::default() };
    let sub = follow_up(&ctx("2025-10-04"), &catalog(), record(), &form);
    assert_eq!(sub.errors, [ValidationError::FollowUpStaffRequired]);
    assert!(sub.record.evolution.is_empty());
  }

  #[test]
  fn closed_record_accepts_notes_only() {
    let mut r = record();
    r.medical_clearance_date = Some(d("2025-10-14"));
    r.sports_clearance_date = Some(d("2025-10-16"));
    r.status = InjuryStatus::Inactive;

    let sub = follow_up(&ctx("2025-10-20"), &catalog(), r.clone(), &FollowUpForm::default());
    assert!(sub.follow_up_disabled);

    let form = FollowUpForm {
      add_follow_up: true,
      following_staff: Some("Fisio".into()),
      notes: Some("Alta definitiva".into()),
      estimated_clearance_date: Some(d("2025-10-30")),
      ..Default::default()
    };
    let sub = follow_up(&ctx("2025-10-20"), &catalog(), r, &form);
    assert!(!sub.follow_up_disabled);
    assert_eq!(sub.errors, [ValidationError::RecordClosed { field: "fecha_alta_diagnostico" }]);
    assert_eq!(sub.record.session_count(), 1);
    assert_eq!(sub.record.status, InjuryStatus::Inactive);
  }

  #[test]
  fn control_date_before_injury_is_rejected() {
    let form = FollowUpForm {
      add_follow_up: true,
      control_date: Some(d("2025-09-30")),
      following_staff: Some("Fisio".into()),
      ..Default::default()
    };
    let sub = follow_up(&ctx("2025-10-04"), &catalog(), record(), &form);
    assert!(matches!(
      sub.errors.as_slice(),
      [ValidationError::BeforeInjuryDate { field: "fecha_control", .. }]
    ));
  }
}
