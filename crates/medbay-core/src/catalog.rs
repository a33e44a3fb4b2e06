//! Reference data: the lookup tables every injury form is built from.
//!
//! A [`Catalog`] is loaded once per request from the store and never mutated
//! by the derivation or lifecycle code. The body taxonomy is hierarchical
//! (segment → zone → structure) and injury types are constrained by the
//! mechanism that produced them.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::injury::RecurrenceType;

// ─── Entries ─────────────────────────────────────────────────────────────────

/// A flat `{id, nombre}` lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub id:   i64,
  #[serde(rename = "nombre")]
  pub name: String,
}

/// A body zone; belongs to exactly one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
  pub id:         i64,
  #[serde(rename = "nombre")]
  pub name:       String,
  #[serde(rename = "segmento_id")]
  pub segment_id: i64,
}

/// A specific anatomical structure; belongs to exactly one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
  pub id:      i64,
  #[serde(rename = "nombre")]
  pub name:    String,
  #[serde(rename = "zona_id")]
  pub zone_id: i64,
}

/// An injury subtype; belongs to exactly one injury type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtype {
  pub id:             i64,
  #[serde(rename = "nombre")]
  pub name:           String,
  #[serde(rename = "tipo_lesion_id")]
  pub injury_type_id: i64,
}

/// One allowed (mechanism, injury type) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismType {
  #[serde(rename = "mecanismo_id")]
  pub mechanism_id:   i64,
  #[serde(rename = "tipo_lesion_id")]
  pub injury_type_id: i64,
}

/// One allowed (mechanism, injury type, subtype) triple. A pair with no
/// triples has no applicable subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeCompatibility {
  #[serde(rename = "mecanismo_id")]
  pub mechanism_id:   i64,
  #[serde(rename = "tipo_lesion_id")]
  pub injury_type_id: i64,
  #[serde(rename = "tipo_especifico_id")]
  pub subtype_id:     i64,
}

/// A severity bucket keyed on days out of play. Both bounds are inclusive; a
/// missing `max_days` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRange {
  #[serde(rename = "nombre")]
  pub label:    String,
  #[serde(rename = "dias_min")]
  pub min_days: Option<i64>,
  #[serde(rename = "dias_max")]
  pub max_days: Option<i64>,
}

// ─── References held by records ──────────────────────────────────────────────

/// A catalog value as stored on an injury record. `id` is `None` for values
/// that came from legacy data and match no current catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
  pub id:   Option<i64>,
  pub name: String,
}

impl CatalogRef {
  pub fn new(id: i64, name: impl Into<String>) -> Self {
    Self { id: Some(id), name: name.into() }
  }

  /// A reference with no catalog row behind it.
  pub fn unlinked(name: impl Into<String>) -> Self {
    Self { id: None, name: name.into() }
  }
}

impl From<&CatalogEntry> for CatalogRef {
  fn from(e: &CatalogEntry) -> Self { Self::new(e.id, e.name.clone()) }
}

impl From<&Zone> for CatalogRef {
  fn from(z: &Zone) -> Self { Self::new(z.id, z.name.clone()) }
}

impl From<&Structure> for CatalogRef {
  fn from(s: &Structure) -> Self { Self::new(s.id, s.name.clone()) }
}

impl From<&Subtype> for CatalogRef {
  fn from(s: &Subtype) -> Self { Self::new(s.id, s.name.clone()) }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Every lookup table, as loaded from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
  #[serde(rename = "lugares")]
  pub places:                Vec<CatalogEntry>,
  #[serde(rename = "segmentos")]
  pub segments:              Vec<CatalogEntry>,
  #[serde(rename = "zonas")]
  pub zones:                 Vec<Zone>,
  #[serde(rename = "estructuras")]
  pub structures:            Vec<Structure>,
  #[serde(rename = "mecanismos")]
  pub mechanisms:            Vec<CatalogEntry>,
  #[serde(rename = "tipos_lesion")]
  pub injury_types:          Vec<CatalogEntry>,
  #[serde(rename = "mecanismo_tipo_lesion")]
  pub mechanism_types:       Vec<MechanismType>,
  #[serde(rename = "tipos_especificos")]
  pub subtypes:              Vec<Subtype>,
  #[serde(rename = "compatibilidad_subtipos")]
  pub subtype_compatibility: Vec<SubtypeCompatibility>,
  #[serde(rename = "tratamientos")]
  pub treatments:            Vec<CatalogEntry>,
  #[serde(rename = "gravedad")]
  pub severity_ranges:       Vec<SeverityRange>,
}

/// Case- and whitespace-insensitive name comparison used for every lookup.
pub fn same_name(a: &str, b: &str) -> bool {
  a.trim().to_uppercase() == b.trim().to_uppercase()
}

fn find<'a, T>(
  items: &'a [T],
  name: &str,
  name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
  items.iter().find(|item| same_name(name_of(item), name))
}

impl Catalog {
  pub fn place(&self, name: &str) -> Option<&CatalogEntry> {
    find(&self.places, name, |e| &e.name)
  }

  pub fn segment(&self, name: &str) -> Option<&CatalogEntry> {
    find(&self.segments, name, |e| &e.name)
  }

  pub fn zone(&self, name: &str) -> Option<&Zone> {
    find(&self.zones, name, |z| &z.name)
  }

  pub fn structure(&self, name: &str) -> Option<&Structure> {
    find(&self.structures, name, |s| &s.name)
  }

  pub fn mechanism(&self, name: &str) -> Option<&CatalogEntry> {
    find(&self.mechanisms, name, |e| &e.name)
  }

  pub fn injury_type(&self, name: &str) -> Option<&CatalogEntry> {
    find(&self.injury_types, name, |e| &e.name)
  }

  pub fn subtype(&self, name: &str) -> Option<&Subtype> {
    find(&self.subtypes, name, |s| &s.name)
  }

  pub fn segment_by_id(&self, id: i64) -> Option<&CatalogEntry> {
    self.segments.iter().find(|s| s.id == id)
  }

  /// Zones selectable once `segment_id` is chosen.
  pub fn zones_for_segment(&self, segment_id: i64) -> Vec<&Zone> {
    self.zones.iter().filter(|z| z.segment_id == segment_id).collect()
  }

  /// Structures selectable once `zone_id` is chosen.
  pub fn structures_for_zone(&self, zone_id: i64) -> Vec<&Structure> {
    self.structures.iter().filter(|s| s.zone_id == zone_id).collect()
  }

  /// Injury types compatible with `mechanism_id`, in catalog order.
  pub fn types_for_mechanism(&self, mechanism_id: i64) -> Vec<&CatalogEntry> {
    self
      .injury_types
      .iter()
      .filter(|t| {
        self.mechanism_types.iter().any(|mt| {
          mt.mechanism_id == mechanism_id && mt.injury_type_id == t.id
        })
      })
      .collect()
  }

  /// Subtypes compatible with the (mechanism, type) pair. Empty means the
  /// subtype selector only offers the not-applicable sentinel.
  pub fn subtypes_for(&self, mechanism_id: i64, injury_type_id: i64) -> Vec<&Subtype> {
    self
      .subtypes
      .iter()
      .filter(|s| {
        self.subtype_compatibility.iter().any(|c| {
          c.mechanism_id == mechanism_id
            && c.injury_type_id == injury_type_id
            && c.subtype_id == s.id
        })
      })
      .collect()
  }

  /// Recurrence classifications offered when an injury is a recurrence.
  pub fn recurrence_types(&self) -> Vec<RecurrenceType> { RecurrenceType::iter().collect() }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;

  fn entry(id: i64, name: &str) -> CatalogEntry {
    CatalogEntry { id, name: name.into() }
  }

  /// A reduced catalog with the shape of the seeded reference data.
  pub fn catalog() -> Catalog {
    Catalog {
      places:                vec![entry(1, "ENTRENAMIENTO"), entry(2, "PARTIDO")],
      segments:              vec![entry(1, "TREN SUPERIOR"), entry(3, "TREN INFERIOR")],
      zones:                 vec![
        Zone { id: 1, name: "HOMBRO".into(), segment_id: 1 },
        Zone { id: 12, name: "MUSLO".into(), segment_id: 3 },
        Zone { id: 14, name: "RODILLA".into(), segment_id: 3 },
      ],
      structures:            vec![
        Structure { id: 1, name: "ISQUIOTIBIALES".into(), zone_id: 12 },
        Structure { id: 2, name: "LCA".into(), zone_id: 14 },
        Structure { id: 3, name: "MENISCO INTERNO".into(), zone_id: 14 },
      ],
      mechanisms:            vec![
        entry(1, "SIN CONTACTO"),
        entry(3, "SOBRECARGA"),
      ],
      injury_types:          vec![entry(1, "MUSCULAR"), entry(3, "LIGAMENTARIA")],
      mechanism_types:       vec![
        MechanismType { mechanism_id: 1, injury_type_id: 1 },
        MechanismType { mechanism_id: 1, injury_type_id: 3 },
        MechanismType { mechanism_id: 3, injury_type_id: 1 },
      ],
      subtypes:              vec![
        Subtype { id: 1, name: "DISTENSIÓN".into(), injury_type_id: 1 },
        Subtype { id: 2, name: "ROTURA FIBRILAR".into(), injury_type_id: 1 },
        Subtype { id: 6, name: "ESGUINCE".into(), injury_type_id: 3 },
      ],
      // SOBRECARGA + MUSCULAR is excluded: no triples for (3, 1).
      subtype_compatibility: vec![
        SubtypeCompatibility { mechanism_id: 1, injury_type_id: 1, subtype_id: 1 },
        SubtypeCompatibility { mechanism_id: 1, injury_type_id: 1, subtype_id: 2 },
        SubtypeCompatibility { mechanism_id: 1, injury_type_id: 3, subtype_id: 6 },
      ],
      treatments:            vec![entry(1, "CRIOTERAPIA"), entry(2, "FISIOTERAPIA")],
      severity_ranges:       vec![
        SeverityRange { label: "LEVE".into(), min_days: Some(1), max_days: Some(3) },
        SeverityRange { label: "MODERADA".into(), min_days: Some(4), max_days: Some(7) },
        SeverityRange { label: "GRAVE".into(), min_days: Some(8), max_days: Some(28) },
        SeverityRange { label: "MUY GRAVE".into(), min_days: Some(29), max_days: None },
      ],
    }
  }
}
