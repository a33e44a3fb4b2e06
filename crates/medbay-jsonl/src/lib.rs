//! JSON-lines codec for medbay injury records.
//!
//! One record per line, keyed by the persisted column names. Decoding is
//! lenient: legacy key names are mapped onto the current ones, loosely typed
//! values are coerced, and catalog references are linked by name. Encoding
//! always writes the canonical shape. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use medbay_core::catalog::Catalog;
//! use medbay_jsonl::decode_many;
//!
//! let catalog = Catalog::default();
//! let input = "{\"id_lesion\":\"AG20250301-1\"}\n";
//! for (line, result) in decode_many(input, &catalog) {
//!   println!("line {line}: {}", result.is_ok());
//! }
//! ```

pub mod error;
mod legacy;
mod link;

pub use error::{Error, Result};
pub use link::link;
use medbay_core::{
  catalog::Catalog,
  injury::{InjuryRecord, InjuryRow},
};
use serde_json::Value;

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Decode a single line into a linked [`InjuryRecord`].
pub fn decode(line: &str, catalog: &Catalog) -> Result<InjuryRecord> {
  let Value::Object(mut obj) = serde_json::from_str::<Value>(line)? else {
    return Err(Error::NotAnObject);
  };
  legacy::normalize(&mut obj, catalog);

  let row: InjuryRow = serde_json::from_value(Value::Object(obj))?;
  let mut record = InjuryRecord::try_from(row)?;
  link::link(&mut record, catalog);
  Ok(record)
}

/// Decode every non-blank line of `input`.
///
/// Each entry pairs the 1-based line number with that line's result; a
/// malformed line yields `Err(…)` in its position without aborting the rest.
pub fn decode_many(input: &str, catalog: &Catalog) -> Vec<(usize, Result<InjuryRecord>)> {
  input
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(i, line)| (i + 1, decode(line, catalog)))
    .collect()
}

/// Encode `record` as one canonical line, without the trailing newline.
pub fn encode(record: &InjuryRecord) -> Result<String> {
  Ok(serde_json::to_string(record)?)
}

/// Encode `records` as a JSON-lines document, one record per line.
pub fn encode_many<'a>(records: impl IntoIterator<Item = &'a InjuryRecord>) -> Result<String> {
  let mut out = String::new();
  for record in records {
    out.push_str(&encode(record)?);
    out.push('\n');
  }
  Ok(out)
}

// ─── Round-trip test ─────────────────────────────────────────────────────────


// ─── Shared test helpers ──────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_helpers {
  use medbay_core::catalog::{
    Catalog, CatalogEntry, MechanismType, SeverityRange, Structure, Subtype, SubtypeCompatibility,
    Zone,
  };

  fn entry(id: i64, name: &str) -> CatalogEntry {
    CatalogEntry { id, name: name.into() }
  }

  /// A small catalog covering the thigh and knee.
  pub(crate) fn catalog() -> Catalog {
    Catalog {
      places: vec![entry(1, "ENTRENAMIENTO"), entry(2, "PARTIDO")],
      segments: vec![entry(1, "TREN SUPERIOR"), entry(3, "TREN INFERIOR")],
      zones: vec![
        Zone { id: 12, name: "MUSLO".into(), segment_id: 3 },
        Zone { id: 14, name: "RODILLA".into(), segment_id: 3 },
      ],
      structures: vec![Structure { id: 1, name: "ISQUIOTIBIALES".into(), zone_id: 12 }],
      mechanisms: vec![entry(1, "SIN CONTACTO")],
      injury_types: vec![entry(1, "MUSCULAR"), entry(3, "LIGAMENTARIA")],
      mechanism_types: vec![
        MechanismType { mechanism_id: 1, injury_type_id: 1 },
        MechanismType { mechanism_id: 1, injury_type_id: 3 },
      ],
      subtypes: vec![Subtype { id: 1, name: "DISTENSIÓN".into(), injury_type_id: 1 }],
      subtype_compatibility: vec![SubtypeCompatibility {
        mechanism_id:   1,
        injury_type_id: 1,
        subtype_id:     1,
      }],
      treatments: vec![entry(1, "CRIOTERAPIA"), entry(2, "FISIOTERAPIA")],
      severity_ranges: vec![
        SeverityRange { label: "LEVE".into(), min_days: Some(1), max_days: Some(3) },
        SeverityRange { label: "MODERADA".into(), min_days: Some(4), max_days: Some(7) },
        SeverityRange { label: "GRAVE".into(), min_days: Some(8), max_days: Some(28) },
        SeverityRange { label: "MUY GRAVE".into(), min_days: Some(29), max_days: None },
      ],
    }
  }
}
