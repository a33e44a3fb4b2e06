//! Normalisation of older line formats into the canonical column names.
//!
//! Earlier exports used different keys for a few fields and wrote status
//! labels in any case. Everything is mapped onto the current names before
//! the line is decoded, so there is exactly one decode path.

use medbay_core::catalog::Catalog;
use serde_json::{Map, Value};

/// `(legacy key, canonical key)`. A legacy key only fills the canonical one
/// when the latter is absent or null.
const ALIASES: &[(&str, &str)] = &[
  ("mecanismo_lesion", "mecanismo"),
  ("gravedad", "impacto_dias_baja_estimado"),
  ("fecha_alta_lesion", "fecha_alta_medica"),
];

fn is_blank(v: Option<&Value>) -> bool {
  match v {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.trim().is_empty(),
    Some(_) => false,
  }
}

/// Rewrite `obj` in place to the canonical shape.
pub(crate) fn normalize(obj: &mut Map<String, Value>, catalog: &Catalog) {
  for (legacy, canonical) in ALIASES {
    if let Some(value) = obj.remove(*legacy)
      && is_blank(obj.get(*canonical))
    {
      obj.insert((*canonical).to_owned(), value);
    }
  }

  if let Some(Value::String(status)) = obj.get_mut("estado_lesion") {
    *status = status.trim().to_uppercase();
  }

  // Rows written before segments existed only carry the zone.
  if is_blank(obj.get("segmento"))
    && let Some(Value::String(zone)) = obj.get("zona_cuerpo")
    && let Some(segment) = catalog
      .zone(zone)
      .and_then(|z| catalog.segment_by_id(z.segment_id))
  {
    obj.insert("segmento".to_owned(), Value::String(segment.name.clone()));
    obj.insert("segmento_id".to_owned(), Value::from(segment.id));
  }
}
