//! Catalog linking for imported records.
//!
//! Lines carry catalog values by name, sometimes with stale or missing ids.
//! Linking replaces each reference whose name is found in the catalog with
//! the catalog's own id and spelling, and fills derived values the line left
//! out.

use medbay_core::{
  catalog::{Catalog, CatalogRef},
  derive,
  injury::InjuryRecord,
};

fn relink(r: &mut CatalogRef, found: Option<CatalogRef>) {
  match found {
    Some(found) => *r = found,
    None if r.id.is_some() => {
      tracing::debug!(name = %r.name, "catalog value not found; keeping stored id");
    }
    None => {}
  }
}

fn relink_opt(r: &mut Option<CatalogRef>, found: impl FnOnce(&str) -> Option<CatalogRef>) {
  if let Some(r) = r {
    let hit = found(&r.name);
    relink(r, hit);
  }
}

/// Link `record` against `catalog` and fill missing derived values.
pub fn link(record: &mut InjuryRecord, catalog: &Catalog) {
  let c = &mut record.classification;

  let hit = catalog.segment(&c.segment.name).map(CatalogRef::from);
  relink(&mut c.segment, hit);
  let hit = catalog.zone(&c.body_zone.name).map(CatalogRef::from);
  relink(&mut c.body_zone, hit);
  let hit = catalog.mechanism(&c.mechanism.name).map(CatalogRef::from);
  relink(&mut c.mechanism, hit);
  let hit = catalog.injury_type(&c.injury_type.name).map(CatalogRef::from);
  relink(&mut c.injury_type, hit);
  relink_opt(&mut c.place, |n| catalog.place(n).map(CatalogRef::from));
  relink_opt(&mut c.specific_structure, |n| catalog.structure(n).map(CatalogRef::from));
  relink_opt(&mut c.injury_subtype, |n| catalog.subtype(n).map(CatalogRef::from));

  if record.estimated_days_out.is_none() {
    record.estimated_days_out =
      derive::estimated_days_out(record.time_loss_start(), record.estimated_clearance_date);
  }

  if record.severity.is_none() {
    record.severity =
      derive::classify_severity(record.effective_days_out(), &catalog.severity_ranges)
        .map(str::to_owned);
  }
}
