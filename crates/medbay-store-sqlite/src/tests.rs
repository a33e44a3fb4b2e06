//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use medbay_core::{
  injury::{InjuryRecord, InjuryStatus},
  lifecycle::{self, FollowUpForm, NewInjuryForm, PriorInjuries, SessionContext},
  roster::{Player, Position, Squad},
  store::{InjuryQuery, InjuryStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn d(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

fn ctx(today: &str) -> SessionContext {
  SessionContext::at("medico", d(today).and_hms_opt(12, 0, 0).unwrap().and_utc())
}

fn player(id: &str, first: &str, last: &str, position: Position, squad: &str) -> Player {
  Player {
    player_id:  id.into(),
    first_name: first.into(),
    last_name:  last.into(),
    position:   Some(position),
    squad:      Some(squad.into()),
    active:     true,
  }
}

fn ana() -> Player { player("P1", "Ana", "Gómez", Position::Defender, "A") }

fn thigh_strain(date: &str, clearance: Option<&str>) -> NewInjuryForm {
  NewInjuryForm {
    injury_date: Some(d(date)),
    place: Some("ENTRENAMIENTO".into()),
    segment: Some("TREN INFERIOR".into()),
    body_zone: Some("MUSLO".into()),
    specific_structure: Some("ISQUIOTIBIALES".into()),
    mechanism: Some("SIN CONTACTO".into()),
    injury_type: Some("MUSCULAR".into()),
    injury_subtype: Some("DISTENSIÓN".into()),
    estimated_clearance_date: clearance.map(d),
    treatment_types: vec!["CRIOTERAPIA".into()],
    reporting_staff: Some("Dra. López".into()),
    ..Default::default()
  }
}

/// Register an injury the way the HTTP layer does: look up the player's last
/// id and history, run the controller, insert.
async fn register(s: &SqliteStore, p: &Player, form: &NewInjuryForm, today: &str) -> InjuryRecord {
  let catalog = s.catalog().await.unwrap();
  let last = s.last_injury_id(p.player_id.clone()).await.unwrap();
  let history = s.injuries_for_player(p.player_id.clone()).await.unwrap();
  let prior = PriorInjuries { last_injury_id: last.as_deref(), records: &history };
  let record = lifecycle::create(&ctx(today), &catalog, p, prior, form)
    .into_result()
    .expect("valid form");
  s.insert_injury(record).await.unwrap()
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_is_seeded() {
  let s = store().await;
  let c = s.catalog().await.unwrap();

  assert_eq!(c.segments.len(), 3);
  assert_eq!(c.places.len(), 4);
  assert_eq!(c.treatments.len(), 10);
  assert_eq!(c.severity_ranges.len(), 4);
  assert_eq!(c.severity_ranges[3].max_days, None);

  let lower = c.segment("TREN INFERIOR").unwrap();
  let zones: Vec<_> = c.zones_for_segment(lower.id).iter().map(|z| z.name.clone()).collect();
  assert_eq!(zones, ["MUSLO", "PIERNA", "RODILLA", "TOBILLO", "PIE"]);

  let knee = c.zone("RODILLA").unwrap();
  assert_eq!(c.structures_for_zone(knee.id).len(), 5);
}

#[tokio::test]
async fn subtype_compatibility_excludes_clinical_pairs() {
  let s = store().await;
  let c = s.catalog().await.unwrap();
  let id = |name: &str| c.mechanism(name).unwrap().id;
  let ty = |name: &str| c.injury_type(name).unwrap().id;

  assert_eq!(c.subtypes_for(id("SIN CONTACTO"), ty("MUSCULAR")).len(), 3);
  assert!(c.subtypes_for(id("SOBRECARGA"), ty("MUSCULAR")).is_empty());
  assert!(c.subtypes_for(id("MICROTRAUMA REPETITIVO"), ty("ÓSEA")).is_empty());
  assert!(c.subtypes_for(id("DESCONOCIDO"), ty("OTRAS")).is_empty());

  let overload: Vec<_> =
    c.types_for_mechanism(id("SOBRECARGA")).iter().map(|t| t.name.clone()).collect();
  assert_eq!(overload, ["MUSCULAR", "TENDINOSA"]);
}

// ─── Roster ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_squad_renames_by_code() {
  let s = store().await;
  let first = s.upsert_squad(Squad { id: 0, name: "Primera".into(), code: "A".into() }).await.unwrap();
  let renamed = s.upsert_squad(Squad { id: 0, name: "Primer equipo".into(), code: "A".into() }).await.unwrap();
  assert_eq!(first.id, renamed.id);

  let squads = s.list_squads().await.unwrap();
  assert_eq!(squads.len(), 1);
  assert_eq!(squads[0].name, "Primer equipo");
}

#[tokio::test]
async fn list_players_filters_by_squad_and_position() {
  let s = store().await;
  s.upsert_player(ana()).await.unwrap();
  s.upsert_player(player("P2", "Bea", "Ruiz", Position::Forward, "A")).await.unwrap();
  s.upsert_player(player("P3", "Carla", "Díaz", Position::Defender, "B")).await.unwrap();

  assert_eq!(s.list_players(None, None).await.unwrap().len(), 3);
  assert_eq!(s.list_players(Some("A".into()), None).await.unwrap().len(), 2);

  let defenders = s.list_players(None, Some(Position::Defender)).await.unwrap();
  let ids: Vec<_> = defenders.iter().map(|p| p.player_id.as_str()).collect();
  assert_eq!(ids, ["P3", "P1"]);
}

#[tokio::test]
async fn upsert_player_replaces_fields() {
  let s = store().await;
  s.upsert_player(ana()).await.unwrap();
  let moved = Player { squad: Some("B".into()), active: false, ..ana() };
  s.upsert_player(moved.clone()).await.unwrap();

  assert_eq!(s.get_player("P1".into()).await.unwrap(), Some(moved));
  assert_eq!(s.get_player("missing".into()).await.unwrap(), None);
}

// ─── Injuries ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_reload_injury() {
  let s = store().await;
  s.upsert_player(ana()).await.unwrap();

  let stored = register(&s, &ana(), &thigh_strain("2025-10-01", Some("2025-10-15")), "2025-10-01").await;
  assert_eq!(stored.injury_id, "AG20251001-1");
  assert_eq!(stored.estimated_days_out, Some(14));
  assert_eq!(stored.severity.as_deref(), Some("GRAVE"));
  assert_eq!(stored.status, InjuryStatus::Active);

  let fetched = s.get_injury("AG20251001-1".into()).await.unwrap().unwrap();
  assert_eq!(fetched, stored);
}

#[tokio::test]
async fn injury_ids_continue_per_player() {
  let s = store().await;
  register(&s, &ana(), &thigh_strain("2025-09-01", None), "2025-10-01").await;
  let second = register(&s, &ana(), &thigh_strain("2025-10-01", None), "2025-10-02").await;
  assert_eq!(second.injury_id, "AG20251001-2");

  assert_eq!(s.last_injury_id("P1".into()).await.unwrap().as_deref(), Some("AG20251001-2"));
  assert_eq!(s.last_injury_id("P9".into()).await.unwrap(), None);

  let history: Vec<_> = s
    .injuries_for_player("P1".into())
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.injury_id)
    .collect();
  assert_eq!(history, ["AG20251001-2", "AG20250901-1"]);
}

#[tokio::test]
async fn duplicate_id_is_rejected() {
  let s = store().await;
  let stored = register(&s, &ana(), &thigh_strain("2025-10-01", None), "2025-10-01").await;
  let err = s.insert_injury(stored).await.unwrap_err();
  assert!(matches!(err, Error::Core(medbay_core::Error::DuplicateInjury(_))));
}

#[tokio::test]
async fn follow_ups_persist_in_order() {
  let s = store().await;
  let catalog = s.catalog().await.unwrap();
  let stored = register(&s, &ana(), &thigh_strain("2025-10-01", Some("2025-10-15")), "2025-10-01").await;

  let mut record = stored;
  for (day, note) in [("2025-10-03", "primera"), ("2025-10-08", "segunda")] {
    let form = FollowUpForm {
      add_follow_up: true,
      control_date: Some(d(day)),
      following_staff: Some("Fisio".into()),
      notes: Some(note.into()),
      ..Default::default()
    };
    let next = lifecycle::follow_up(&ctx(day), &catalog, record, &form).into_result().unwrap();
    record = s.update_lifecycle(next).await.unwrap();
  }

  let form = FollowUpForm {
    medical_clearance_date: Some(d("2025-10-16")),
    sports_clearance_date: Some(d("2025-10-18")),
    ..Default::default()
  };
  let closed = lifecycle::follow_up(&ctx("2025-10-18"), &catalog, record, &form).into_result().unwrap();
  s.update_lifecycle(closed.clone()).await.unwrap();

  let fetched = s.get_injury(closed.injury_id.clone()).await.unwrap().unwrap();
  assert_eq!(fetched, closed);
  assert_eq!(fetched.status, InjuryStatus::Inactive);
  assert_eq!(fetched.session_count(), 2);
  let notes: Vec<_> = fetched.evolution.entries().iter().filter_map(|e| e.notes.clone()).collect();
  assert_eq!(notes, ["primera", "segunda"]);
  assert_eq!(fetched.real_days_out(), Some(15));
}

#[tokio::test]
async fn update_of_missing_injury_fails() {
  let s = store().await;
  let stored = register(&s, &ana(), &thigh_strain("2025-10-01", None), "2025-10-01").await;
  let ghost = InjuryRecord { injury_id: "ZZ20250101-1".into(), ..stored };
  let err = s.update_lifecycle(ghost).await.unwrap_err();
  assert!(matches!(err, Error::Core(medbay_core::Error::InjuryNotFound(_))));
}

#[tokio::test]
async fn list_injuries_applies_query() {
  let s = store().await;
  let bea = player("P2", "Bea", "Ruiz", Position::Forward, "B");
  s.upsert_player(ana()).await.unwrap();
  s.upsert_player(bea.clone()).await.unwrap();

  register(&s, &ana(), &thigh_strain("2025-09-01", Some("2025-09-10")), "2025-10-01").await;
  register(&s, &ana(), &thigh_strain("2025-10-01", None), "2025-10-01").await;
  let mut knee = thigh_strain("2025-10-02", None);
  knee.body_zone = Some("RODILLA".into());
  knee.specific_structure = Some("LCA".into());
  knee.injury_type = Some("LIGAMENTARIA".into());
  knee.injury_subtype = Some("ESGUINCE".into());
  register(&s, &bea, &knee, "2025-10-02").await;

  let all = s.list_injuries(&InjuryQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert_eq!(all[0].player_id, "P2");

  let squad_a = InjuryQuery { squad: Some("A".into()), ..Default::default() };
  assert_eq!(s.list_injuries(&squad_a).await.unwrap().len(), 2);

  let active = InjuryQuery { status: Some(InjuryStatus::Active), ..Default::default() };
  assert_eq!(s.list_injuries(&active).await.unwrap().len(), 1);

  let ligament = InjuryQuery { injury_type: Some("ligamentaria".into()), ..Default::default() };
  assert_eq!(s.list_injuries(&ligament).await.unwrap()[0].player_id, "P2");

  let october = InjuryQuery { from: Some(d("2025-10-01")), limit: Some(1), ..Default::default() };
  let page = s.list_injuries(&october).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].injury_date, d("2025-10-02"));
}
