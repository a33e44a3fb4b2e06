//! Aggregates over an already-loaded collection of injury records.
//!
//! Nothing here reads storage. Callers narrow the collection with a
//! [`RecordFilter`] and then ask for a [`Summary`], period [`Trends`] or a
//! categorical [`distribution`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike as _, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  injury::{InjuryRecord, InjuryStatus},
  roster::Position,
};

fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

/// `count / total` as a percentage with one decimal; 0 for an empty total.
fn share(count: usize, total: usize) -> f64 {
  if total == 0 { 0.0 } else { round_to(count as f64 / total as f64 * 100.0, 1) }
}

fn mean(values: impl IntoIterator<Item = i64>) -> Option<f64> {
  let (sum, n) = values.into_iter().fold((0i64, 0usize), |(s, n), v| (s + v, n + 1));
  (n > 0).then(|| sum as f64 / n as f64)
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// In-memory narrowing applied before aggregation.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
  /// Player ids of the selected squad; `None` keeps every player.
  pub players:     Option<BTreeSet<String>>,
  pub position:    Option<Position>,
  pub injury_type: Option<String>,
  pub from:        Option<NaiveDate>,
  pub to:          Option<NaiveDate>,
}

impl RecordFilter {
  pub fn matches(&self, r: &InjuryRecord) -> bool {
    self.players.as_ref().is_none_or(|ids| ids.contains(&r.player_id))
      && self.position.is_none_or(|p| r.position == Some(p))
      && self
        .injury_type
        .as_deref()
        .is_none_or(|t| crate::catalog::same_name(t, &r.classification.injury_type.name))
      && self.from.is_none_or(|from| r.injury_date >= from)
      && self.to.is_none_or(|to| r.injury_date <= to)
  }

  pub fn apply<'a>(&self, records: &'a [InjuryRecord]) -> Vec<&'a InjuryRecord> {
    records.iter().filter(|r| self.matches(r)).collect()
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCount {
  pub zone:  String,
  pub count: usize,
  /// Percentage of all records.
  pub share: f64,
}

/// Headline metrics for a set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub total:            usize,
  pub active_count:     usize,
  pub active_share:     f64,
  /// Mean days out over records that have a figure, one decimal.
  pub average_days_out: Option<f64>,
  pub top_zone:         Option<ZoneCount>,
  pub recurrence_count: usize,
  pub recurrence_share: f64,
}

/// The most frequent body zone. Ties go to the alphabetically first name.
pub fn most_affected_zone<'a>(records: impl IntoIterator<Item = &'a InjuryRecord>) -> Option<(String, usize)> {
  let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
  for r in records {
    *counts.entry(r.classification.body_zone.name.as_str()).or_default() += 1;
  }
  counts
    .into_iter()
    .fold(None, |best: Option<(&str, usize)>, (zone, n)| match best {
      Some((_, m)) if m >= n => best,
      _ => Some((zone, n)),
    })
    .map(|(zone, n)| (zone.to_owned(), n))
}

pub fn summarize(records: &[&InjuryRecord]) -> Summary {
  let total = records.len();
  let active_count = records.iter().filter(|r| r.status == InjuryStatus::Active).count();
  let recurrence_count = records.iter().filter(|r| r.is_recurrence).count();
  let top_zone = most_affected_zone(records.iter().copied()).map(|(zone, count)| ZoneCount {
    zone,
    count,
    share: share(count, total),
  });

  Summary {
    total,
    active_count,
    active_share: share(active_count, total),
    average_days_out: mean(records.iter().filter_map(|r| r.effective_days_out()))
      .map(|m| round_to(m, 1)),
    top_zone,
    recurrence_count,
    recurrence_share: share(recurrence_count, total),
  }
}

// ─── Trends ──────────────────────────────────────────────────────────────────

/// Bucket size for period series.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Period {
  /// ISO week.
  #[default]
  Week,
  /// Calendar month.
  Month,
}

impl Period {
  /// Sortable bucket key and its label, e.g. `2025-W41` or `2025-10`.
  pub fn bucket(self, date: NaiveDate) -> ((i32, u32), String) {
    match self {
      Self::Week => {
        let w = date.iso_week();
        ((w.year(), w.week()), format!("{}-W{:02}", w.year(), w.week()))
      }
      Self::Month => ((date.year(), date.month()), format!("{}-{:02}", date.year(), date.month())),
    }
  }

  /// Length of the recent window ending at the latest injury.
  pub fn window(self) -> Duration {
    match self {
      Self::Week => Duration::days(7),
      Self::Month => Duration::days(30),
    }
  }
}

/// Period-over-period change of the last two values:
/// `(last − prev) / prev × 100`, one decimal. Zero with fewer than two
/// values or a zero denominator.
pub fn delta(values: &[f64]) -> f64 {
  match values {
    [.., prev, last] if *prev != 0.0 => round_to((last - prev) / prev * 100.0, 1),
    _ => 0.0,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub period:           String,
  pub total:            usize,
  pub active:           usize,
  /// Mean days out in the period, two decimals; 0 when none is known.
  pub average_days_out: f64,
  /// Records in the overall most affected zone.
  pub top_zone_count:   usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendDeltas {
  pub total:            f64,
  pub active:           f64,
  pub average_days_out: f64,
  pub top_zone_count:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trends {
  pub period:   Period,
  pub top_zone: Option<String>,
  pub points:   Vec<TrendPoint>,
  pub deltas:   TrendDeltas,
}

pub fn trends(records: &[&InjuryRecord], period: Period) -> Trends {
  let top_zone = most_affected_zone(records.iter().copied()).map(|(zone, _)| zone);

  let mut buckets: BTreeMap<(i32, u32), (String, Vec<&InjuryRecord>)> = BTreeMap::new();
  for r in records {
    let (key, label) = period.bucket(r.injury_date);
    buckets.entry(key).or_insert_with(|| (label, Vec::new())).1.push(*r);
  }

  let points: Vec<TrendPoint> = buckets
    .into_values()
    .map(|(label, rs)| TrendPoint {
      period:           label,
      total:            rs.len(),
      active:           rs.iter().filter(|r| r.status == InjuryStatus::Active).count(),
      average_days_out: mean(rs.iter().filter_map(|r| r.effective_days_out()))
        .map_or(0.0, |m| round_to(m, 2)),
      top_zone_count:   rs
        .iter()
        .filter(|r| top_zone.as_deref() == Some(r.classification.body_zone.name.as_str()))
        .count(),
    })
    .collect();

  let series = |f: fn(&TrendPoint) -> f64| delta(&points.iter().map(f).collect::<Vec<_>>());
  let deltas = TrendDeltas {
    total:            series(|p| p.total as f64),
    active:           series(|p| p.active as f64),
    average_days_out: series(|p| p.average_days_out),
    top_zone_count:   series(|p| p.top_zone_count as f64),
  };

  Trends { period, top_zone, points, deltas }
}

/// Records whose injury date falls within the period's window of the latest
/// injury date.
pub fn recent<'a>(records: &[&'a InjuryRecord], period: Period) -> Vec<&'a InjuryRecord> {
  let Some(latest) = records.iter().map(|r| r.injury_date).max() else {
    return Vec::new();
  };
  let cutoff = latest - period.window();
  records.iter().copied().filter(|r| r.injury_date >= cutoff).collect()
}

// ─── Distributions ───────────────────────────────────────────────────────────

/// Categorical axis for a distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  Zone,
  InjuryType,
  Mechanism,
  Place,
  Severity,
  /// Each treatment of a record counts once.
  Treatment,
  Recurrence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
  pub label: String,
  pub count: usize,
  /// Percentage of all counted values.
  pub share: f64,
}

const UNSPECIFIED: &str = "SIN DATO";

fn labels(r: &InjuryRecord, dimension: Dimension) -> Vec<String> {
  let c = &r.classification;
  match dimension {
    Dimension::Zone => vec![c.body_zone.name.clone()],
    Dimension::InjuryType => vec![c.injury_type.name.clone()],
    Dimension::Mechanism => vec![c.mechanism.name.clone()],
    Dimension::Place => vec![c.place.as_ref().map_or(UNSPECIFIED, |p| p.name.as_str()).to_owned()],
    Dimension::Severity => vec![r.severity.clone().unwrap_or_else(|| UNSPECIFIED.to_owned())],
    Dimension::Treatment => r.treatment_types.iter().cloned().collect(),
    Dimension::Recurrence => {
      vec![if r.is_recurrence { "RECIDIVA" } else { "NUEVA" }.to_owned()]
    }
  }
}

/// Counts per label, most frequent first; ties in label order.
pub fn distribution(records: &[&InjuryRecord], dimension: Dimension) -> Vec<Bucket> {
  let mut counts: BTreeMap<String, usize> = BTreeMap::new();
  for r in records {
    for label in labels(r, dimension) {
      *counts.entry(label).or_default() += 1;
    }
  }
  let total: usize = counts.values().sum();
  let mut buckets: Vec<Bucket> = counts
    .into_iter()
    .map(|(label, count)| Bucket { label, count, share: share(count, total) })
    .collect();
  buckets.sort_by(|a, b| b.count.cmp(&a.count));
  buckets
}
