//! Derived values: day counts, severity buckets, recurrence classes, injury
//! ids and treatment normalisation.
//!
//! Every function here is pure. Malformed input yields `None`, an empty set or
//! `false` rather than an error; historic rows carry inconsistent formats and
//! must never take a page down. Callers turn a `None` into a user-facing
//! validation message where one is warranted.

use std::collections::BTreeSet;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::{
  catalog::{SeverityRange, SubtypeCompatibility},
  injury::RecurrenceType,
};

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a date from display or storage text.
///
/// Accepts `YYYY-MM-DD`, an ISO datetime (the date part is kept),
/// `YYYY/MM/DD` and `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  let date_part = s.split(['T', ' ']).next().unwrap_or(s);
  ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"]
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a registration timestamp. RFC 3339 is preferred; naive ISO
/// datetimes and bare dates (as written by older versions) are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
    .map(|naive| naive.and_utc())
}

/// Anything a date can be read from.
pub trait DateLike {
  fn to_date(&self) -> Option<NaiveDate>;
}

impl DateLike for NaiveDate {
  fn to_date(&self) -> Option<NaiveDate> { Some(*self) }
}

impl DateLike for NaiveDateTime {
  fn to_date(&self) -> Option<NaiveDate> { Some(self.date()) }
}

impl DateLike for DateTime<Utc> {
  fn to_date(&self) -> Option<NaiveDate> { Some(self.date_naive()) }
}

impl DateLike for str {
  fn to_date(&self) -> Option<NaiveDate> { parse_date(self) }
}

impl DateLike for String {
  fn to_date(&self) -> Option<NaiveDate> { parse_date(self) }
}

impl<T: DateLike + ?Sized> DateLike for &T {
  fn to_date(&self) -> Option<NaiveDate> { (**self).to_date() }
}

impl<T: DateLike> DateLike for Option<T> {
  fn to_date(&self) -> Option<NaiveDate> { self.as_ref().and_then(T::to_date) }
}

/// Signed day count from `a` to `b`. A negative result is an ordering
/// violation for the caller to report; it is never clamped here.
pub fn days_between(a: impl DateLike, b: impl DateLike) -> Option<i64> {
  Some((b.to_date()? - a.to_date()?).num_days())
}

// ─── Severity ────────────────────────────────────────────────────────────────

/// First range whose inclusive bounds contain `days_out`.
pub fn classify_severity(days_out: Option<i64>, ranges: &[SeverityRange]) -> Option<&str> {
  let days = days_out?;
  ranges
    .iter()
    .find(|r| match (r.min_days, r.max_days) {
      (None, None) => false,
      (Some(min), None) => days >= min,
      (Some(min), Some(max)) => (min..=max).contains(&days),
      (None, Some(max)) => days <= max,
    })
    .map(|r| r.label.as_str())
}

/// Days out between the point time-loss starts and the estimated clearance.
/// `None` when either date is missing or the order is reversed.
pub fn estimated_days_out(start: NaiveDate, clearance: Option<NaiveDate>) -> Option<i64> {
  days_between(start, clearance?).filter(|d| *d >= 0)
}

// ─── Recurrence ──────────────────────────────────────────────────────────────

/// Classify a recurrence by the time elapsed since the previous clearance:
/// up to two months is early, up to twelve months late, anything beyond
/// remote. `None` when the new injury predates the clearance.
pub fn classify_recurrence(
  previous_clearance: NaiveDate,
  injury_date: NaiveDate,
) -> Option<RecurrenceType> {
  if injury_date < previous_clearance {
    return None;
  }
  let early_limit = previous_clearance.checked_add_months(Months::new(2))?;
  let late_limit = previous_clearance.checked_add_months(Months::new(12))?;
  Some(if injury_date <= early_limit {
    RecurrenceType::Early
  } else if injury_date <= late_limit {
    RecurrenceType::Late
  } else {
    RecurrenceType::Remote
  })
}

// ─── Subtypes ────────────────────────────────────────────────────────────────

/// Whether the (mechanism, type) pair has any compatible subtype. When it
/// does not, the subtype is fixed to the not-applicable sentinel.
pub fn is_subtype_eligible(
  mechanism_id: i64,
  injury_type_id: i64,
  table: &[SubtypeCompatibility],
) -> bool {
  table
    .iter()
    .any(|c| c.mechanism_id == mechanism_id && c.injury_type_id == injury_type_id)
}

// ─── Treatments ──────────────────────────────────────────────────────────────

/// Upper-cased, trimmed, de-duplicated treatment labels.
pub fn normalize_treatments<I, S>(items: I) -> BTreeSet<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  items
    .into_iter()
    .map(|s| s.as_ref().trim().to_uppercase())
    .filter(|s| !s.is_empty())
    .collect()
}

/// Normalise a stored treatment field: a JSON array, a JSON-encoded string,
/// or a bare label. Text that is not valid JSON is taken as one label.
pub fn normalize_treatment_list(raw: Option<&Value>) -> BTreeSet<String> {
  match raw {
    Some(Value::Array(items)) => normalize_treatments(items.iter().filter_map(scalar_text)),
    Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
      Ok(parsed @ (Value::Array(_) | Value::String(_))) => normalize_treatment_list(Some(&parsed)),
      _ => normalize_treatments([text]),
    },
    Some(other) => normalize_treatments(scalar_text(other)),
    None => BTreeSet::new(),
  }
}

fn scalar_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

// ─── Injury ids ──────────────────────────────────────────────────────────────

/// Build `<INITIALS><YYYYMMDD>-<N>`.
///
/// Initials are the first letter of every whitespace-separated token of the
/// player's name, falling back to the player id when the name is blank. `N`
/// continues the numeric suffix of the player's last injury id, or starts at
/// 1.
pub fn generate_injury_id(
  player_name: &str,
  player_id: &str,
  last_injury_id: Option<&str>,
  date: NaiveDate,
) -> String {
  let mut initials: String = player_name
    .split_whitespace()
    .filter_map(|token| token.chars().next())
    .flat_map(char::to_uppercase)
    .collect();
  if initials.is_empty() {
    initials = player_id.trim().to_uppercase();
  }

  let next = last_injury_id
    .and_then(|id| id.rsplit_once('-'))
    .map(|(_, suffix)| suffix)
    .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
    .and_then(|suffix| suffix.parse::<u32>().ok())
    .map_or(1, |n| n + 1);

  format!("{initials}{}-{next}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn date(s: &str) -> NaiveDate { parse_date(s).unwrap() }

  fn ranges() -> Vec<SeverityRange> {
    [("MILD", 1, Some(3)), ("MODERATE", 4, Some(7)), ("SEVERE", 8, Some(28)), ("VERY_SEVERE", 29, None)]
      .into_iter()
      .map(|(label, min, max)| SeverityRange {
        label:    label.into(),
        min_days: Some(min),
        max_days: max,
      })
      .collect()
  }

  #[test]
  fn parse_date_accepts_known_formats() {
    let expected = NaiveDate::from_ymd_opt(2025, 10, 13);
    assert_eq!(parse_date("2025-10-13"), expected);
    assert_eq!(parse_date("2025-10-13T08:30:00"), expected);
    assert_eq!(parse_date("2025/10/13"), expected);
    assert_eq!(parse_date("13/10/2025"), expected);
    assert_eq!(parse_date("mañana"), None);
    assert_eq!(parse_date("  "), None);
  }

  #[test]
  fn parse_timestamp_reads_naive_iso_as_utc() {
    let ts = parse_timestamp("2025-10-13T12:34:56.123456").unwrap();
    assert_eq!(ts.to_rfc3339(), "2025-10-13T12:34:56.123456+00:00");
    assert!(parse_timestamp("2025-10-13T12:34:56+02:00").is_some());
    assert!(parse_timestamp("yesterday").is_none());
  }

  #[test]
  fn days_between_keeps_sign() {
    assert_eq!(days_between("2025-10-01", "2025-10-05"), Some(4));
    assert_eq!(days_between("2025-10-05", "2025-10-01"), Some(-4));
    assert_eq!(days_between(date("2025-10-01"), "garbage"), None);
    assert_eq!(days_between(Some("2025-10-01"), None::<&str>), None);
  }

  #[test]
  fn severity_uses_inclusive_bounds() {
    let r = ranges();
    assert_eq!(classify_severity(Some(7), &r), Some("MODERATE"));
    assert_eq!(classify_severity(Some(8), &r), Some("SEVERE"));
    assert_eq!(classify_severity(Some(29), &r), Some("VERY_SEVERE"));
    assert_eq!(classify_severity(Some(400), &r), Some("VERY_SEVERE"));
    assert_eq!(classify_severity(Some(0), &r), None);
    assert_eq!(classify_severity(None, &r), None);
  }

  #[test]
  fn severity_skips_unbounded_ranges() {
    let mut r = ranges();
    r.insert(0, SeverityRange { label: "EMPTY".into(), min_days: None, max_days: None });
    assert_eq!(classify_severity(Some(2), &r), Some("MILD"));
  }

  #[test]
  fn estimated_days_out_rejects_reversed_dates() {
    assert_eq!(estimated_days_out(date("2025-10-01"), Some(date("2025-10-15"))), Some(14));
    assert_eq!(estimated_days_out(date("2025-10-15"), Some(date("2025-10-01"))), None);
    assert_eq!(estimated_days_out(date("2025-10-15"), None), None);
  }

  #[test]
  fn recurrence_is_classified_by_elapsed_months() {
    let cleared = date("2025-01-31");
    assert_eq!(classify_recurrence(cleared, date("2025-03-31")), Some(RecurrenceType::Early));
    assert_eq!(classify_recurrence(cleared, date("2025-04-01")), Some(RecurrenceType::Late));
    assert_eq!(classify_recurrence(cleared, date("2026-02-01")), Some(RecurrenceType::Remote));
    assert_eq!(classify_recurrence(cleared, date("2025-01-01")), None);
  }

  #[test]
  fn subtype_eligibility_follows_table() {
    let table = [SubtypeCompatibility { mechanism_id: 1, injury_type_id: 3, subtype_id: 6 }];
    assert!(is_subtype_eligible(1, 3, &table));
    assert!(!is_subtype_eligible(3, 1, &table));
  }

  #[test]
  fn treatments_from_json_text() {
    let set = normalize_treatment_list(Some(&json!("[\"FISIOTERAPIA\", \"REPOSO\"]")));
    assert_eq!(set, BTreeSet::from(["FISIOTERAPIA".to_owned(), "REPOSO".to_owned()]));
  }

  #[test]
  fn treatments_from_bare_and_malformed_text() {
    assert_eq!(normalize_treatment_list(Some(&json!("REPOSO"))), BTreeSet::from(["REPOSO".to_owned()]));
    assert_eq!(
      normalize_treatment_list(Some(&json!("[\"REPOSO\""))),
      BTreeSet::from(["[\"REPOSO\"".to_owned()])
    );
    assert!(normalize_treatment_list(None).is_empty());
    assert!(normalize_treatment_list(Some(&Value::Null)).is_empty());
  }

  #[test]
  fn treatments_are_deduplicated_and_upper_cased() {
    let raw = json!(["crioterapia", " CRIOTERAPIA ", "", "punción seca"]);
    let once = normalize_treatment_list(Some(&raw));
    assert_eq!(once, BTreeSet::from(["CRIOTERAPIA".to_owned(), "PUNCIÓN SECA".to_owned()]));
    assert_eq!(normalize_treatment_list(Some(&raw)), once);
  }

  #[test]
  fn injury_id_increments_suffix() {
    let d = date("2025-10-13");
    let first = generate_injury_id("Ana Gómez", "P1", None, d);
    assert_eq!(first, "AG20251013-1");
    assert_eq!(generate_injury_id("Ana Gómez", "P1", Some(&first), d), "AG20251013-2");
  }

  #[test]
  fn injury_id_restarts_on_unexpected_suffix() {
    let d = date("2025-10-13");
    assert_eq!(generate_injury_id("maría josé ruiz", "P2", Some("MJR20250101"), d), "MJR20251013-1");
    assert_eq!(generate_injury_id("  ", "p3", Some("X-9"), d), "P320251013-10");
  }
}
