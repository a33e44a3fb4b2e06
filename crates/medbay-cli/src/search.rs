//! Fuzzy player lookup.

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use medbay_core::roster::Player;

/// Players matching `query` by full name or id, best match first.
pub fn rank<'a>(players: &'a [Player], query: &str) -> Vec<&'a Player> {
  let matcher = SkimMatcherV2::default().ignore_case();
  let mut scored: Vec<(i64, &Player)> = players
    .iter()
    .filter_map(|p| {
      let by_name = matcher.fuzzy_match(&p.full_name(), query);
      let by_id = matcher.fuzzy_match(&p.player_id, query);
      by_name.max(by_id).map(|score| (score, p))
    })
    .collect();
  scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.last_name.cmp(&b.1.last_name)));
  scored.into_iter().map(|(_, p)| p).collect()
}
