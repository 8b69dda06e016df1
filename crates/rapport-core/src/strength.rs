//! Percentile ranking of contacts into relationship-strength tiers.
//!
//! Pure and total: any population, including contacts with empty
//! timelines, maps to exactly one tier per contact.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship-strength tier. Serialises to the literal strings `"HIGH"`,
/// `"MEDIUM"`, `"LOW"` exposed unmodified on the read path.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkStrength {
  High,
  Medium,
  #[default]
  Low,
}

/// Assign a tier to every contact from its interaction count.
///
/// Contacts are ranked by count descending (stable sort, so ties keep
/// their input order — not a contract, only the bands are). Position `i`
/// of `n` receives percentile `(n - i) / n`. A zero count is always
/// `Low` regardless of rank; above the 80th percentile is `High`; at or
/// below the 20th is `Low`; everything between is `Medium`.
pub fn rank(counts: &[(Uuid, usize)]) -> Vec<(Uuid, NetworkStrength)> {
  let n = counts.len();
  if n == 0 {
    return Vec::new();
  }

  let mut ordered: Vec<(Uuid, usize)> = counts.to_vec();
  ordered.sort_by(|a, b| b.1.cmp(&a.1));

  ordered
    .into_iter()
    .enumerate()
    .map(|(i, (contact_id, count))| {
      let percentile = (n - i) as f64 / n as f64;
      let tier = if count == 0 {
        NetworkStrength::Low
      } else if percentile > 0.8 {
        NetworkStrength::High
      } else if percentile <= 0.2 {
        NetworkStrength::Low
      } else {
        NetworkStrength::Medium
      };
      (contact_id, tier)
    })
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn ids(n: usize) -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() }

  #[test]
  fn empty_population_yields_nothing() {
    assert!(rank(&[]).is_empty());
  }

  #[test]
  fn single_contact_with_interactions_is_high() {
    let id = Uuid::new_v4();
    let tiers = rank(&[(id, 3)]);
    assert_eq!(tiers, vec![(id, NetworkStrength::High)]);
  }

  #[test]
  fn single_contact_without_interactions_is_low() {
    let id = Uuid::new_v4();
    let tiers = rank(&[(id, 0)]);
    assert_eq!(tiers, vec![(id, NetworkStrength::Low)]);
  }

  #[test]
  fn zero_count_is_low_even_in_a_high_band() {
    // Four zero-count contacts sit in positions whose percentiles would
    // otherwise be Medium or High.
    let ids = ids(5);
    let counts: Vec<(Uuid, usize)> =
      vec![(ids[0], 7), (ids[1], 0), (ids[2], 0), (ids[3], 0), (ids[4], 0)];

    let tiers: HashMap<Uuid, NetworkStrength> =
      rank(&counts).into_iter().collect();

    assert_eq!(tiers[&ids[0]], NetworkStrength::High);
    for id in &ids[1..] {
      assert_eq!(tiers[id], NetworkStrength::Low, "zero count must be Low");
    }
  }

  #[test]
  fn ten_contact_band_table() {
    // Counts 10,9,…,1: positions 0–1 High (p = 1.0, 0.9), positions 2–7
    // Medium (p = 0.8 … 0.3), positions 8–9 Low (p = 0.2, 0.1).
    let ids = ids(10);
    let counts: Vec<(Uuid, usize)> = ids
      .iter()
      .enumerate()
      .map(|(i, id)| (*id, 10 - i))
      .collect();

    let tiers: HashMap<Uuid, NetworkStrength> =
      rank(&counts).into_iter().collect();

    assert_eq!(tiers[&ids[0]], NetworkStrength::High);
    assert_eq!(tiers[&ids[1]], NetworkStrength::High);
    for id in &ids[2..8] {
      assert_eq!(tiers[id], NetworkStrength::Medium);
    }
    assert_eq!(tiers[&ids[8]], NetworkStrength::Low);
    assert_eq!(tiers[&ids[9]], NetworkStrength::Low);
  }

  #[test]
  fn every_contact_receives_exactly_one_tier() {
    let ids = ids(17);
    let counts: Vec<(Uuid, usize)> = ids
      .iter()
      .enumerate()
      .map(|(i, id)| (*id, i % 4))
      .collect();

    let tiers = rank(&counts);
    assert_eq!(tiers.len(), ids.len());

    let assigned: HashMap<Uuid, NetworkStrength> =
      tiers.into_iter().collect();
    for id in &ids {
      assert!(assigned.contains_key(id));
    }
  }

  #[test]
  fn ranking_is_deterministic() {
    let ids = ids(6);
    let counts: Vec<(Uuid, usize)> = ids
      .iter()
      .enumerate()
      .map(|(i, id)| (*id, i * 2))
      .collect();

    assert_eq!(rank(&counts), rank(&counts));
  }

  #[test]
  fn tier_strings_are_the_wire_contract() {
    assert_eq!(
      serde_json::to_string(&NetworkStrength::High).unwrap(),
      "\"HIGH\""
    );
    assert_eq!(
      serde_json::to_string(&NetworkStrength::Medium).unwrap(),
      "\"MEDIUM\""
    );
    assert_eq!(
      serde_json::to_string(&NetworkStrength::Low).unwrap(),
      "\"LOW\""
    );
  }
}
