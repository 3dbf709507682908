//! Ordered block-keyed schedules (bomb delays, block rewards, pinned hashes).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value keyed by the block at which it takes effect.
///
/// Entries are kept sorted by activation block so that cumulative sums and
/// "latest active" lookups are deterministic. Serialized as a list of
/// `{ block, value }` entries since TOML tables cannot have integer keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<ScheduleEntry<V>>",
    into = "Vec<ScheduleEntry<V>>",
    bound(
        serialize = "V: Clone + Serialize",
        deserialize = "V: Deserialize<'de>"
    )
)]
pub struct ActivationSchedule<V> {
    entries: BTreeMap<u64, V>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleEntry<V> {
    pub block: u64,
    pub value: V,
}

impl<V> ActivationSchedule<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the value activating at `block`.
    pub fn insert(&mut self, block: u64, value: V) -> Option<V> {
        self.entries.insert(block, value)
    }

    pub fn with(mut self, block: u64, value: V) -> Self {
        self.entries.insert(block, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The value activating exactly at `block`.
    pub fn get(&self, block: u64) -> Option<&V> {
        self.entries.get(&block)
    }

    /// The most recent value whose activation block is `<= block`.
    pub fn active_at(&self, block: u64) -> Option<&V> {
        self.entries.range(..=block).next_back().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

impl ActivationSchedule<u64> {
    /// Sum of every value whose activation block is `<= block`, or `None`
    /// if the sum does not fit in a `u64`.
    pub fn cumulative_up_to(&self, block: u64) -> Option<u64> {
        self.entries
            .range(..=block)
            .try_fold(0u64, |acc, (_, v)| acc.checked_add(*v))
    }
}

impl<V> From<Vec<ScheduleEntry<V>>> for ActivationSchedule<V> {
    fn from(list: Vec<ScheduleEntry<V>>) -> Self {
        Self {
            entries: list.into_iter().map(|e| (e.block, e.value)).collect(),
        }
    }
}

impl<V> From<ActivationSchedule<V>> for Vec<ScheduleEntry<V>> {
    fn from(schedule: ActivationSchedule<V>) -> Self {
        schedule
            .entries
            .into_iter()
            .map(|(block, value)| ScheduleEntry { block, value })
            .collect()
    }
}

impl<V> FromIterator<(u64, V)> for ActivationSchedule<V> {
    fn from_iter<I: IntoIterator<Item = (u64, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delays() -> ActivationSchedule<u64> {
        ActivationSchedule::new()
            .with(4_370_000, 3_000_000)
            .with(7_280_000, 2_000_000)
            .with(9_200_000, 4_000_000)
    }

    #[test]
    fn cumulative_sums_only_activated_entries() {
        let s = delays();
        assert_eq!(s.cumulative_up_to(0), Some(0));
        assert_eq!(s.cumulative_up_to(4_369_999), Some(0));
        assert_eq!(s.cumulative_up_to(4_370_000), Some(3_000_000));
        assert_eq!(s.cumulative_up_to(7_280_000), Some(5_000_000));
        assert_eq!(s.cumulative_up_to(u64::MAX), Some(9_000_000));
    }

    #[test]
    fn cumulative_overflow_is_reported() {
        let s = ActivationSchedule::new()
            .with(1, u64::MAX)
            .with(2, 1);
        assert_eq!(s.cumulative_up_to(1), Some(u64::MAX));
        assert_eq!(s.cumulative_up_to(2), None);
    }

    #[test]
    fn active_at_returns_latest() {
        let s = delays();
        assert_eq!(s.active_at(1), None);
        assert_eq!(s.active_at(8_000_000), Some(&2_000_000));
        assert_eq!(s.get(7_280_000), Some(&2_000_000));
        assert_eq!(s.get(7_280_001), None);
    }

    #[test]
    fn entries_stay_sorted_regardless_of_insert_order() {
        let s: ActivationSchedule<u64> = vec![(30, 3), (10, 1), (20, 2)].into_iter().collect();
        let blocks: Vec<u64> = s.iter().map(|(b, _)| b).collect();
        assert_eq!(blocks, vec![10, 20, 30]);
        assert_eq!(s.len(), 3);
    }
}
