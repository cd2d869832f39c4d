//! Gathering throughput — team power and fractional yield accumulation.
//!
//! Yields accrue as real-valued counters per item; only whole units are
//! ever handed out, and the fractional remainder carries to the next tick.
//! Nothing rounds up early and nothing is lost to truncation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate gathering power: the sum of contributions from members with a
/// gathering-capable stat. Members at or below zero contribute nothing.
pub fn team_gathering_power(member_stats: &[f32]) -> f32 {
    member_stats.iter().copied().filter(|s| *s > 0.0).sum()
}

/// Units accrued for one item over one tick.
///
/// `power × coefficient × tick / efficiency_multiplier`; a non-positive
/// normalization constant disables accrual rather than dividing by zero.
pub fn tick_yield(power: f32, coefficient: f32, tick_secs: f32, efficiency_multiplier: f32) -> f32 {
    if efficiency_multiplier <= 0.0 {
        return 0.0;
    }
    power * coefficient * tick_secs / efficiency_multiplier
}

/// Per-item fractional accumulator.
///
/// `accrue` banks a tick's yield and returns the whole units now complete;
/// the sub-unit remainder stays banked for the next tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldAccumulator {
    pending: BTreeMap<String, f32>,
}

impl YieldAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` for `item` and take out the whole units available.
    pub fn accrue(&mut self, item: &str, amount: f32) -> u32 {
        let slot = self.pending.entry(item.to_string()).or_insert(0.0);
        *slot += amount.max(0.0);
        let whole = slot.floor();
        *slot -= whole;
        whole as u32
    }

    /// Fractional amount currently banked for an item.
    pub fn pending(&self, item: &str) -> f32 {
        self.pending.get(item).copied().unwrap_or(0.0)
    }

    /// Drop all banked fractions (a new gathering leg starts from zero).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_sums_capable_members() {
        assert!((team_gathering_power(&[25.0, 15.0]) - 40.0).abs() < f32::EPSILON);
        assert!((team_gathering_power(&[25.0, 0.0, -3.0]) - 25.0).abs() < f32::EPSILON);
        assert!(team_gathering_power(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unit_rate_scenario() {
        // Power 40, coefficient 1.0, normalization 40 → 1 unit per second.
        let rate = tick_yield(40.0, 1.0, 1.0, 40.0);
        assert!((rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_normalization_yields_nothing() {
        assert!(tick_yield(40.0, 1.0, 1.0, 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fraction_carries_across_ticks() {
        let mut acc = YieldAccumulator::new();
        // 0.4/tick: nothing on ticks 1-2, one unit on tick 3.
        assert_eq!(acc.accrue("wood", 0.4), 0);
        assert_eq!(acc.accrue("wood", 0.4), 0);
        assert_eq!(acc.accrue("wood", 0.4), 1);
        assert!((acc.pending("wood") - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_never_rounds_up_early() {
        let mut acc = YieldAccumulator::new();
        assert_eq!(acc.accrue("stone", 0.999), 0);
        assert_eq!(acc.accrue("stone", 0.001), 1);
    }

    #[test]
    fn test_multi_unit_ticks() {
        let mut acc = YieldAccumulator::new();
        assert_eq!(acc.accrue("wood", 2.5), 2);
        assert_eq!(acc.accrue("wood", 2.5), 3);
    }

    #[test]
    fn test_items_accumulate_independently() {
        let mut acc = YieldAccumulator::new();
        acc.accrue("wood", 0.7);
        acc.accrue("stone", 0.2);
        assert!((acc.pending("wood") - 0.7).abs() < 1e-6);
        assert!((acc.pending("stone") - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_clear_resets_fractions() {
        let mut acc = YieldAccumulator::new();
        acc.accrue("wood", 0.9);
        acc.clear();
        assert!(acc.pending("wood").abs() < f32::EPSILON);
    }
}
