//! Engine tunables — tick interval, throughput normalization, carrier
//! thresholds.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the gathering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatheringConfig {
    /// Seconds of simulated time advanced by one tick.
    pub tick_interval_secs: f32,
    /// Normalization constant dividing raw team power into units per second.
    pub efficiency_multiplier: f32,
    /// Stat thresholds classifying a member as a carrier.
    pub carrier: CarrierThresholds,
}

impl Default for GatheringConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0,
            efficiency_multiplier: 40.0,
            carrier: CarrierThresholds::default(),
        }
    }
}

/// A carrier is a poor gatherer but a strong hauler: gathering stat at or
/// below `max_gathering` and carrying capacity at or above `min_carry`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarrierThresholds {
    pub max_gathering: f32,
    pub min_carry: f32,
}

impl Default for CarrierThresholds {
    fn default() -> Self {
        Self {
            max_gathering: 10.0,
            min_carry: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatheringConfig::default();
        assert!((config.tick_interval_secs - 1.0).abs() < f32::EPSILON);
        assert!((config.efficiency_multiplier - 40.0).abs() < f32::EPSILON);
        assert!((config.carrier.max_gathering - 10.0).abs() < f32::EPSILON);
        assert!((config.carrier.min_carry - 50.0).abs() < f32::EPSILON);
    }
}
