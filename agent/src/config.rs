use serde::{Deserialize, Serialize};
use thiserror::Error;
use vanguard_system_attack_waves::WaveConfig;
use vanguard_system_mining::SaturationPolicy;
use vanguard_system_placement::PlacementConfig;

/// Every tunable of the agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seed of the random source shared by every component.
    pub seed: u64,
    /// Game loops that must pass between two processed snapshots.
    pub frames_per_order: u32,
    /// Placement search bounds.
    pub placement: PlacementConfig,
    /// Harvester targets and the worker cap.
    pub saturation: SaturationPolicy,
    /// Attack-wave distances.
    pub waves: WaveConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            frames_per_order: 16,
            placement: PlacementConfig::default(),
            saturation: SaturationPolicy::default(),
            waves: WaveConfig::default(),
        }
    }
}

/// Configuration values the agent cannot run with.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Every snapshot would be processed twice.
    #[error("frames_per_order must be at least 1")]
    ZeroFramesPerOrder,
    /// The placement search would only ever try its anchor.
    #[error("placement.max_distance must be at least 1")]
    ZeroSearchRadius,
    /// A harvester target of zero leaves resources unworked.
    #[error("saturation.{field} must be at least 1")]
    ZeroSaturation {
        /// Offending field.
        field: &'static str,
    },
    /// Waves would never regroup or retarget.
    #[error("waves.detection_radius must be positive, got {0}")]
    NonPositiveDetectionRadius(f32),
    /// The share of stragglers must be a fraction.
    #[error("waves.dispersion_tolerance must lie in [0, 1], got {0}")]
    ToleranceOutOfRange(f32),
}

impl AgentConfig {
    /// Checks every value the agent relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_order == 0 {
            return Err(ConfigError::ZeroFramesPerOrder);
        }
        if self.placement.max_distance == 0 {
            return Err(ConfigError::ZeroSearchRadius);
        }

        let targets = [
            ("per_mineral", self.saturation.per_mineral),
            ("per_gas", self.saturation.per_gas),
            ("mineral_overflow", self.saturation.mineral_overflow),
        ];
        if let Some((field, _)) = targets.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroSaturation { field });
        }

        let radius = self.waves.detection_radius;
        if radius.is_nan() || radius <= 0.0 {
            return Err(ConfigError::NonPositiveDetectionRadius(radius));
        }
        if !(0.0..=1.0).contains(&self.waves.dispersion_tolerance) {
            return Err(ConfigError::ToleranceOutOfRange(
                self.waves.dispersion_tolerance,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentConfig, ConfigError};

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AgentConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_gas_target_is_named() {
        let mut config = AgentConfig::default();
        config.saturation.per_gas = 0;
        let error = config.validate().unwrap_err();
        assert_eq!(error, ConfigError::ZeroSaturation { field: "per_gas" });
        assert_eq!(error.to_string(), "saturation.per_gas must be at least 1");
    }
}
