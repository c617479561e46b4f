//! # Collapse Configuration
//!
//! The four tuning knobs of a cave-in plus the continuation delay.
//!
//! Values are validated when they are loaded, never while simulating. A host
//! that would rather repair than reject bad values can use
//! [`CollapseConfig::clamped`].
//!
//! ## Hot Reload
//!
//! [`SharedConfig`] is a cloneable handle around a lock. The engine copies a
//! snapshot once per invocation, so a reload takes effect on the next trigger
//! or continuation pass and never halfway through one.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, CollapseResult};

/// Largest radius a collapse may draw. Bounds the scan to `(2r+1)^2` columns.
pub const MAX_COLLAPSE_RADIUS: u32 = 64;

/// Tuning values read by every trigger and continuation pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollapseConfig {
    /// Chance that a disturbance triggers a collapse.
    pub collapse_trigger_chance: f32,
    /// Chance that an eligible block fails during a scan or continuation.
    pub collapse_propagate_chance: f32,
    /// Smallest collapse radius.
    pub collapse_min_radius: u32,
    /// Exclusive upper bound of the random radius added to the minimum.
    pub collapse_radius_variance: u32,
    /// Ticks between a pass and the continuation of its frontier.
    pub propagation_delay_ticks: u64,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            collapse_trigger_chance: 0.1,
            collapse_propagate_chance: 0.55,
            collapse_min_radius: 3,
            collapse_radius_variance: 16,
            propagation_delay_ticks: 10,
        }
    }
}

impl CollapseConfig {
    /// Checks every value.
    ///
    /// # Errors
    ///
    /// Returns [`CollapseError::InvalidConfig`] if a probability is NaN or
    /// outside `[0, 1]`, or if the largest drawable radius exceeds
    /// [`MAX_COLLAPSE_RADIUS`].
    pub fn validate(&self) -> CollapseResult<()> {
        check_probability("collapse_trigger_chance", self.collapse_trigger_chance)?;
        check_probability("collapse_propagate_chance", self.collapse_propagate_chance)?;

        let largest = u64::from(self.collapse_min_radius)
            + u64::from(self.collapse_radius_variance.saturating_sub(1));
        if largest > u64::from(MAX_COLLAPSE_RADIUS) {
            return Err(CollapseError::InvalidConfig(format!(
                "collapse radius can reach {largest}, limit is {MAX_COLLAPSE_RADIUS}"
            )));
        }
        Ok(())
    }

    /// Returns a copy with every value forced into range.
    ///
    /// NaN probabilities become 0 (never).
    #[must_use]
    pub fn clamped(self) -> Self {
        let probability = |p: f32| if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        let min_radius = self.collapse_min_radius.min(MAX_COLLAPSE_RADIUS);
        Self {
            collapse_trigger_chance: probability(self.collapse_trigger_chance),
            collapse_propagate_chance: probability(self.collapse_propagate_chance),
            collapse_min_radius: min_radius,
            collapse_radius_variance: self
                .collapse_radius_variance
                .min(MAX_COLLAPSE_RADIUS - min_radius + 1),
            propagation_delay_ticks: self.propagation_delay_ticks,
        }
    }

    /// Parses and validates a standalone `[config]`-style TOML table.
    ///
    /// # Errors
    ///
    /// Returns [`CollapseError::InvalidConfig`] on syntax errors, unknown keys,
    /// negative radii or out-of-range values.
    pub fn from_toml_str(source: &str) -> CollapseResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| CollapseError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn check_probability(name: &str, value: f32) -> CollapseResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CollapseError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// Cloneable, thread-safe handle to the live configuration.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<CollapseConfig>>,
}

impl SharedConfig {
    /// Wraps a configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is invalid.
    pub fn new(config: CollapseConfig) -> CollapseResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
        })
    }

    /// Copy of the current values.
    #[must_use]
    pub fn snapshot(&self) -> CollapseConfig {
        *self.inner.read()
    }

    /// Replaces the live values. Invalid values leave the old ones in place.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is invalid.
    pub fn replace(&self, config: CollapseConfig) -> CollapseResult<()> {
        config.validate()?;
        *self.inner.write() = config;
        tracing::info!(
            "collapse config reloaded: trigger={} propagate={} radius={}+{}",
            config.collapse_trigger_chance,
            config.collapse_propagate_chance,
            config.collapse_min_radius,
            config.collapse_radius_variance
        );
        Ok(())
    }

    /// Parses TOML and replaces the live values.
    ///
    /// # Errors
    ///
    /// See [`CollapseConfig::from_toml_str`].
    pub fn reload_from_toml_str(&self, source: &str) -> CollapseResult<()> {
        self.replace(CollapseConfig::from_toml_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CollapseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        let config = CollapseConfig {
            collapse_trigger_chance: 1.5,
            ..CollapseConfig::default()
        };
        assert!(matches!(config.validate(), Err(CollapseError::InvalidConfig(_))));

        let config = CollapseConfig {
            collapse_propagate_chance: f32::NAN,
            ..CollapseConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_huge_radius() {
        let config = CollapseConfig {
            collapse_min_radius: 60,
            collapse_radius_variance: 10,
            ..CollapseConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_radius_fails_to_parse() {
        let result = CollapseConfig::from_toml_str("collapse_min_radius = -2");
        assert!(matches!(result, Err(CollapseError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_key_fails_to_parse() {
        assert!(CollapseConfig::from_toml_str("collapse_radius = 4").is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CollapseConfig::from_toml_str("collapse_trigger_chance = 1.0").unwrap();
        assert!((config.collapse_trigger_chance - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.collapse_min_radius, 3);
        assert_eq!(config.propagation_delay_ticks, 10);
    }

    #[test]
    fn test_clamped() {
        let config = CollapseConfig {
            collapse_trigger_chance: -0.5,
            collapse_propagate_chance: f32::NAN,
            collapse_min_radius: 500,
            collapse_radius_variance: 500,
            propagation_delay_ticks: 3,
        }
        .clamped();

        assert!(config.validate().is_ok());
        assert!(config.collapse_trigger_chance.abs() < f32::EPSILON);
        assert!(config.collapse_propagate_chance.abs() < f32::EPSILON);
        assert_eq!(config.collapse_min_radius, MAX_COLLAPSE_RADIUS);
    }

    #[test]
    fn test_shared_config_rejects_invalid_replace() {
        let shared = SharedConfig::new(CollapseConfig::default()).unwrap();
        let reader = shared.clone();

        assert!(shared
            .replace(CollapseConfig {
                collapse_trigger_chance: 2.0,
                ..CollapseConfig::default()
            })
            .is_err());
        assert_eq!(reader.snapshot(), CollapseConfig::default());

        shared.reload_from_toml_str("collapse_trigger_chance = 0.5").unwrap();
        assert!((reader.snapshot().collapse_trigger_chance - 0.5).abs() < f32::EPSILON);
    }
}
