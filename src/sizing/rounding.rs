use crate::error::ConfigError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Caller-supplied volume normalisation. A zero result means "skip".
pub type RoundingFn = Box<dyn Fn(Decimal) -> Decimal + Send + Sync>;

/// Instrument volume constraints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VolumeRules {
    /// Volume granularity (lot step)
    pub step: Decimal,
    /// Smallest tradeable volume; anything below rounds to zero
    pub min_volume: Decimal,
    /// Largest volume accepted in a single order
    #[serde(default)]
    pub max_volume: Option<Decimal>,
}

impl Default for VolumeRules {
    fn default() -> Self {
        Self {
            step: Decimal::new(1, 2),       // 0.01
            min_volume: Decimal::new(1, 2), // 0.01
            max_volume: None,
        }
    }
}

impl VolumeRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step <= Decimal::ZERO {
            return Err(ConfigError::VolumeRules(format!(
                "step must be positive (got {})",
                self.step
            )));
        }
        if self.min_volume < Decimal::ZERO {
            return Err(ConfigError::VolumeRules(format!(
                "min_volume must not be negative (got {})",
                self.min_volume
            )));
        }
        if let Some(max) = self.max_volume {
            if max < self.min_volume {
                return Err(ConfigError::VolumeRules(format!(
                    "max_volume {} is below min_volume {}",
                    max, self.min_volume
                )));
            }
        }
        Ok(())
    }

    /// Round to the nearest step, clamp to the maximum, floor to zero below the minimum
    pub fn round(&self, volume: Decimal) -> Decimal {
        if volume <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let capped = match self.max_volume {
            Some(max) if volume > max => max,
            _ => volume,
        };

        // A volume too large to count in steps is not tradeable
        let Some(mut rounded) = capped
            .checked_div(self.step)
            .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|steps| steps.checked_mul(self.step))
        else {
            return Decimal::ZERO;
        };

        if let Some(max) = self.max_volume {
            if rounded > max {
                // Largest step multiple not above the cap
                rounded = (max / self.step).floor() * self.step;
            }
        }

        if rounded < self.min_volume || rounded <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        rounded.normalize()
    }

    /// Boxed rounding function backed by these rules
    pub fn into_rounding_fn(self) -> RoundingFn {
        Box::new(move |volume| self.round(volume))
    }
}
