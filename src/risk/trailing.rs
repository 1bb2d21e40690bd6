use crate::error::ConfigError;
use crate::models::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trailing stop distances, measured from the basket average price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrailingConfig {
    /// Favorable distance from average needed to arm the stop
    pub start_distance: Decimal,
    /// Gap kept between price and the stop once armed
    pub stop_distance: Decimal,
}

impl TrailingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_distance < Decimal::ZERO {
            return Err(ConfigError::NegativeDistance {
                field: "trailing.start_distance",
                value: self.start_distance,
            });
        }
        if self.stop_distance <= Decimal::ZERO {
            return Err(ConfigError::TrailingStopDistance(self.stop_distance));
        }
        Ok(())
    }
}

/// Armed trailing stop level for one basket. Only ever tightens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrailingStop {
    level: Option<Decimal>,
}

impl TrailingStop {
    pub fn level(&self) -> Option<Decimal> {
        self.level
    }

    pub fn is_armed(&self) -> bool {
        self.level.is_some()
    }

    /// Arm or tighten the stop for the current price
    ///
    /// Returns true when the level moved.
    pub fn update(
        &mut self,
        config: &TrailingConfig,
        direction: Direction,
        average_price: Decimal,
        price: Decimal,
    ) -> bool {
        let favorable = (price - average_price) * direction.sign();
        if direction.is_flat() || favorable < config.start_distance {
            return false;
        }

        let candidate = match direction {
            Direction::Long => price - config.stop_distance,
            Direction::Short => price + config.stop_distance,
            Direction::None => return false,
        };

        let tightened = match (self.level, direction) {
            (None, _) => true,
            (Some(current), Direction::Long) => candidate > current,
            (Some(current), Direction::Short) => candidate < current,
            (Some(_), Direction::None) => false,
        };

        if tightened {
            self.level = Some(candidate);
        }
        tightened
    }

    pub fn is_breached(&self, direction: Direction, price: Decimal) -> bool {
        match (self.level, direction) {
            (Some(level), Direction::Long) => price <= level,
            (Some(level), Direction::Short) => price >= level,
            _ => false,
        }
    }
}
