use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How entry volume is chosen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MoneyManagement {
    /// Every entry uses the base volume
    #[default]
    Fixed,
    /// base_volume * exponent^trade_count, growing inside a basket
    Geometric { exponent: Decimal },
    /// Multiply the last closed volume after a losing basket, otherwise reset to base
    RecoverLastLoss { exponent: Decimal },
}

impl MoneyManagement {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            MoneyManagement::Fixed => Ok(()),
            MoneyManagement::Geometric { exponent }
            | MoneyManagement::RecoverLastLoss { exponent } => {
                if *exponent <= Decimal::ZERO {
                    Err(ConfigError::NonPositiveExponent(*exponent))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Volume memory carried across baskets
#[derive(Debug, Clone, PartialEq)]
pub struct SizingState {
    pub base_volume: Decimal,
    pub last_closed_was_loss: bool,
    pub last_closed_volume: Decimal,
    pub profit_threshold: Option<Decimal>,
    /// Realized profit not yet converted into a base volume increase
    pub accumulated_profit: Decimal,
    initial_base_volume: Decimal,
}

impl SizingState {
    pub fn new(base_volume: Decimal, profit_threshold: Option<Decimal>) -> Self {
        Self {
            base_volume,
            last_closed_was_loss: false,
            last_closed_volume: Decimal::ZERO,
            profit_threshold,
            accumulated_profit: Decimal::ZERO,
            initial_base_volume: base_volume,
        }
    }

    /// Unrounded volume for the next entry of a basket holding `trade_count` entries.
    ///
    /// Growth that no longer fits a `Decimal` saturates at `Decimal::MAX`; the
    /// rounding function is what caps it to a tradeable size.
    pub fn raw_volume(&self, mode: &MoneyManagement, trade_count: usize) -> Decimal {
        match mode {
            MoneyManagement::Fixed => self.base_volume,
            MoneyManagement::Geometric { exponent } => {
                let mut factor = Decimal::ONE;
                for _ in 0..trade_count {
                    match factor.checked_mul(*exponent) {
                        Some(next) => factor = next,
                        None => return Decimal::MAX,
                    }
                }
                self.base_volume.checked_mul(factor).unwrap_or(Decimal::MAX)
            }
            MoneyManagement::RecoverLastLoss { exponent } => {
                if self.last_closed_was_loss && self.last_closed_volume > Decimal::ZERO {
                    self.last_closed_volume
                        .checked_mul(*exponent)
                        .unwrap_or(Decimal::MAX)
                } else {
                    self.base_volume
                }
            }
        }
    }

    /// Remember the volume of the last order of a basket that just closed
    pub fn record_close(&mut self, last_entry_volume: Decimal) {
        self.last_closed_volume = last_entry_volume;
    }

    /// Apply a confirmed realized result
    pub fn record_realized(&mut self, profit: Decimal) {
        self.last_closed_was_loss = profit < Decimal::ZERO;

        let Some(threshold) = self.profit_threshold else {
            return;
        };

        self.accumulated_profit = self
            .accumulated_profit
            .saturating_add(profit)
            .max(Decimal::ZERO);

        let crossed = self
            .accumulated_profit
            .checked_div(threshold)
            .unwrap_or(Decimal::MAX)
            .floor();
        if crossed.is_zero() {
            return;
        }

        self.accumulated_profit = self
            .accumulated_profit
            .saturating_sub(threshold.saturating_mul(crossed))
            .max(Decimal::ZERO);
        self.base_volume = self
            .base_volume
            .saturating_add(self.initial_base_volume.saturating_mul(crossed));

        tracing::info!(
            "📈 Realized profit crossed {} x{} - base volume raised to {}",
            threshold,
            crossed,
            self.base_volume
        );
    }
}
