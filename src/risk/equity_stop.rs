use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Force-close a basket when its floating loss grows too large relative to the equity peak
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EquityStopConfig {
    /// Allowed floating loss as a percent of the equity peak (e.g. 20 = 20%)
    pub risk_percent: Decimal,
}

impl EquityStopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.risk_percent <= Decimal::ZERO || self.risk_percent > Decimal::ONE_HUNDRED {
            return Err(ConfigError::RiskPercentOutOfRange(self.risk_percent));
        }
        Ok(())
    }

    /// Largest floating loss tolerated at the given peak
    pub fn max_loss(&self, equity_peak: Decimal) -> Decimal {
        equity_peak * self.risk_percent / Decimal::ONE_HUNDRED
    }

    /// True when `floating_pnl` is a loss exceeding the allowance.
    /// An unset (zero) peak never trips.
    pub fn is_breached(&self, floating_pnl: Decimal, equity_peak: Decimal) -> bool {
        if equity_peak <= Decimal::ZERO || floating_pnl >= Decimal::ZERO {
            return false;
        }
        -floating_pnl > self.max_loss(equity_peak)
    }
}

/// Highest equity reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EquityPeak {
    peak: Decimal,
}

impl EquityPeak {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            peak: initial_equity.max(Decimal::ZERO),
        }
    }

    pub fn value(&self) -> Decimal {
        self.peak
    }

    /// Record the latest equity; the peak never decreases
    pub fn update(&mut self, equity: Decimal) {
        if equity > self.peak {
            self.peak = equity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_peak_is_monotonic() {
        let mut peak = EquityPeak::new(dec!(10000));
        peak.update(dec!(12000));
        peak.update(dec!(9000));
        assert_eq!(peak.value(), dec!(12000));
    }

    #[test]
    fn test_breach_threshold() {
        let stop = EquityStopConfig {
            risk_percent: dec!(20),
        };

        // 20% of 12000 = 2400
        assert!(!stop.is_breached(dec!(-2400), dec!(12000)));
        assert!(stop.is_breached(dec!(-2400.01), dec!(12000)));
        assert!(!stop.is_breached(dec!(500), dec!(12000)));
    }

    #[test]
    fn test_zero_peak_never_trips() {
        let stop = EquityStopConfig {
            risk_percent: dec!(1),
        };
        assert!(!stop.is_breached(dec!(-1000000), Decimal::ZERO));
    }

    #[test]
    fn test_validate_range() {
        assert!(EquityStopConfig { risk_percent: dec!(100) }.validate().is_ok());
        assert!(EquityStopConfig { risk_percent: dec!(0) }.validate().is_err());
        assert!(EquityStopConfig { risk_percent: dec!(150) }.validate().is_err());
    }
}
