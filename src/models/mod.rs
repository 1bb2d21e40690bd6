use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a basket. `None` means flat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short, 0 when flat
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
            Direction::None => Decimal::ZERO,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Direction::None
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::None => write!(f, "FLAT"),
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// One bar close delivered by the price feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceSample {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

/// Why a basket was closed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CloseReason {
    Timeout,
    EquityStop,
    TrailingStop,
    StopLoss,
    TakeProfit,
    /// Forced by the host, e.g. end of backtest data
    EndOfData,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CloseReason::Timeout => "timeout",
            CloseReason::EquityStop => "equity stop",
            CloseReason::TrailingStop => "trailing stop",
            CloseReason::StopLoss => "stop loss",
            CloseReason::TakeProfit => "take profit",
            CloseReason::EndOfData => "end of data",
        };
        f.write_str(label)
    }
}

/// Decision emitted by the basket manager for the execution collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TradeIntent {
    OpenFirst { direction: Direction, volume: Decimal },
    AddEntry { direction: Direction, volume: Decimal },
    CloseAll { reason: CloseReason },
}

impl TradeIntent {
    pub fn volume(&self) -> Option<Decimal> {
        match self {
            TradeIntent::OpenFirst { volume, .. } | TradeIntent::AddEntry { volume, .. } => {
                Some(*volume)
            }
            TradeIntent::CloseAll { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Long.sign(), Decimal::ONE);
        assert_eq!(Direction::Short.sign(), Decimal::NEGATIVE_ONE);
        assert_eq!(Direction::None.sign(), Decimal::ZERO);
        assert!(Direction::default().is_flat());
    }

    #[test]
    fn test_intent_volume() {
        let open = TradeIntent::OpenFirst {
            direction: Direction::Long,
            volume: Decimal::new(5, 1),
        };
        assert_eq!(open.volume(), Some(Decimal::new(5, 1)));

        let close = TradeIntent::CloseAll {
            reason: CloseReason::TakeProfit,
        };
        assert_eq!(close.volume(), None);
    }
}
