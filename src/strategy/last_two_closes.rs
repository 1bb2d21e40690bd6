use super::DirectionSignal;
use crate::models::{Direction, PriceSample};
use rust_decimal::Decimal;

/// Long when the last two closes are non-decreasing, short otherwise.
///
/// Gives no direction until two samples have been seen.
#[derive(Debug, Clone, Default)]
pub struct LastTwoCloses {
    previous: Option<Decimal>,
    latest: Option<Decimal>,
}

impl LastTwoCloses {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectionSignal for LastTwoCloses {
    fn observe(&mut self, sample: &PriceSample) {
        self.previous = self.latest;
        self.latest = Some(sample.price);
    }

    fn direction(&self) -> Option<Direction> {
        match (self.previous, self.latest) {
            (Some(prev), Some(last)) if last >= prev => Some(Direction::Long),
            (Some(_), Some(_)) => Some(Direction::Short),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        "LastTwoCloses"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn sample(price: Decimal) -> PriceSample {
        PriceSample::new(price, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_needs_two_samples() {
        let mut signal = LastTwoCloses::new();
        assert_eq!(signal.direction(), None);

        signal.observe(&sample(dec!(100)));
        assert_eq!(signal.direction(), None);
    }

    #[test]
    fn test_non_decreasing_is_long() {
        let mut signal = LastTwoCloses::new();
        signal.observe(&sample(dec!(100)));
        signal.observe(&sample(dec!(100)));
        assert_eq!(signal.direction(), Some(Direction::Long));

        signal.observe(&sample(dec!(101)));
        assert_eq!(signal.direction(), Some(Direction::Long));
    }

    #[test]
    fn test_falling_is_short() {
        let mut signal = LastTwoCloses::new();
        signal.observe(&sample(dec!(100)));
        signal.observe(&sample(dec!(99.5)));
        assert_eq!(signal.direction(), Some(Direction::Short));
    }
}
