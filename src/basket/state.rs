use crate::models::{CloseReason, Direction};
use crate::risk::TrailingStop;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One averaging order inside a basket
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Entry {
    pub price: Decimal,
    pub volume: Decimal,
    pub sequence_index: usize,
    pub opened_at: DateTime<Utc>,
}

/// Directional set of averaging entries.
///
/// Flat baskets have no entries, zero volume and `Direction::None`. Every
/// mutation recomputes the average from the entries, so the average is always
/// the volume-weighted mean of what is held.
#[derive(Debug, Clone, PartialEq)]
pub struct Basket {
    id: Uuid,
    direction: Direction,
    entries: Vec<Entry>,
    average_price: Decimal,
    total_volume: Decimal,
    trailing: TrailingStop,
}

impl Default for Basket {
    fn default() -> Self {
        Self::flat()
    }
}

impl Basket {
    pub fn flat() -> Self {
        Self {
            id: Uuid::nil(),
            direction: Direction::None,
            entries: Vec::new(),
            average_price: Decimal::ZERO,
            total_volume: Decimal::ZERO,
            trailing: TrailingStop::default(),
        }
    }

    /// Start a new basket cycle with its first entry
    pub fn open(
        direction: Direction,
        price: Decimal,
        volume: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        debug_assert!(!direction.is_flat(), "basket must open long or short");
        let mut basket = Self {
            id: Uuid::new_v4(),
            direction,
            ..Self::flat()
        };
        basket.push_entry(price, volume, timestamp);
        basket
    }

    /// Same basket with one more averaging entry
    #[cfg(test)]
    pub(crate) fn with_entry(
        mut self,
        price: Decimal,
        volume: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        self.push_entry(price, volume, timestamp);
        self
    }

    pub(crate) fn push_entry(&mut self, price: Decimal, volume: Decimal, timestamp: DateTime<Utc>) {
        debug_assert!(self.is_open(), "flat basket cannot hold entries");
        let sequence_index = self.entries.len();
        self.entries.push(Entry {
            price,
            volume,
            sequence_index,
            opened_at: timestamp,
        });
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total_volume = self.entries.iter().map(|e| e.volume).sum();
        self.average_price = if self.total_volume.is_zero() {
            Decimal::ZERO
        } else {
            let notional: Decimal = self.entries.iter().map(|e| e.price * e.volume).sum();
            notional / self.total_volume
        };
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_open(&self) -> bool {
        !self.direction.is_flat()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn last_entry(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn average_price(&self) -> Decimal {
        self.average_price
    }

    pub fn total_volume(&self) -> Decimal {
        self.total_volume
    }

    pub fn trade_count(&self) -> usize {
        self.entries.len()
    }

    /// Time of the first entry
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|e| e.opened_at)
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.opened_at().map(|opened| now - opened)
    }

    pub fn trailing(&self) -> &TrailingStop {
        &self.trailing
    }

    pub(crate) fn trailing_mut(&mut self) -> &mut TrailingStop {
        &mut self.trailing
    }

    /// Price distance from the average in the basket's favor (negative when losing)
    pub fn favorable_distance(&self, price: Decimal) -> Decimal {
        (price - self.average_price) * self.direction.sign()
    }

    /// How far price has moved against the most recent entry
    pub fn adverse_distance_from_last(&self, price: Decimal) -> Option<Decimal> {
        self.last_entry()
            .map(|last| (last.price - price) * self.direction.sign())
    }

    /// Unrealized P&L if every entry were closed at `price`
    pub fn floating_pnl(&self, price: Decimal) -> Decimal {
        let sign = self.direction.sign();
        self.entries
            .iter()
            .map(|e| (price - e.price) * e.volume * sign)
            .sum()
    }
}

/// Snapshot of the most recently closed basket
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedBasket {
    pub basket: Basket,
    pub exit_price: Decimal,
    pub closed_at: DateTime<Utc>,
    pub reason: CloseReason,
    /// Floating P&L at the exit price; the realized figure comes from the host
    pub pnl: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_flat_basket_invariants() {
        let basket = Basket::flat();
        assert_eq!(basket.direction(), Direction::None);
        assert!(basket.entries().is_empty());
        assert_eq!(basket.total_volume(), Decimal::ZERO);
        assert_eq!(basket.opened_at(), None);
        assert!(!basket.is_open());
    }

    #[test]
    fn test_weighted_average() {
        let basket = Basket::open(Direction::Long, dec!(100), dec!(1), ts(0))
            .with_entry(dec!(90), dec!(2), ts(5))
            .with_entry(dec!(80), dec!(1), ts(10));

        // (100 + 180 + 80) / 4 = 90
        assert_eq!(basket.average_price(), dec!(90));
        assert_eq!(basket.total_volume(), dec!(4));
        assert_eq!(basket.trade_count(), 3);
        assert_eq!(basket.opened_at(), Some(ts(0)));

        let indices: Vec<usize> = basket.entries().iter().map(|e| e.sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_distances_and_pnl_long() {
        let basket = Basket::open(Direction::Long, dec!(100), dec!(1), ts(0))
            .with_entry(dec!(90), dec!(1), ts(5));

        assert_eq!(basket.average_price(), dec!(95));
        assert_eq!(basket.favorable_distance(dec!(97)), dec!(2));
        assert_eq!(basket.adverse_distance_from_last(dec!(85)), Some(dec!(5)));
        assert_eq!(basket.floating_pnl(dec!(97)), dec!(4));
    }

    #[test]
    fn test_distances_and_pnl_short() {
        let basket = Basket::open(Direction::Short, dec!(100), dec!(2), ts(0));

        assert_eq!(basket.favorable_distance(dec!(96)), dec!(4));
        assert_eq!(basket.adverse_distance_from_last(dec!(103)), Some(dec!(3)));
        assert_eq!(basket.floating_pnl(dec!(103)), dec!(-6));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "flat basket cannot hold entries")]
    fn test_flat_basket_rejects_entries() {
        let _ = Basket::flat().with_entry(dec!(100), dec!(1), ts(0));
    }

    #[test]
    fn test_each_cycle_gets_new_id() {
        let a = Basket::open(Direction::Long, dec!(1), dec!(1), ts(0));
        let b = Basket::open(Direction::Long, dec!(1), dec!(1), ts(0));
        assert_ne!(a.id(), b.id());
        assert_eq!(Basket::flat().id(), Uuid::nil());
    }
}
