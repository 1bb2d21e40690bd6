use super::state::{Basket, ClosedBasket};
use crate::error::{ConfigError, SampleError};
use crate::models::{CloseReason, Direction, PriceSample, TradeIntent};
use crate::risk::{EquityPeak, EquityStopConfig, TrailingConfig};
use crate::sizing::{MoneyManagement, RoundingFn, SizingState, VolumeRules};
use crate::strategy::{DirectionSignal, LastTwoCloses};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Immutable basket configuration. Zero distances disable the matching feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketConfig {
    /// Adverse move from the last entry required before averaging (0 = never average)
    pub pip_step: Decimal,
    pub take_profit_distance: Decimal,
    pub stop_loss_distance: Decimal,
    pub trailing: Option<TrailingConfig>,
    pub max_entries: usize,
    pub money_management: MoneyManagement,
    pub equity_stop: Option<EquityStopConfig>,
    pub timeout: Option<Duration>,
    pub base_volume: Decimal,
    /// Realized profit that earns one more base volume unit
    pub profit_threshold: Option<Decimal>,
    pub volume_rules: VolumeRules,
}

impl BasketConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::ZeroMaxEntries);
        }

        for (field, value) in [
            ("pip_step", self.pip_step),
            ("take_profit_distance", self.take_profit_distance),
            ("stop_loss_distance", self.stop_loss_distance),
        ] {
            if value < Decimal::ZERO {
                return Err(ConfigError::NegativeDistance { field, value });
            }
        }

        if let Some(trailing) = &self.trailing {
            trailing.validate()?;
        }
        if let Some(equity_stop) = &self.equity_stop {
            equity_stop.validate()?;
        }
        if let Some(timeout) = self.timeout {
            if timeout <= Duration::zero() {
                return Err(ConfigError::NonPositiveTimeout);
            }
        }
        if self.base_volume <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveBaseVolume(self.base_volume));
        }
        if let Some(threshold) = self.profit_threshold {
            if threshold <= Decimal::ZERO {
                return Err(ConfigError::NonPositiveProfitThreshold(threshold));
            }
        }

        self.money_management.validate()?;
        self.volume_rules.validate()
    }
}

/// Grid/martingale basket state machine: `Flat -> BasketOpen -> Flat`.
///
/// Each accepted sample yields at most one intent. Intents are applied to the
/// internal basket immediately, assuming a fill at the sample price.
pub struct BasketManager {
    config: BasketConfig,
    basket: Basket,
    sizing: SizingState,
    equity_peak: EquityPeak,
    signal: Box<dyn DirectionSignal>,
    rounding: RoundingFn,
    last_timestamp: Option<DateTime<Utc>>,
    last_closed: Option<ClosedBasket>,
}

impl fmt::Debug for BasketManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasketManager")
            .field("config", &self.config)
            .field("basket", &self.basket)
            .field("sizing", &self.sizing)
            .field("equity_peak", &self.equity_peak)
            .field("signal", &self.signal.name())
            .field("last_timestamp", &self.last_timestamp)
            .finish_non_exhaustive()
    }
}

impl BasketManager {
    /// Build a manager using the last-two-closes signal and the configured volume rules
    pub fn new(config: BasketConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let sizing = SizingState::new(config.base_volume, config.profit_threshold);
        let rounding = config.volume_rules.into_rounding_fn();

        Ok(Self {
            config,
            basket: Basket::flat(),
            sizing,
            equity_peak: EquityPeak::default(),
            signal: Box::new(LastTwoCloses::new()),
            rounding,
            last_timestamp: None,
            last_closed: None,
        })
    }

    /// Replace the entry direction signal
    pub fn with_signal<S: DirectionSignal + 'static>(mut self, signal: S) -> Self {
        self.signal = Box::new(signal);
        self
    }

    /// Replace the volume rounding function
    pub fn with_rounding<F>(mut self, rounding: F) -> Self
    where
        F: Fn(Decimal) -> Decimal + Send + Sync + 'static,
    {
        self.rounding = Box::new(rounding);
        self
    }

    pub fn config(&self) -> &BasketConfig {
        &self.config
    }

    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    pub fn sizing(&self) -> &SizingState {
        &self.sizing
    }

    pub fn equity_peak(&self) -> Decimal {
        self.equity_peak.value()
    }

    pub fn last_closed(&self) -> Option<&ClosedBasket> {
        self.last_closed.as_ref()
    }

    /// Host reports current equity; call before `on_price_sample`
    pub fn update_equity_peak(&mut self, equity: Decimal) {
        self.equity_peak.update(equity);
    }

    /// Host confirms the realized result of a closed basket
    pub fn on_realized_trade(&mut self, profit: Decimal) {
        self.sizing.record_realized(profit);
        tracing::debug!(
            "Realized {} (loss: {}), base volume {}",
            profit,
            self.sizing.last_closed_was_loss,
            self.sizing.base_volume
        );
    }

    /// Volume for the next entry under the configured money management
    pub fn calculate_volume(&self) -> Decimal {
        let raw = self
            .sizing
            .raw_volume(&self.config.money_management, self.basket.trade_count());
        (self.rounding)(raw)
    }

    /// Process one bar close
    pub fn on_price_sample(
        &mut self,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<TradeIntent>, SampleError> {
        self.validate_sample(price, timestamp)?;

        self.last_timestamp = Some(timestamp);
        self.signal.observe(&PriceSample::new(price, timestamp));

        if self.basket.is_open() {
            if let Some(reason) = self.check_close(price, timestamp) {
                return Ok(vec![self.close_basket(price, timestamp, reason)]);
            }
            return Ok(self.try_average(price, timestamp).into_iter().collect());
        }

        Ok(self.try_open(price, timestamp).into_iter().collect())
    }

    /// Close the open basket on the host's request (e.g. end of data)
    pub fn close_all(
        &mut self,
        price: Decimal,
        timestamp: DateTime<Utc>,
        reason: CloseReason,
    ) -> Result<Option<TradeIntent>, SampleError> {
        self.validate_sample(price, timestamp)?;
        self.last_timestamp = Some(timestamp);

        if !self.basket.is_open() {
            return Ok(None);
        }
        Ok(Some(self.close_basket(price, timestamp, reason)))
    }

    fn validate_sample(&self, price: Decimal, timestamp: DateTime<Utc>) -> Result<(), SampleError> {
        if price <= Decimal::ZERO {
            return Err(SampleError::NonPositivePrice(price));
        }
        if let Some(previous) = self.last_timestamp {
            if timestamp < previous {
                return Err(SampleError::TimestampRegression {
                    previous,
                    got: timestamp,
                });
            }
        }
        Ok(())
    }

    /// First matching close condition in order:
    /// timeout, equity stop, trailing stop, stop loss, take profit
    fn check_close(&mut self, price: Decimal, timestamp: DateTime<Utc>) -> Option<CloseReason> {
        if let (Some(timeout), Some(age)) = (self.config.timeout, self.basket.age(timestamp)) {
            if age >= timeout {
                return Some(CloseReason::Timeout);
            }
        }

        if let Some(equity_stop) = &self.config.equity_stop {
            let floating = self.basket.floating_pnl(price);
            if equity_stop.is_breached(floating, self.equity_peak.value()) {
                tracing::warn!(
                    "🛑 Equity stop: floating {} exceeds {}% of peak {}",
                    floating,
                    equity_stop.risk_percent,
                    self.equity_peak.value()
                );
                return Some(CloseReason::EquityStop);
            }
        }

        if let Some(trailing) = &self.config.trailing {
            let direction = self.basket.direction();
            let average = self.basket.average_price();
            let stop = self.basket.trailing_mut();
            if stop.update(trailing, direction, average, price) {
                tracing::debug!("Trailing stop moved to {:?}", stop.level());
            }
            if stop.is_breached(direction, price) {
                return Some(CloseReason::TrailingStop);
            }
        }

        let favorable = self.basket.favorable_distance(price);

        if self.config.stop_loss_distance > Decimal::ZERO
            && favorable <= -self.config.stop_loss_distance
        {
            return Some(CloseReason::StopLoss);
        }

        if self.config.take_profit_distance > Decimal::ZERO
            && favorable >= self.config.take_profit_distance
        {
            return Some(CloseReason::TakeProfit);
        }

        None
    }

    fn try_average(&mut self, price: Decimal, timestamp: DateTime<Utc>) -> Option<TradeIntent> {
        if self.config.pip_step <= Decimal::ZERO
            || self.basket.trade_count() >= self.config.max_entries
        {
            return None;
        }

        let adverse = self.basket.adverse_distance_from_last(price)?;
        if adverse < self.config.pip_step {
            return None;
        }

        let volume = self.calculate_volume();
        if volume.is_zero() {
            tracing::debug!("Averaging skipped at {}: volume rounds to zero", price);
            return None;
        }

        let direction = self.basket.direction();
        self.basket.push_entry(price, volume, timestamp);

        tracing::debug!(
            "➕ Averaging {} #{} @ {} vol {} (avg {}, total {})",
            direction,
            self.basket.trade_count(),
            price,
            volume,
            self.basket.average_price(),
            self.basket.total_volume()
        );

        Some(TradeIntent::AddEntry { direction, volume })
    }

    fn try_open(&mut self, price: Decimal, timestamp: DateTime<Utc>) -> Option<TradeIntent> {
        let direction = self.signal.direction()?;
        if direction == Direction::None {
            return None;
        }

        let volume = self.calculate_volume();
        if volume.is_zero() {
            tracing::debug!("Open skipped at {}: volume rounds to zero", price);
            return None;
        }

        self.basket = Basket::open(direction, price, volume, timestamp);

        tracing::info!(
            "💰 Opened {} basket {} @ {} vol {}",
            direction,
            self.basket.id(),
            price,
            volume
        );

        Some(TradeIntent::OpenFirst { direction, volume })
    }

    fn close_basket(
        &mut self,
        price: Decimal,
        timestamp: DateTime<Utc>,
        reason: CloseReason,
    ) -> TradeIntent {
        let basket = std::mem::take(&mut self.basket);
        let pnl = basket.floating_pnl(price);

        if let Some(last) = basket.last_entry() {
            self.sizing.record_close(last.volume);
        }

        tracing::info!(
            "🏁 Closed {} basket {} ({}) @ {}: {} entries, avg {}, P&L {}",
            basket.direction(),
            basket.id(),
            reason,
            price,
            basket.trade_count(),
            basket.average_price(),
            pnl
        );

        self.last_closed = Some(ClosedBasket {
            basket,
            exit_price: price,
            closed_at: timestamp,
            reason,
            pnl,
        });

        TradeIntent::CloseAll { reason }
    }
}
