use crate::backtest::metrics::{BacktestMetrics, BasketRecord};
use crate::basket::{BasketConfig, BasketManager};
use crate::models::{CloseReason, PriceSample, TradeIntent};
use crate::Result;
use rust_decimal::Decimal;

/// Backtest runner that plays samples through a basket manager
///
/// Acts as the execution collaborator: intents fill at the sample close,
/// closed baskets are settled into the balance and reported back through
/// `on_realized_trade`.
pub struct BacktestRunner {
    initial_equity: Decimal,
    config: BasketConfig,
}

/// Running equity curve extremes
#[derive(Debug, Default)]
struct Drawdown {
    peak: Decimal,
    max: Decimal,
    max_pct: Decimal,
}

impl Drawdown {
    fn observe(&mut self, equity: Decimal) {
        if equity > self.peak {
            self.peak = equity;
        }
        let dd = self.peak - equity;
        if dd > self.max {
            self.max = dd;
            if self.peak > Decimal::ZERO {
                self.max_pct = (dd / self.peak * Decimal::ONE_HUNDRED).round_dp(2);
            }
        }
    }
}

impl BacktestRunner {
    /// Create a new backtest runner
    pub fn new(initial_equity: Decimal, config: BasketConfig) -> Self {
        Self {
            initial_equity,
            config,
        }
    }

    /// Run a backtest over `samples` with a fresh manager
    pub fn run(&self, samples: &[PriceSample]) -> Result<BacktestMetrics> {
        let manager = BasketManager::new(self.config.clone())?;
        self.run_with(manager, samples)
    }

    /// Run a backtest with a caller-built manager (custom signal or rounding)
    pub fn run_with(
        &self,
        mut manager: BasketManager,
        samples: &[PriceSample],
    ) -> Result<BacktestMetrics> {
        let Some(last) = samples.last() else {
            return Err("No price samples provided".into());
        };

        tracing::info!("Starting backtest: {} samples", samples.len());

        let mut balance = self.initial_equity;
        let mut records = Vec::new();
        let mut drawdown = Drawdown::default();
        let mut rejected = 0usize;

        for sample in samples {
            let floating = manager.basket().floating_pnl(sample.price);
            let equity = balance + floating;
            drawdown.observe(equity);
            manager.update_equity_peak(equity);

            let intents = match manager.on_price_sample(sample.price, sample.timestamp) {
                Ok(intents) => intents,
                Err(e) => {
                    rejected += 1;
                    tracing::warn!("Sample rejected: {}", e);
                    continue;
                }
            };

            for intent in intents {
                if let TradeIntent::CloseAll { .. } = intent {
                    balance += Self::settle(&mut manager, &mut records);
                }
            }
        }

        // Close any remaining basket at the final price
        if manager
            .close_all(last.price, last.timestamp, CloseReason::EndOfData)?
            .is_some()
        {
            balance += Self::settle(&mut manager, &mut records);
        }
        drawdown.observe(balance);

        let metrics = BacktestMetrics::from_records(
            records,
            self.initial_equity,
            balance,
            drawdown.max,
            drawdown.max_pct,
        );

        tracing::info!(
            "Backtest complete: {} baskets, P&L: ${:.2} ({:.2}%), {} samples rejected",
            metrics.total_baskets,
            metrics.total_pnl,
            metrics.total_return_pct,
            rejected
        );

        Ok(metrics)
    }

    /// Realize the basket just closed by the manager and feed the result back
    fn settle(manager: &mut BasketManager, records: &mut Vec<BasketRecord>) -> Decimal {
        let Some(closed) = manager.last_closed() else {
            return Decimal::ZERO;
        };

        let realized = closed.pnl;
        if let Some(record) = BasketRecord::from_closed(closed) {
            records.push(record);
        }

        manager.on_realized_trade(realized);
        realized
    }

    /// Run backtest and print report
    pub fn run_and_report(
        &self,
        samples: &[PriceSample],
        scenario_name: &str,
    ) -> Result<BacktestMetrics> {
        println!("\n🔬 Running backtest: {}", scenario_name);
        println!("   Samples: {}", samples.len());
        println!("   Initial Equity: ${:.2}", self.initial_equity);

        let metrics = self.run(samples)?;
        metrics.print_report();

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::synthetic::{MarketScenario, SyntheticDataGenerator};
    use crate::models::Direction;
    use crate::risk::EquityStopConfig;
    use crate::sizing::{MoneyManagement, VolumeRules};
    use crate::strategy::FixedDirection;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn config() -> BasketConfig {
        BasketConfig {
            pip_step: dec!(1.5),
            take_profit_distance: dec!(1),
            stop_loss_distance: Decimal::ZERO,
            trailing: None,
            max_entries: 5,
            money_management: MoneyManagement::Geometric { exponent: dec!(1.5) },
            equity_stop: Some(EquityStopConfig {
                risk_percent: dec!(20),
            }),
            timeout: Some(Duration::hours(24)),
            base_volume: dec!(1),
            profit_threshold: None,
            volume_rules: VolumeRules::default(),
        }
    }

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_backtest_scenarios_stay_consistent() {
        tracing_subscriber::fmt()
            .with_env_filter("gridbasket=debug")
            .try_init()
            .ok();

        let runner = BacktestRunner::new(dec!(10000), config());

        for scenario in MarketScenario::ALL {
            let mut gen = SyntheticDataGenerator::new(42);
            let samples = gen.generate(scenario, 500, 5);

            let metrics = runner.run(&samples).unwrap();

            // Balance moves only by realized basket P&L
            assert_eq!(
                metrics.final_equity,
                metrics.initial_equity + metrics.total_pnl,
                "{:?}",
                scenario
            );
            assert!(metrics.max_entries_used <= 5);
            assert_eq!(
                metrics.winning_baskets + metrics.losing_baskets,
                metrics.total_baskets
            );
        }
    }

    #[test]
    fn test_take_profit_cycle() {
        let runner = BacktestRunner::new(dec!(1000), config());
        let manager = BasketManager::new(config())
            .unwrap()
            .with_signal(FixedDirection(Direction::Long));

        let samples: Vec<PriceSample> = [100, 98, 97]
            .iter()
            .enumerate()
            .map(|(i, p)| PriceSample::new(Decimal::from(*p), ts(i as i64)))
            .collect();

        // open 1 @ 100, add 1.5 @ 98 (avg 98.8), TP needs 99.8; end of data at 97
        let metrics = runner.run_with(manager, &samples).unwrap();
        assert_eq!(metrics.total_baskets, 1);
        assert_eq!(metrics.baskets[0].entries, 2);
        assert_eq!(metrics.baskets[0].close_reason, "end of data");
        // (97-100)*1 + (97-98)*1.5 = -4.5
        assert_eq!(metrics.total_pnl, dec!(-4.5));
        assert_eq!(metrics.final_equity, dec!(995.5));
    }

    #[test]
    fn test_empty_samples_is_error() {
        let runner = BacktestRunner::new(dec!(1000), config());
        let result = runner.run(&[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No price samples"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let runner = BacktestRunner::new(
            dec!(1000),
            BasketConfig {
                max_entries: 0,
                ..config()
            },
        );
        let samples = vec![PriceSample::new(dec!(100), ts(0))];
        assert!(runner.run(&samples).is_err());
    }
}
