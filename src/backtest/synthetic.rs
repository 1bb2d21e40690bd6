use crate::models::PriceSample;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MarketScenario {
    /// Steady uptrend with noise (+2% daily average)
    Uptrend,
    /// Steady downtrend with noise (-2% daily average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
    /// Contains time gaps (missing samples)
    WithGaps,
    /// Slow climb then a 25% slide, the classic grid killer
    DrawdownTest,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 6] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::WithGaps,
        MarketScenario::DrawdownTest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "📈 Uptrend (+2% daily)",
            MarketScenario::Downtrend => "📉 Downtrend (-2% daily)",
            MarketScenario::Sideways => "↔️  Sideways (mean-reverting)",
            MarketScenario::Volatile => "⚡ Volatile (±5% swings)",
            MarketScenario::WithGaps => "🕳️  With Time Gaps",
            MarketScenario::DrawdownTest => "💥 Drawdown Test (25% drop)",
        }
    }
}

impl fmt::Display for MarketScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Generates synthetic price samples for backtesting
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    start_time: DateTime<Utc>,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
            start_time: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }

    /// Generate samples for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_samples` - Number of bar closes to generate
    /// * `interval_minutes` - Minutes between bars
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_samples: usize,
        interval_minutes: i64,
    ) -> Vec<PriceSample> {
        let mut samples = Vec::with_capacity(num_samples);
        let mut price = self.base_price;
        let mut slot: i64 = 0;

        let daily_bars = 24.0 * 60.0 / interval_minutes.max(1) as f64;

        for i in 0..num_samples {
            price = match scenario {
                MarketScenario::Uptrend => {
                    let drift = price * 0.02 / daily_bars;
                    price + drift + price * self.rng.gen_range(-0.001..0.001)
                }
                MarketScenario::Downtrend => {
                    let drift = price * -0.02 / daily_bars;
                    price + drift + price * self.rng.gen_range(-0.001..0.001)
                }
                MarketScenario::Sideways => {
                    // 10% pull back to the mean plus ±1% noise
                    let reversion = (self.base_price - price) * 0.1;
                    price + reversion + price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => {
                    let moved = price + price * self.rng.gen_range(-0.05..0.05);
                    moved.max(self.base_price * 0.5)
                }
                MarketScenario::WithGaps => {
                    // Skip every 50th slot to create gaps
                    if i % 50 == 49 {
                        slot += 2;
                    }
                    price + price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::DrawdownTest => {
                    if i < num_samples / 2 {
                        price + price * self.rng.gen_range(-0.005..0.01)
                    } else {
                        let drop_rate = -0.25 / (num_samples as f64 / 2.0);
                        price + price * drop_rate + price * self.rng.gen_range(-0.005..0.005)
                    }
                }
            };

            // Keep the walk strictly positive
            price = price.max(1.0);

            let timestamp = self.start_time + Duration::minutes(slot * interval_minutes);
            samples.push(PriceSample::new(to_price(price), timestamp));
            slot += 1;
        }

        samples
    }
}

fn to_price(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(4))
        .unwrap_or(Decimal::ONE)
}
