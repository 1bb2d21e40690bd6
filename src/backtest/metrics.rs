use crate::basket::ClosedBasket;
use crate::models::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Record of a single closed basket for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketRecord {
    pub basket_id: Uuid,
    pub direction: Direction,
    pub entries: usize,
    pub total_volume: Decimal,
    pub average_price: Decimal,
    pub exit_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub holding_period_minutes: i64,
    pub close_reason: String,
    pub pnl: Decimal,
}

impl BasketRecord {
    pub fn from_closed(closed: &ClosedBasket) -> Option<Self> {
        let opened_at = closed.basket.opened_at()?;

        Some(Self {
            basket_id: closed.basket.id(),
            direction: closed.basket.direction(),
            entries: closed.basket.trade_count(),
            total_volume: closed.basket.total_volume(),
            average_price: closed.basket.average_price(),
            exit_price: closed.exit_price,
            opened_at,
            closed_at: closed.closed_at,
            holding_period_minutes: (closed.closed_at - opened_at).num_minutes(),
            close_reason: closed.reason.to_string(),
            pnl: closed.pnl,
        })
    }
}

/// Complete backtest performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // P&L Metrics
    pub total_pnl: Decimal,
    pub total_return_pct: Decimal,
    pub initial_equity: Decimal,
    pub final_equity: Decimal,

    // Basket Statistics
    pub total_baskets: usize,
    pub winning_baskets: usize,
    pub losing_baskets: usize,
    pub win_rate: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub max_entries_used: usize,
    pub avg_entries: Decimal,
    pub close_reasons: BTreeMap<String, usize>,

    // Risk Metrics
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,

    // Basket Records
    pub baskets: Vec<BasketRecord>,
}

impl BacktestMetrics {
    /// Calculate metrics from closed baskets and the equity curve extremes
    pub fn from_records(
        baskets: Vec<BasketRecord>,
        initial_equity: Decimal,
        final_equity: Decimal,
        max_drawdown: Decimal,
        max_drawdown_pct: Decimal,
    ) -> Self {
        let total_baskets = baskets.len();
        let total_pnl: Decimal = baskets.iter().map(|b| b.pnl).sum();

        let total_return_pct = if initial_equity > Decimal::ZERO {
            ((final_equity - initial_equity) / initial_equity * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let winning_baskets = baskets.iter().filter(|b| b.pnl > Decimal::ZERO).count();
        let losing_baskets = total_baskets - winning_baskets;

        let win_rate = if total_baskets > 0 {
            (Decimal::from(winning_baskets) / Decimal::from(total_baskets) * Decimal::ONE_HUNDRED)
                .round_dp(2)
        } else {
            Decimal::ZERO
        };

        let largest_win = baskets
            .iter()
            .map(|b| b.pnl)
            .filter(|p| *p > Decimal::ZERO)
            .max()
            .unwrap_or(Decimal::ZERO);
        let largest_loss = baskets
            .iter()
            .map(|b| b.pnl)
            .filter(|p| *p < Decimal::ZERO)
            .min()
            .unwrap_or(Decimal::ZERO);

        let max_entries_used = baskets.iter().map(|b| b.entries).max().unwrap_or(0);
        let avg_entries = if total_baskets > 0 {
            let total: usize = baskets.iter().map(|b| b.entries).sum();
            (Decimal::from(total) / Decimal::from(total_baskets)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let mut close_reasons = BTreeMap::new();
        for basket in &baskets {
            *close_reasons.entry(basket.close_reason.clone()).or_insert(0) += 1;
        }

        Self {
            total_pnl,
            total_return_pct,
            initial_equity,
            final_equity,
            total_baskets,
            winning_baskets,
            losing_baskets,
            win_rate,
            largest_win,
            largest_loss,
            max_entries_used,
            avg_entries,
            close_reasons,
            max_drawdown,
            max_drawdown_pct,
            baskets,
        }
    }

    /// Print formatted report
    pub fn print_report(&self) {
        println!("\n═══════════════════════════════════════════════════════");
        println!("                 BACKTEST REPORT");
        println!("═══════════════════════════════════════════════════════");

        println!("\n💰 P&L");
        println!("   Initial Equity:   ${:.2}", self.initial_equity);
        println!("   Final Equity:     ${:.2}", self.final_equity);
        println!(
            "   Total P&L:        ${:.2} ({:+.2}%)",
            self.total_pnl, self.total_return_pct
        );

        println!("\n🧺 Baskets");
        println!("   Closed:           {}", self.total_baskets);
        println!(
            "   Won / Lost:       {} / {} ({:.1}% win rate)",
            self.winning_baskets, self.losing_baskets, self.win_rate
        );
        println!("   Largest Win:      ${:.2}", self.largest_win);
        println!("   Largest Loss:     ${:.2}", self.largest_loss);
        println!(
            "   Entries:          avg {:.2}, max {}",
            self.avg_entries, self.max_entries_used
        );
        for (reason, count) in &self.close_reasons {
            println!("   {:<18}{}", format!("{}:", reason), count);
        }

        println!("\n⚠️  Risk");
        println!(
            "   Max Drawdown:     ${:.2} ({:.2}%)",
            self.max_drawdown, self.max_drawdown_pct
        );
        println!("═══════════════════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn record(pnl: Decimal, entries: usize, reason: &str) -> BasketRecord {
        let opened_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        BasketRecord {
            basket_id: Uuid::new_v4(),
            direction: Direction::Long,
            entries,
            total_volume: dec!(1),
            average_price: dec!(100),
            exit_price: dec!(100) + pnl,
            opened_at,
            closed_at: opened_at + Duration::hours(2),
            holding_period_minutes: 120,
            close_reason: reason.to_string(),
            pnl,
        }
    }

    #[test]
    fn test_metrics_from_records() {
        let records = vec![
            record(dec!(20), 1, "take profit"),
            record(dec!(-50), 4, "stop loss"),
            record(dec!(10), 2, "take profit"),
        ];

        let metrics =
            BacktestMetrics::from_records(records, dec!(1000), dec!(980), dec!(60), dec!(5.77));

        assert_eq!(metrics.total_baskets, 3);
        assert_eq!(metrics.total_pnl, dec!(-20));
        assert_eq!(metrics.total_return_pct, dec!(-2));
        assert_eq!(metrics.winning_baskets, 2);
        assert_eq!(metrics.losing_baskets, 1);
        assert_eq!(metrics.win_rate, dec!(66.67));
        assert_eq!(metrics.largest_win, dec!(20));
        assert_eq!(metrics.largest_loss, dec!(-50));
        assert_eq!(metrics.max_entries_used, 4);
        assert_eq!(metrics.avg_entries, dec!(2.33));
        assert_eq!(metrics.close_reasons.get("take profit"), Some(&2));
        assert_eq!(metrics.close_reasons.get("stop loss"), Some(&1));
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = BacktestMetrics::from_records(
            Vec::new(),
            dec!(1000),
            dec!(1000),
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(metrics.total_baskets, 0);
        assert_eq!(metrics.win_rate, Decimal::ZERO);
        assert_eq!(metrics.total_return_pct, Decimal::ZERO);
    }
}
