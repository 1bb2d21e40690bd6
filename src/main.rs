use clap::Parser;
use gridbasket::backtest::{BacktestMetrics, BacktestRunner, MarketScenario, SyntheticDataGenerator};
use gridbasket::config::load_config;
use gridbasket::Result;
use tracing_subscriber::EnvFilter;

/// Grid/martingale basket backtester
#[derive(Debug, Parser)]
#[command(name = "gridbasket", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Scenario to run (all scenarios when omitted)
    #[arg(short, long, value_enum)]
    scenario: Option<MarketScenario>,

    /// Number of price samples per scenario (overrides config)
    #[arg(long)]
    samples: Option<usize>,

    /// Minutes between samples (overrides config)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    interval_minutes: Option<i64>,

    /// RNG seed for synthetic data (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Print metrics as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging();

    let app_config = load_config(args.config.as_deref())?;
    let basket_config = app_config.basket.to_basket_config()?;

    let samples = args.samples.unwrap_or(app_config.backtest.samples);
    let interval = args
        .interval_minutes
        .unwrap_or(app_config.backtest.interval_minutes);
    let seed = args.seed.unwrap_or(app_config.backtest.seed);

    tracing::info!("🚀 gridbasket backtest starting");
    tracing::info!("  Pip step: {}", basket_config.pip_step);
    tracing::info!("  Max entries: {}", basket_config.max_entries);
    tracing::info!("  Money management: {:?}", basket_config.money_management);
    tracing::info!("  Initial equity: ${:.2}", app_config.backtest.initial_equity);

    let runner = BacktestRunner::new(app_config.backtest.initial_equity, basket_config);

    let scenarios: Vec<MarketScenario> = match args.scenario {
        Some(scenario) => vec![scenario],
        None => MarketScenario::ALL.to_vec(),
    };

    let mut all_metrics = Vec::new();

    for scenario in scenarios {
        let mut generator = SyntheticDataGenerator::new(seed);
        let data = generator.generate(scenario, samples, interval);

        let result = if args.json {
            runner.run(&data)
        } else {
            runner.run_and_report(&data, scenario.label())
        };

        match result {
            Ok(metrics) => all_metrics.push((scenario, metrics)),
            Err(e) => eprintln!("❌ Backtest failed for {}: {}", scenario, e),
        }
    }

    if args.json {
        let by_scenario: Vec<_> = all_metrics
            .iter()
            .map(|(scenario, metrics)| serde_json::json!({ "scenario": scenario, "metrics": metrics }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&by_scenario)?);
    } else {
        print_summary_comparison(&all_metrics);
    }

    Ok(())
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridbasket=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_summary_comparison(results: &[(MarketScenario, BacktestMetrics)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<32} {:>10} {:>9} {:>8} {:>7} {:>8}",
        "Scenario", "P&L", "Return%", "Baskets", "Win%", "MaxDD%"
    );
    println!("{}", "─".repeat(79));

    for (scenario, metrics) in results {
        println!(
            "{:<32} {:>10.2} {:>9.2} {:>8} {:>7.1} {:>8.2}",
            scenario.label(),
            metrics.total_pnl,
            metrics.total_return_pct,
            metrics.total_baskets,
            metrics.win_rate,
            metrics.max_drawdown_pct
        );
    }

    if let Some((best, m)) = results.iter().max_by_key(|(_, m)| m.total_return_pct) {
        println!("\n🏆 Best Scenario: {} ({:+.2}%)", best, m.total_return_pct);
    }
    if let Some((worst, m)) = results.iter().min_by_key(|(_, m)| m.total_return_pct) {
        println!("⚠️  Worst Scenario: {} ({:+.2}%)", worst, m.total_return_pct);
    }

    println!("\n═══════════════════════════════════════════════════════\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_must_be_positive() {
        assert!(Args::try_parse_from(["gridbasket", "--interval-minutes", "0"]).is_err());
        assert!(Args::try_parse_from(["gridbasket", "--interval-minutes", "-5"]).is_err());

        let args = Args::try_parse_from(["gridbasket", "--interval-minutes", "15"]).unwrap();
        assert_eq!(args.interval_minutes, Some(15));
    }
}
