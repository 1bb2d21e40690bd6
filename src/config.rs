//! Application configuration
//!
//! Priority (highest to lowest):
//! 1. Environment variables (prefixed with `GRIDBASKET__`, `__` between sections)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::basket::BasketConfig;
use crate::error::ConfigError;
use crate::risk::{EquityStopConfig, TrailingConfig};
use crate::sizing::{MoneyManagement, VolumeRules};
use anyhow::Context;
use chrono::Duration;
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub basket: BasketSettings,
    pub backtest: BacktestSettings,
}

/// File form of [`BasketConfig`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BasketSettings {
    pub pip_step: Decimal,
    pub take_profit_distance: Decimal,
    pub stop_loss_distance: Decimal,
    pub trailing: Option<TrailingConfig>,
    pub max_entries: usize,
    pub money_management: MoneyManagement,
    pub equity_stop: Option<EquityStopConfig>,
    pub timeout_minutes: Option<i64>,
    pub base_volume: Decimal,
    pub profit_threshold: Option<Decimal>,
    pub volume_rules: VolumeRules,
}

impl Default for BasketSettings {
    fn default() -> Self {
        Self {
            pip_step: Decimal::new(15, 1),            // 1.5
            take_profit_distance: Decimal::new(1, 0), // 1.0
            stop_loss_distance: Decimal::ZERO,
            trailing: None,
            max_entries: 6,
            money_management: MoneyManagement::Geometric {
                exponent: Decimal::new(15, 1),
            },
            equity_stop: Some(EquityStopConfig {
                risk_percent: Decimal::new(20, 0),
            }),
            timeout_minutes: Some(24 * 60),
            base_volume: Decimal::new(1, 1), // 0.1
            profit_threshold: None,
            volume_rules: VolumeRules::default(),
        }
    }
}

impl BasketSettings {
    /// Convert into a validated basket configuration
    pub fn to_basket_config(&self) -> Result<BasketConfig, ConfigError> {
        let config = BasketConfig {
            pip_step: self.pip_step,
            take_profit_distance: self.take_profit_distance,
            stop_loss_distance: self.stop_loss_distance,
            trailing: self.trailing,
            max_entries: self.max_entries,
            money_management: self.money_management,
            equity_stop: self.equity_stop,
            timeout: self.timeout_minutes.map(Duration::minutes),
            base_volume: self.base_volume,
            profit_threshold: self.profit_threshold,
            volume_rules: self.volume_rules,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_equity: Decimal,
    pub samples: usize,
    pub interval_minutes: i64,
    pub seed: u64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_equity: Decimal::new(10_000, 0),
            samples: 2_000,
            interval_minutes: 5,
            seed: 42,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_minutes < 1 {
            return Err(ConfigError::NonPositiveInterval(self.interval_minutes));
        }
        Ok(())
    }
}

/// Load configuration from an optional TOML file and the environment
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if !Path::new(path).exists() {
            anyhow::bail!("Config file not found: {}", path);
        }
        builder = builder.add_source(File::with_name(path));
    }

    builder = builder.add_source(
        Environment::with_prefix("GRIDBASKET")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build().context("Failed to build configuration")?;

    let app_config: AppConfig = config
        .try_deserialize()
        .context("Failed to parse configuration")?;
    app_config.backtest.validate()?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = BasketSettings::default();
        let config = settings.to_basket_config().unwrap();
        assert_eq!(config.timeout, Some(Duration::minutes(1440)));
        assert_eq!(config.max_entries, 6);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = BasketSettings {
            max_entries: 0,
            ..BasketSettings::default()
        };
        assert_eq!(
            settings.to_basket_config().unwrap_err(),
            ConfigError::ZeroMaxEntries
        );
    }

    #[test]
    fn test_non_positive_interval_rejected() {
        for interval_minutes in [0, -5] {
            let settings = BacktestSettings {
                interval_minutes,
                ..BacktestSettings::default()
            };
            assert_eq!(
                settings.validate(),
                Err(ConfigError::NonPositiveInterval(interval_minutes))
            );
        }
        assert!(BacktestSettings::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_config(Some("/nonexistent/gridbasket.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("gridbasket-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[basket]
pip_step = 2.5
max_entries = 4
timeout_minutes = 60

[basket.money_management]
mode = "recover_last_loss"
exponent = 2

[basket.trailing]
start_distance = 3
stop_distance = 1

[backtest]
samples = 300
"#
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.basket.pip_step, dec!(2.5));
        assert_eq!(config.basket.max_entries, 4);
        assert_eq!(
            config.basket.money_management,
            MoneyManagement::RecoverLastLoss { exponent: dec!(2) }
        );
        assert_eq!(
            config.basket.trailing,
            Some(TrailingConfig {
                start_distance: dec!(3),
                stop_distance: dec!(1),
            })
        );
        // Untouched fields keep their defaults
        assert_eq!(config.basket.base_volume, dec!(0.1));
        assert_eq!(config.backtest.samples, 300);
        assert_eq!(config.backtest.seed, 42);

        assert!(config.basket.to_basket_config().is_ok());
    }
}
