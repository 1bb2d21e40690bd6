use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected basket configuration. A manager is never built from one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_entries must be at least 1")]
    ZeroMaxEntries,

    #[error("{field} must not be negative (got {value})")]
    NegativeDistance { field: &'static str, value: Decimal },

    #[error("trailing stop enabled but stop distance is {0}; it must be positive")]
    TrailingStopDistance(Decimal),

    #[error("money management exponent must be positive (got {0})")]
    NonPositiveExponent(Decimal),

    #[error("base volume must be positive (got {0})")]
    NonPositiveBaseVolume(Decimal),

    #[error("equity stop risk percent must be within (0, 100] (got {0})")]
    RiskPercentOutOfRange(Decimal),

    #[error("basket timeout must be positive")]
    NonPositiveTimeout,

    #[error("invalid volume rules: {0}")]
    VolumeRules(String),

    #[error("profit threshold must be positive (got {0})")]
    NonPositiveProfitThreshold(Decimal),

    #[error("backtest interval must be at least one minute (got {0})")]
    NonPositiveInterval(i64),
}

/// Price sample refused by the manager. State is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("price must be positive (got {0})")]
    NonPositivePrice(Decimal),

    #[error("sample at {got} is earlier than previous sample at {previous}")]
    TimestampRegression {
        previous: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}
