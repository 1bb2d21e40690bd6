// Risk management module
pub mod equity_stop;
pub mod trailing;

pub use equity_stop::{EquityPeak, EquityStopConfig};
pub use trailing::{TrailingConfig, TrailingStop};
