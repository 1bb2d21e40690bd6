// Core modules
pub mod backtest;
pub mod basket;
pub mod config;
pub mod error;
pub mod models;
pub mod risk;
pub mod sizing;
pub mod strategy;

// Re-export commonly used types
pub use basket::{Basket, BasketConfig, BasketManager, ClosedBasket, Entry};
pub use error::{ConfigError, SampleError};
pub use models::*;
pub use strategy::DirectionSignal;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
