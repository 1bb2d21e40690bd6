// Position sizing module
pub mod money_management;
pub mod rounding;

pub use money_management::{MoneyManagement, SizingState};
pub use rounding::{RoundingFn, VolumeRules};
