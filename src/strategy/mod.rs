// Entry direction signals
pub mod last_two_closes;

pub use last_two_closes::LastTwoCloses;

use crate::models::{Direction, PriceSample};

/// Decides which way a new basket should open.
///
/// The manager feeds every accepted sample through `observe`, open basket
/// or not, and asks for a `direction` only while flat.
pub trait DirectionSignal: Send + Sync {
    /// Record a new sample
    fn observe(&mut self, sample: &PriceSample);

    /// Direction for a new basket, `None` when the signal has no opinion yet
    fn direction(&self) -> Option<Direction>;

    /// Get signal name
    fn name(&self) -> &str;
}

/// Always opens the same way. Handy for hosts that pick direction elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct FixedDirection(pub Direction);

impl DirectionSignal for FixedDirection {
    fn observe(&mut self, _sample: &PriceSample) {}

    fn direction(&self) -> Option<Direction> {
        if self.0.is_flat() {
            None
        } else {
            Some(self.0)
        }
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}
