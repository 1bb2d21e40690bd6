// Grid/martingale basket management
pub mod manager;
pub mod state;

pub use manager::{BasketConfig, BasketManager};
pub use state::{Basket, ClosedBasket, Entry};
