//! Domain types for klinelab

pub mod bar;
pub mod fill;
pub mod order;
pub mod position;

pub use bar::Bar;
pub use fill::Fill;
pub use order::{Order, OrderId, OrderSide, OrderStatus};
pub use position::Position;
