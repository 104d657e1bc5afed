//! `orderdesk-orders` — the order entity and its status state machine.

pub mod order;
pub mod status;

pub use order::{Order, OrderId};
pub use status::OrderStatus;
