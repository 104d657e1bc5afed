//! `orderdesk-delivery` — the delivery record and its status state machine.
//!
//! A delivery is the dispatch record binding a ready order to an agent, a
//! scheduled date and a payment mode. There is at most one per order, and its
//! lifecycle is coupled to (but distinct from) the order's.

pub mod delivery;
pub mod status;

pub use delivery::Delivery;
pub use status::DeliveryStatus;
