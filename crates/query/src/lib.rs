//! `orderdesk-query` — the read side.
//!
//! Listings and searches over the store, with fixed default orderings and
//! exact calendar-day semantics in a configured fixed-offset zone.

pub mod day;
pub mod facade;

pub use day::{day_interval, parse_day};
pub use facade::QueryFacade;
