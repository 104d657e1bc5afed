//! `orderdesk-directory` — client and personnel records.
//!
//! Read-only from the lifecycle core's perspective: records are referenced by
//! orders and deliveries but maintained elsewhere.

pub mod client;
pub mod personnel;

pub use client::{Client, ClientId};
pub use personnel::{Personnel, PersonnelId, DELIVERY_ROLE_MARKER};
