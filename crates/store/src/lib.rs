//! `orderdesk-store` — the transactional store contract and its backends.
//!
//! The store is an opaque collaborator: parameterized read queries plus named
//! atomic procedures. Multi-record cascades (schedule a delivery and advance
//! its order, complete a delivery and close its order) are all-or-nothing
//! inside the store; callers never see partial state. Lifecycle managers do
//! their own existence/eligibility checks first, so store errors surface only
//! for races and genuine persistence failures.

pub mod in_memory;
pub mod postgres;
pub mod query;
#[path = "trait.rs"]
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{
    DeliveryDetails, DeliveryFilter, DeliverySort, Interval, OrderFilter, OrderSort,
    OrderWithClient,
};
pub use r#trait::{CatalogStore, DeliveryStore, DirectoryStore, OrderStore, Store, StoreError};
