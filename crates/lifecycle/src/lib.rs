//! `orderdesk-lifecycle` — the write-side services.
//!
//! Each manager validates existence, eligibility and state against the domain
//! rules before calling a mutating store procedure, so the store only ever
//! rejects a pre-validated call when a concurrent writer got there first.

pub mod catalog;
pub mod delivery;
pub mod orders;

pub use catalog::CatalogService;
pub use delivery::DeliveryLifecycle;
pub use orders::OrderLifecycle;

use orderdesk_core::DomainError;
use orderdesk_store::StoreError;

/// Map store failures into the domain taxonomy.
///
/// `StaleState` means our own pre-checks passed but a concurrent writer
/// changed the row in between, so it surfaces as a conflict rather than an
/// invalid transition (the non-race cases were already rejected upstream).
pub(crate) fn map_store_error(err: StoreError) -> DomainError {
    match err {
        StoreError::RowNotFound(msg) => DomainError::not_found(msg),
        StoreError::StaleState(msg) => DomainError::conflict(msg),
        StoreError::UniqueViolation(msg) => DomainError::conflict(msg),
        StoreError::ForeignKeyViolation(msg) => DomainError::not_found(msg),
        StoreError::Backend(msg) => DomainError::store(msg),
    }
}
