//! Store operation contract.
//!
//! One trait per data owner, plus the [`Store`] umbrella the service layer
//! consumes. Every mutation is a named procedure with all-or-nothing
//! semantics; every read is a parameterized query returning a row set.
//! Concurrent writers racing on the same order are arbitrated here:
//! compare-and-set procedures fail with [`StoreError::StaleState`] for the
//! loser, and the service layer translates that into its error taxonomy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use orderdesk_catalog::{Article, ArticleId, ArticlePatch, NewArticle};
use orderdesk_delivery::{Delivery, DeliveryStatus};
use orderdesk_directory::{Client, ClientId, Personnel, PersonnelId};
use orderdesk_orders::{Order, OrderId, OrderStatus};

use crate::query::{DeliveryDetails, DeliveryFilter, OrderFilter, OrderWithClient};

/// Store operation error.
///
/// Infrastructure-level failures only; the service layer maps these into the
/// domain taxonomy (stale state becomes an invalid transition or a conflict,
/// anything unclassified surfaces as an opaque store failure).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist (or is soft-deleted where that counts).
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// A compare-and-set found the row in a different state than expected;
    /// a concurrent writer has already advanced it.
    #[error("stale state: {0}")]
    StaleState(String),

    /// A uniqueness constraint was violated (e.g. second delivery for an order).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist at the lowest level.
    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// Unclassified backend failure (connectivity, corruption, poisoned lock).
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Catalog reads and mutations.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a new article; the store assigns and returns the reference.
    async fn insert_article(&self, article: NewArticle) -> Result<ArticleId, StoreError>;

    /// Apply a partial update. Fails with `RowNotFound` if the reference is
    /// unknown or the article is soft-deleted.
    async fn update_article(&self, id: ArticleId, patch: &ArticlePatch)
        -> Result<(), StoreError>;

    /// Flip the soft-delete flag. Fails with `RowNotFound` if absent or
    /// already deleted.
    async fn soft_delete_article(&self, id: ArticleId) -> Result<(), StoreError>;

    /// Direct lookup by reference; resolves soft-deleted articles too.
    async fn fetch_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;

    /// Non-deleted articles, newest reference first.
    async fn list_articles(&self) -> Result<Vec<Article>, StoreError>;

    /// Case-insensitive substring search over non-deleted designations,
    /// sorted by designation.
    async fn search_articles_by_designation(
        &self,
        needle: &str,
    ) -> Result<Vec<Article>, StoreError>;

    /// Case-insensitive exact category match over non-deleted articles,
    /// sorted by designation.
    async fn search_articles_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Article>, StoreError>;

    /// Distinct non-empty categories of non-deleted articles, ascending.
    async fn list_categories(&self) -> Result<Vec<String>, StoreError>;
}

/// Client and personnel reads (read-only in this core).
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn fetch_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;

    /// All clients, sorted by name then surname.
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    async fn fetch_personnel(&self, id: PersonnelId) -> Result<Option<Personnel>, StoreError>;

    /// All staff, sorted by name then surname.
    async fn list_personnel(&self) -> Result<Vec<Personnel>, StoreError>;

    /// Staff whose role label carries the delivery marker.
    async fn list_delivery_agents(&self) -> Result<Vec<Personnel>, StoreError>;
}

/// Order reads and mutations.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order in its initial status; the store assigns and
    /// returns the order number. Fails with `ForeignKeyViolation` if the
    /// client does not exist.
    async fn insert_order(
        &self,
        client_id: ClientId,
        created_at: DateTime<Utc>,
    ) -> Result<OrderId, StoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_with_client(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithClient>, StoreError>;

    /// Compare-and-set status update. Fails with `StaleState` when the row is
    /// no longer in `expected`, which serializes concurrent transitions.
    async fn advance_order(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), StoreError>;

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderWithClient>, StoreError>;
}

/// Delivery reads and mutations, including the cross-entity cascades.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Atomic procedure: advance the linked order `PR -> LI` and insert the
    /// delivery in its initial status. Fails with `RowNotFound` (order
    /// absent), `StaleState` (order not ready) or `UniqueViolation` (delivery
    /// already exists); on failure neither write is visible.
    async fn schedule_delivery(&self, delivery: &Delivery) -> Result<(), StoreError>;

    async fn fetch_delivery(&self, order_id: OrderId) -> Result<Option<Delivery>, StoreError>;

    async fn fetch_delivery_details(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryDetails>, StoreError>;

    /// Partial update of scheduled date and/or agent. Fails with `StaleState`
    /// once the delivery is delivered.
    async fn update_delivery(
        &self,
        order_id: OrderId,
        scheduled_at: Option<DateTime<Utc>>,
        agent_id: Option<PersonnelId>,
    ) -> Result<(), StoreError>;

    /// Compare-and-set delivery status update.
    async fn advance_delivery(
        &self,
        order_id: OrderId,
        expected: DeliveryStatus,
        next: DeliveryStatus,
    ) -> Result<(), StoreError>;

    /// Atomic procedure: mark the delivery delivered and advance the linked
    /// order `LI -> SO`. Fails with `StaleState` if the delivery is already
    /// delivered or the order is not in delivery.
    async fn complete_delivery(&self, order_id: OrderId) -> Result<(), StoreError>;

    /// Atomic procedure: remove the delivery binding and revert the linked
    /// order `LI -> PR`. Fails with `StaleState` if the delivery is already
    /// delivered.
    async fn cancel_delivery(&self, order_id: OrderId) -> Result<(), StoreError>;

    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
    ) -> Result<Vec<DeliveryDetails>, StoreError>;
}

/// Umbrella trait for the whole transactional store.
pub trait Store: CatalogStore + DirectoryStore + OrderStore + DeliveryStore {}

impl<S> Store for S where S: CatalogStore + DirectoryStore + OrderStore + DeliveryStore {}
