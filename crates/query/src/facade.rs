//! Read-only query façade.
//!
//! Every listing is a parameterized store read with a fixed default ordering;
//! calendar-day filters go through [`crate::day::day_interval`] so the
//! boundaries are exact half-open instants in the configured zone, never a
//! date-truncation comparison.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};

use orderdesk_catalog::Article;
use orderdesk_core::DomainResult;
use orderdesk_directory::{Client, ClientId, Personnel, PersonnelId};
use orderdesk_orders::OrderStatus;
use orderdesk_store::{
    DeliveryDetails, DeliveryFilter, DeliverySort, OrderFilter, OrderSort, OrderWithClient, Store,
};

use crate::day::day_interval;

#[derive(Clone)]
pub struct QueryFacade {
    store: Arc<dyn Store>,
    /// Zone in which calendar-day filters are interpreted.
    zone: FixedOffset,
}

impl QueryFacade {
    pub fn new(store: Arc<dyn Store>, zone: FixedOffset) -> Self {
        Self { store, zone }
    }

    fn map_err(e: orderdesk_store::StoreError) -> orderdesk_core::DomainError {
        orderdesk_core::DomainError::store(e.to_string())
    }

    // Orders

    /// All orders, newest order number first.
    pub async fn orders(&self) -> DomainResult<Vec<OrderWithClient>> {
        self.list_orders(OrderFilter::default()).await
    }

    /// A client's orders, most recently placed first.
    pub async fn orders_for_client(&self, client: ClientId) -> DomainResult<Vec<OrderWithClient>> {
        self.list_orders(OrderFilter {
            client: Some(client),
            sort: OrderSort::CreatedDesc,
            ..Default::default()
        })
        .await
    }

    /// Orders placed on a calendar day, ascending order number.
    pub async fn orders_on(&self, day: NaiveDate) -> DomainResult<Vec<OrderWithClient>> {
        self.list_orders(OrderFilter {
            created_within: Some(day_interval(day, self.zone)?),
            sort: OrderSort::IdAsc,
            ..Default::default()
        })
        .await
    }

    /// Orders awaiting a delivery (status `PR`), newest first.
    pub async fn orders_ready(&self) -> DomainResult<Vec<OrderWithClient>> {
        self.orders_with_status(OrderStatus::Ready).await
    }

    pub async fn orders_with_status(
        &self,
        status: OrderStatus,
    ) -> DomainResult<Vec<OrderWithClient>> {
        self.list_orders(OrderFilter {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    async fn list_orders(&self, filter: OrderFilter) -> DomainResult<Vec<OrderWithClient>> {
        self.store.list_orders(&filter).await.map_err(Self::map_err)
    }

    // Deliveries

    /// All deliveries, most recently scheduled first.
    pub async fn deliveries(&self) -> DomainResult<Vec<DeliveryDetails>> {
        self.list_deliveries(DeliveryFilter::default()).await
    }

    /// Deliveries assigned to one agent.
    pub async fn deliveries_for_agent(
        &self,
        agent: PersonnelId,
    ) -> DomainResult<Vec<DeliveryDetails>> {
        self.list_deliveries(DeliveryFilter {
            agent: Some(agent),
            ..Default::default()
        })
        .await
    }

    /// Deliveries to clients in one postal code.
    pub async fn deliveries_for_postal_code(
        &self,
        postal_code: &str,
    ) -> DomainResult<Vec<DeliveryDetails>> {
        self.list_deliveries(DeliveryFilter {
            postal_code: Some(postal_code.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Deliveries scheduled on a calendar day, ascending order number.
    pub async fn deliveries_on(&self, day: NaiveDate) -> DomainResult<Vec<DeliveryDetails>> {
        self.list_deliveries(DeliveryFilter {
            scheduled_within: Some(day_interval(day, self.zone)?),
            sort: DeliverySort::OrderIdAsc,
            ..Default::default()
        })
        .await
    }

    async fn list_deliveries(&self, filter: DeliveryFilter) -> DomainResult<Vec<DeliveryDetails>> {
        self.store
            .list_deliveries(&filter)
            .await
            .map_err(Self::map_err)
    }

    // Articles

    /// Non-deleted articles, newest reference first.
    pub async fn articles(&self) -> DomainResult<Vec<Article>> {
        self.store.list_articles().await.map_err(Self::map_err)
    }

    /// Case-insensitive designation substring search, designation ascending.
    pub async fn articles_by_designation(&self, needle: &str) -> DomainResult<Vec<Article>> {
        self.store
            .search_articles_by_designation(needle)
            .await
            .map_err(Self::map_err)
    }

    /// Case-insensitive exact category match, designation ascending.
    pub async fn articles_by_category(&self, category: &str) -> DomainResult<Vec<Article>> {
        self.store
            .search_articles_by_category(category)
            .await
            .map_err(Self::map_err)
    }

    /// Distinct categories of non-deleted articles, ascending.
    pub async fn categories(&self) -> DomainResult<Vec<String>> {
        self.store.list_categories().await.map_err(Self::map_err)
    }

    // Directory

    pub async fn clients(&self) -> DomainResult<Vec<Client>> {
        self.store.list_clients().await.map_err(Self::map_err)
    }

    pub async fn client(&self, id: ClientId) -> DomainResult<Client> {
        self.store
            .fetch_client(id)
            .await
            .map_err(Self::map_err)?
            .ok_or_else(|| orderdesk_core::DomainError::not_found(format!("client {id}")))
    }

    pub async fn personnel(&self) -> DomainResult<Vec<Personnel>> {
        self.store.list_personnel().await.map_err(Self::map_err)
    }

    pub async fn personnel_member(&self, id: PersonnelId) -> DomainResult<Personnel> {
        self.store
            .fetch_personnel(id)
            .await
            .map_err(Self::map_err)?
            .ok_or_else(|| orderdesk_core::DomainError::not_found(format!("personnel {id}")))
    }

    /// Staff eligible to carry deliveries.
    pub async fn delivery_agents(&self) -> DomainResult<Vec<Personnel>> {
        self.store
            .list_delivery_agents()
            .await
            .map_err(Self::map_err)
    }
}
