//! In-memory store backend.
//!
//! Intended for tests/dev. A single `RwLock` over the whole state stands in
//! for the database transaction: a cascade holds the write guard across all
//! of its checks and writes, so it is observed either fully applied or not at
//! all, and compare-and-set procedures are serialized the same way row-level
//! locks would serialize them.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use orderdesk_catalog::{Article, ArticleId, ArticlePatch, NewArticle};
use orderdesk_delivery::{Delivery, DeliveryStatus};
use orderdesk_directory::{Client, ClientId, Personnel, PersonnelId};
use orderdesk_orders::{Order, OrderId, OrderStatus};

use crate::query::{
    matches_exact_ci, matches_substring_ci, DeliveryDetails, DeliveryFilter, DeliverySort,
    OrderFilter, OrderSort, OrderWithClient,
};
use crate::r#trait::{CatalogStore, DeliveryStore, DirectoryStore, OrderStore, StoreError};

#[derive(Debug, Default)]
struct State {
    articles: BTreeMap<i64, Article>,
    next_article: i64,
    clients: BTreeMap<i64, Client>,
    personnel: BTreeMap<i64, Personnel>,
    orders: BTreeMap<i64, Order>,
    next_order: i64,
    deliveries: BTreeMap<i64, Delivery>,
}

/// In-memory transactional store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    /// Seed a client record. Directory records are read-only through the
    /// trait contract, so fixtures go in through here.
    pub fn seed_client(&self, client: Client) {
        if let Ok(mut state) = self.state.write() {
            state.clients.insert(client.id.as_i64(), client);
        }
    }

    /// Seed a personnel record (see [`Self::seed_client`]).
    pub fn seed_personnel(&self, personnel: Personnel) {
        if let Ok(mut state) = self.state.write() {
            state.personnel.insert(personnel.id.as_i64(), personnel);
        }
    }

    fn order_row(state: &State, order: &Order) -> Result<OrderWithClient, StoreError> {
        let client = state.clients.get(&order.client_id.as_i64()).ok_or_else(|| {
            StoreError::Backend(format!(
                "order {} references missing client {}",
                order.id, order.client_id
            ))
        })?;
        Ok(OrderWithClient {
            order: order.clone(),
            client_name: client.display_name(),
        })
    }

    fn delivery_row(state: &State, delivery: &Delivery) -> Result<DeliveryDetails, StoreError> {
        let order = state
            .orders
            .get(&delivery.order_id.as_i64())
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "delivery references missing order {}",
                    delivery.order_id
                ))
            })?;
        let client = state.clients.get(&order.client_id.as_i64()).ok_or_else(|| {
            StoreError::Backend(format!(
                "order {} references missing client {}",
                order.id, order.client_id
            ))
        })?;
        let agent = state
            .personnel
            .get(&delivery.agent_id.as_i64())
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "delivery for order {} references missing agent {}",
                    delivery.order_id, delivery.agent_id
                ))
            })?;
        Ok(DeliveryDetails {
            delivery: delivery.clone(),
            client_id: client.id,
            client_name: client.display_name(),
            postal_code: client.postal_code.clone(),
            agent_name: agent.display_name(),
            order_status: order.status,
        })
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_article(&self, article: NewArticle) -> Result<ArticleId, StoreError> {
        let mut state = self.write()?;
        state.next_article += 1;
        let id = ArticleId::new(state.next_article);
        state.articles.insert(id.as_i64(), article.into_article(id));
        Ok(id)
    }

    async fn update_article(
        &self,
        id: ArticleId,
        patch: &ArticlePatch,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let article = state
            .articles
            .get_mut(&id.as_i64())
            .filter(|a| !a.deleted)
            .ok_or_else(|| StoreError::RowNotFound(format!("article {id}")))?;
        article
            .apply_patch(patch)
            .map_err(|e| StoreError::Backend(format!("unvalidated patch reached store: {e}")))
    }

    async fn soft_delete_article(&self, id: ArticleId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let article = state
            .articles
            .get_mut(&id.as_i64())
            .filter(|a| !a.deleted)
            .ok_or_else(|| StoreError::RowNotFound(format!("article {id}")))?;
        article.deleted = true;
        Ok(())
    }

    async fn fetch_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        Ok(self.read()?.articles.get(&id.as_i64()).cloned())
    }

    async fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let state = self.read()?;
        Ok(state
            .articles
            .values()
            .rev()
            .filter(|a| !a.deleted)
            .cloned()
            .collect())
    }

    async fn search_articles_by_designation(
        &self,
        needle: &str,
    ) -> Result<Vec<Article>, StoreError> {
        let state = self.read()?;
        let mut hits: Vec<Article> = state
            .articles
            .values()
            .filter(|a| !a.deleted && matches_substring_ci(&a.designation, needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.designation.to_lowercase().cmp(&b.designation.to_lowercase()));
        Ok(hits)
    }

    async fn search_articles_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Article>, StoreError> {
        let state = self.read()?;
        let mut hits: Vec<Article> = state
            .articles
            .values()
            .filter(|a| !a.deleted && matches_exact_ci(&a.category, category))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.designation.to_lowercase().cmp(&b.designation.to_lowercase()));
        Ok(hits)
    }

    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        let mut categories: Vec<String> = state
            .articles
            .values()
            .filter(|a| !a.deleted && !a.category.is_empty())
            .map(|a| a.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn fetch_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.read()?.clients.get(&id.as_i64()).cloned())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let state = self.read()?;
        let mut clients: Vec<Client> = state.clients.values().cloned().collect();
        clients.sort_by(|a, b| (&a.name, &a.surname).cmp(&(&b.name, &b.surname)));
        Ok(clients)
    }

    async fn fetch_personnel(&self, id: PersonnelId) -> Result<Option<Personnel>, StoreError> {
        Ok(self.read()?.personnel.get(&id.as_i64()).cloned())
    }

    async fn list_personnel(&self) -> Result<Vec<Personnel>, StoreError> {
        let state = self.read()?;
        let mut staff: Vec<Personnel> = state.personnel.values().cloned().collect();
        staff.sort_by(|a, b| (&a.name, &a.surname).cmp(&(&b.name, &b.surname)));
        Ok(staff)
    }

    async fn list_delivery_agents(&self) -> Result<Vec<Personnel>, StoreError> {
        let mut agents = self.list_personnel().await?;
        agents.retain(Personnel::is_delivery_agent);
        Ok(agents)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(
        &self,
        client_id: ClientId,
        created_at: DateTime<Utc>,
    ) -> Result<OrderId, StoreError> {
        let mut state = self.write()?;
        if !state.clients.contains_key(&client_id.as_i64()) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "client {client_id}"
            )));
        }
        state.next_order += 1;
        let id = OrderId::new(state.next_order);
        state
            .orders
            .insert(id.as_i64(), Order::placed(id, client_id, created_at));
        Ok(id)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id.as_i64()).cloned())
    }

    async fn fetch_order_with_client(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithClient>, StoreError> {
        let state = self.read()?;
        state
            .orders
            .get(&id.as_i64())
            .map(|order| Self::order_row(&state, order))
            .transpose()
    }

    async fn advance_order(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::RowNotFound(format!("order {id}")))?;
        if order.status != expected {
            return Err(StoreError::StaleState(format!(
                "order {id}: expected {expected}, found {}",
                order.status
            )));
        }
        order.status = next;
        Ok(())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderWithClient>, StoreError> {
        let state = self.read()?;
        let mut rows = Vec::new();
        for order in state.orders.values() {
            if filter.client.is_some_and(|c| c != order.client_id) {
                continue;
            }
            if filter.status.is_some_and(|s| s != order.status) {
                continue;
            }
            if let Some(interval) = &filter.created_within {
                if !interval.contains(order.created_at) {
                    continue;
                }
            }
            rows.push(Self::order_row(&state, order)?);
        }
        match filter.sort {
            OrderSort::IdDesc => rows.sort_by(|a, b| b.order.id.cmp(&a.order.id)),
            OrderSort::IdAsc => rows.sort_by(|a, b| a.order.id.cmp(&b.order.id)),
            OrderSort::CreatedDesc => {
                rows.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl DeliveryStore for InMemoryStore {
    async fn schedule_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let order_key = delivery.order_id.as_i64();

        // All checks happen before the first write so a failure leaves the
        // state untouched (the lock guard is the transaction boundary).
        let order_status = state
            .orders
            .get(&order_key)
            .map(|o| o.status)
            .ok_or_else(|| StoreError::RowNotFound(format!("order {}", delivery.order_id)))?;
        if order_status != OrderStatus::Ready {
            return Err(StoreError::StaleState(format!(
                "order {}: expected PR, found {order_status}",
                delivery.order_id
            )));
        }
        if state.deliveries.contains_key(&order_key) {
            return Err(StoreError::UniqueViolation(format!(
                "delivery for order {}",
                delivery.order_id
            )));
        }
        if !state.personnel.contains_key(&delivery.agent_id.as_i64()) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "personnel {}",
                delivery.agent_id
            )));
        }

        let mut record = delivery.clone();
        record.status = DeliveryStatus::initial();
        state.deliveries.insert(order_key, record);
        if let Some(order) = state.orders.get_mut(&order_key) {
            order.status = OrderStatus::InDelivery;
        }
        Ok(())
    }

    async fn fetch_delivery(&self, order_id: OrderId) -> Result<Option<Delivery>, StoreError> {
        Ok(self.read()?.deliveries.get(&order_id.as_i64()).cloned())
    }

    async fn fetch_delivery_details(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryDetails>, StoreError> {
        let state = self.read()?;
        state
            .deliveries
            .get(&order_id.as_i64())
            .map(|delivery| Self::delivery_row(&state, delivery))
            .transpose()
    }

    async fn update_delivery(
        &self,
        order_id: OrderId,
        scheduled_at: Option<DateTime<Utc>>,
        agent_id: Option<PersonnelId>,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if let Some(agent) = agent_id {
            if !state.personnel.contains_key(&agent.as_i64()) {
                return Err(StoreError::ForeignKeyViolation(format!("personnel {agent}")));
            }
        }
        let delivery = state
            .deliveries
            .get_mut(&order_id.as_i64())
            .ok_or_else(|| StoreError::RowNotFound(format!("delivery for order {order_id}")))?;
        if delivery.status.is_terminal() {
            return Err(StoreError::StaleState(format!(
                "delivery for order {order_id} is already delivered"
            )));
        }
        if let Some(at) = scheduled_at {
            delivery.scheduled_at = at;
        }
        if let Some(agent) = agent_id {
            delivery.agent_id = agent;
        }
        Ok(())
    }

    async fn advance_delivery(
        &self,
        order_id: OrderId,
        expected: DeliveryStatus,
        next: DeliveryStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let delivery = state
            .deliveries
            .get_mut(&order_id.as_i64())
            .ok_or_else(|| StoreError::RowNotFound(format!("delivery for order {order_id}")))?;
        if delivery.status != expected {
            return Err(StoreError::StaleState(format!(
                "delivery for order {order_id}: expected {expected}, found {}",
                delivery.status
            )));
        }
        delivery.status = next;
        Ok(())
    }

    async fn complete_delivery(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = order_id.as_i64();

        let delivery_status = state
            .deliveries
            .get(&key)
            .map(|d| d.status)
            .ok_or_else(|| StoreError::RowNotFound(format!("delivery for order {order_id}")))?;
        if delivery_status.is_terminal() {
            return Err(StoreError::StaleState(format!(
                "delivery for order {order_id} is already delivered"
            )));
        }
        let order_status = state
            .orders
            .get(&key)
            .map(|o| o.status)
            .ok_or_else(|| StoreError::RowNotFound(format!("order {order_id}")))?;
        if order_status != OrderStatus::InDelivery {
            return Err(StoreError::StaleState(format!(
                "order {order_id}: expected LI, found {order_status}"
            )));
        }

        if let Some(delivery) = state.deliveries.get_mut(&key) {
            delivery.status = DeliveryStatus::Delivered;
        }
        if let Some(order) = state.orders.get_mut(&key) {
            order.status = OrderStatus::Completed;
        }
        Ok(())
    }

    async fn cancel_delivery(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = order_id.as_i64();

        let delivery_status = state
            .deliveries
            .get(&key)
            .map(|d| d.status)
            .ok_or_else(|| StoreError::RowNotFound(format!("delivery for order {order_id}")))?;
        if delivery_status.is_terminal() {
            return Err(StoreError::StaleState(format!(
                "delivery for order {order_id} is already delivered"
            )));
        }
        let order_status = state
            .orders
            .get(&key)
            .map(|o| o.status)
            .ok_or_else(|| StoreError::RowNotFound(format!("order {order_id}")))?;
        if order_status != OrderStatus::InDelivery {
            return Err(StoreError::StaleState(format!(
                "order {order_id}: expected LI, found {order_status}"
            )));
        }

        state.deliveries.remove(&key);
        if let Some(order) = state.orders.get_mut(&key) {
            order.status = OrderStatus::Ready;
        }
        Ok(())
    }

    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
    ) -> Result<Vec<DeliveryDetails>, StoreError> {
        let state = self.read()?;
        let mut rows = Vec::new();
        for delivery in state.deliveries.values() {
            if filter.agent.is_some_and(|a| a != delivery.agent_id) {
                continue;
            }
            if let Some(interval) = &filter.scheduled_within {
                if !interval.contains(delivery.scheduled_at) {
                    continue;
                }
            }
            let row = Self::delivery_row(&state, delivery)?;
            if filter
                .postal_code
                .as_deref()
                .is_some_and(|pc| row.postal_code != pc)
            {
                continue;
            }
            rows.push(row);
        }
        match filter.sort {
            DeliverySort::ScheduledDesc => {
                rows.sort_by(|a, b| b.delivery.scheduled_at.cmp(&a.delivery.scheduled_at));
            }
            DeliverySort::OrderIdAsc => {
                rows.sort_by(|a, b| a.delivery.order_id.cmp(&b.delivery.order_id));
            }
        }
        Ok(rows)
    }
}
