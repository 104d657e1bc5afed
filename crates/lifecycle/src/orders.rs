//! Order lifecycle manager.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use orderdesk_core::{DomainError, DomainResult};
use orderdesk_directory::ClientId;
use orderdesk_orders::{Order, OrderId, OrderStatus};
use orderdesk_store::{OrderWithClient, Store};

use crate::map_store_error;

/// Drives orders through `EC -> PR -> LI -> SO` (with `AN` as the
/// cancellation branch). All status changes go through [`Self::transition`],
/// which enforces the transition table before touching the store.
#[derive(Clone)]
pub struct OrderLifecycle {
    store: Arc<dyn Store>,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Place a new order for an existing client. The store assigns the order
    /// number; status starts at `EC` with the creation instant stamped once.
    #[instrument(skip(self), err)]
    pub async fn create(&self, client_id: ClientId) -> DomainResult<OrderId> {
        self.store
            .fetch_client(client_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("client {client_id}")))?;

        let id = self
            .store
            .insert_order(client_id, Utc::now())
            .await
            .map_err(map_store_error)?;
        info!(order = %id, client = %client_id, "order placed");
        Ok(id)
    }

    /// Move an order to `target` if the transition table allows it from the
    /// current status. The store-side compare-and-set re-checks the current
    /// status, so of two racing callers exactly one wins.
    #[instrument(skip(self), err)]
    pub async fn transition(&self, id: OrderId, target: OrderStatus) -> DomainResult<()> {
        let order = self.fetch(id).await?;
        order.check_transition(target)?;
        self.store
            .advance_order(id, order.status, target)
            .await
            .map_err(map_store_error)?;
        info!(order = %id, from = %order.status, to = %target, "order transitioned");
        Ok(())
    }

    /// Cancel an order (`-> AN`); only legal from `EC` or `PR`.
    pub async fn cancel(&self, id: OrderId) -> DomainResult<()> {
        self.transition(id, OrderStatus::Cancelled).await
    }

    /// Resolve an order together with its client's display name.
    pub async fn get(&self, id: OrderId) -> DomainResult<OrderWithClient> {
        self.store
            .fetch_order_with_client(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("order {id}")))
    }

    async fn fetch(&self, id: OrderId) -> DomainResult<Order> {
        self.store
            .fetch_order(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("order {id}")))
    }
}
