//! Delivery lifecycle manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use orderdesk_core::{DomainError, DomainResult};
use orderdesk_delivery::{Delivery, DeliveryStatus};
use orderdesk_directory::PersonnelId;
use orderdesk_orders::{OrderId, OrderStatus};
use orderdesk_store::{DeliveryDetails, Store};

use crate::map_store_error;

/// Drives deliveries through `EP -> EL -> LV` and keeps the linked order in
/// step: scheduling advances the order to `LI`, completion closes it at `SO`,
/// cancellation reverts it to `PR` so it can be rescheduled.
#[derive(Clone)]
pub struct DeliveryLifecycle {
    store: Arc<dyn Store>,
}

impl DeliveryLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Bind a delivery to a ready order. The order must be `PR`, no delivery
    /// may exist for it yet, and the agent must carry the delivery role.
    /// Insert and order advance happen in one atomic store procedure.
    #[instrument(skip(self, payment_mode), err)]
    pub async fn schedule(
        &self,
        order_id: OrderId,
        scheduled_at: DateTime<Utc>,
        agent_id: PersonnelId,
        payment_mode: String,
    ) -> DomainResult<()> {
        let order = self
            .store
            .fetch_order(order_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")))?;
        if self
            .store
            .fetch_delivery(order_id)
            .await
            .map_err(map_store_error)?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "order {order_id} already has a delivery"
            )));
        }
        order.check_transition(OrderStatus::InDelivery)?;
        self.check_agent(agent_id).await?;

        let delivery = Delivery::scheduled(order_id, scheduled_at, agent_id, payment_mode);
        self.store
            .schedule_delivery(&delivery)
            .await
            .map_err(map_store_error)?;
        info!(order = %order_id, agent = %agent_id, "delivery scheduled");
        Ok(())
    }

    /// Change the scheduled date and/or the agent of a pending delivery.
    /// Fields left unset keep their value; a delivered delivery is immutable.
    #[instrument(skip(self), err)]
    pub async fn reschedule(
        &self,
        order_id: OrderId,
        scheduled_at: Option<DateTime<Utc>>,
        agent_id: Option<PersonnelId>,
    ) -> DomainResult<()> {
        let delivery = self.fetch(order_id).await?;
        delivery.check_mutable()?;
        if let Some(agent) = agent_id {
            self.check_agent(agent).await?;
        }
        if scheduled_at.is_none() && agent_id.is_none() {
            return Ok(());
        }
        self.store
            .update_delivery(order_id, scheduled_at, agent_id)
            .await
            .map_err(map_store_error)?;
        info!(order = %order_id, "delivery rescheduled");
        Ok(())
    }

    /// Hand the delivery to its agent (`EP -> EL`).
    #[instrument(skip(self), err)]
    pub async fn dispatch(&self, order_id: OrderId) -> DomainResult<()> {
        let delivery = self.fetch(order_id).await?;
        delivery.check_mutable()?;
        if !delivery.status.can_transition_to(DeliveryStatus::InTransit) {
            return Err(DomainError::invalid_transition(format!(
                "delivery for order {order_id} is {}, cannot dispatch",
                delivery.status
            )));
        }
        self.store
            .advance_delivery(order_id, delivery.status, DeliveryStatus::InTransit)
            .await
            .map_err(map_store_error)?;
        info!(order = %order_id, "delivery dispatched");
        Ok(())
    }

    /// Mark the delivery done: delivery goes `LV` and the order closes at
    /// `SO` in one atomic store procedure.
    #[instrument(skip(self), err)]
    pub async fn complete(&self, order_id: OrderId) -> DomainResult<()> {
        let delivery = self.fetch(order_id).await?;
        delivery.check_mutable()?;
        self.store
            .complete_delivery(order_id)
            .await
            .map_err(map_store_error)?;
        info!(order = %order_id, "delivery completed");
        Ok(())
    }

    /// Call off a pending delivery: the binding is removed and the order
    /// reverts to `PR` so it can be scheduled again. A delivered delivery
    /// cannot be cancelled.
    #[instrument(skip(self), err)]
    pub async fn cancel(&self, order_id: OrderId) -> DomainResult<()> {
        let delivery = self.fetch(order_id).await?;
        delivery.check_mutable()?;
        self.store
            .cancel_delivery(order_id)
            .await
            .map_err(map_store_error)?;
        info!(order = %order_id, "delivery cancelled");
        Ok(())
    }

    /// Resolve a delivery with client, agent and order display fields.
    pub async fn get(&self, order_id: OrderId) -> DomainResult<DeliveryDetails> {
        self.store
            .fetch_delivery_details(order_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("delivery for order {order_id}")))
    }

    async fn fetch(&self, order_id: OrderId) -> DomainResult<Delivery> {
        self.store
            .fetch_delivery(order_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("delivery for order {order_id}")))
    }

    /// An agent must exist and carry the delivery role marker in their label.
    async fn check_agent(&self, agent_id: PersonnelId) -> DomainResult<()> {
        let agent = self
            .store
            .fetch_personnel(agent_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("personnel {agent_id}")))?;
        if !agent.is_delivery_agent() {
            return Err(DomainError::not_found(format!(
                "no delivery agent with id {agent_id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderLifecycle;
    use chrono::NaiveDate;
    use orderdesk_directory::{Client, ClientId, Personnel};
    use orderdesk_store::InMemoryStore;

    fn fixtures() -> (Arc<InMemoryStore>, OrderLifecycle, DeliveryLifecycle) {
        let store = Arc::new(InMemoryStore::new());
        store.seed_client(Client {
            id: ClientId::new(1),
            name: "Ana".into(),
            surname: "Moreau".into(),
            address: "3 Oak Ave".into(),
            postal_code: "69003".into(),
            phone: "0400000000".into(),
            email: "ana@example.com".into(),
        });
        store.seed_personnel(Personnel {
            id: PersonnelId::new(1),
            name: "Marc".into(),
            surname: "Petit".into(),
            address: "8 Pine Rd".into(),
            city: "Lyon".into(),
            phone: "0600000001".into(),
            hired_on: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            role_label: Some("Senior driver".into()),
        });
        store.seed_personnel(Personnel {
            id: PersonnelId::new(2),
            name: "Jo".into(),
            surname: "Klein".into(),
            address: "2 Elm St".into(),
            city: "Lyon".into(),
            phone: "0600000002".into(),
            hired_on: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            role_label: Some("Accountant".into()),
        });
        let orders = OrderLifecycle::new(store.clone());
        let deliveries = DeliveryLifecycle::new(store.clone());
        (store, orders, deliveries)
    }

    async fn ready_order(orders: &OrderLifecycle) -> OrderId {
        let id = orders.create(ClientId::new(1)).await.unwrap();
        orders.transition(id, OrderStatus::Ready).await.unwrap();
        id
    }

    #[tokio::test]
    async fn schedule_requires_a_ready_order() {
        let (_, orders, deliveries) = fixtures();
        let id = orders.create(ClientId::new(1)).await.unwrap();

        // Still EC: no delivery may exist for an unready order.
        let err = deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(orders.get(id).await.unwrap().order.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn schedule_rejects_missing_or_ineligible_agents() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;

        let err = deliveries
            .schedule(id, Utc::now(), PersonnelId::new(99), "cash".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        // Exists but the role label carries no delivery marker.
        let err = deliveries
            .schedule(id, Utc::now(), PersonnelId::new(2), "cash".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(orders.get(id).await.unwrap().order.status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn second_schedule_is_a_conflict() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;

        deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap();
        let err = deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn full_lifecycle_closes_the_order() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;

        deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "card".into())
            .await
            .unwrap();
        assert_eq!(orders.get(id).await.unwrap().order.status, OrderStatus::InDelivery);

        deliveries.dispatch(id).await.unwrap();
        assert_eq!(deliveries.get(id).await.unwrap().delivery.status, DeliveryStatus::InTransit);

        deliveries.complete(id).await.unwrap();
        let details = deliveries.get(id).await.unwrap();
        assert_eq!(details.delivery.status, DeliveryStatus::Delivered);
        assert_eq!(details.order_status, OrderStatus::Completed);
        assert_eq!(details.agent_name, "Marc Petit");

        // LV is terminal for every mutation.
        for result in [
            deliveries.dispatch(id).await,
            deliveries.complete(id).await,
            deliveries.cancel(id).await,
            deliveries.reschedule(id, Some(Utc::now()), None).await,
        ] {
            assert!(matches!(result.unwrap_err(), DomainError::InvalidState(_)));
        }
    }

    #[tokio::test]
    async fn cancel_reverts_the_order_to_ready() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;
        deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap();

        deliveries.cancel(id).await.unwrap();
        assert!(matches!(
            deliveries.get(id).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert_eq!(orders.get(id).await.unwrap().order.status, OrderStatus::Ready);

        // Rescheduling after a cancellation is legal again.
        deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reschedule_is_partial_and_validates_the_new_agent() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;
        let original = Utc::now();
        deliveries
            .schedule(id, original, PersonnelId::new(1), "cash".into())
            .await
            .unwrap();

        let err = deliveries
            .reschedule(id, None, Some(PersonnelId::new(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let moved = original + chrono::Duration::hours(4);
        deliveries.reschedule(id, Some(moved), None).await.unwrap();
        let details = deliveries.get(id).await.unwrap();
        assert_eq!(details.delivery.scheduled_at, moved);
        assert_eq!(details.delivery.agent_id, PersonnelId::new(1));
    }

    #[tokio::test]
    async fn dispatch_only_from_preparing() {
        let (_, orders, deliveries) = fixtures();
        let id = ready_order(&orders).await;
        deliveries
            .schedule(id, Utc::now(), PersonnelId::new(1), "cash".into())
            .await
            .unwrap();

        deliveries.dispatch(id).await.unwrap();
        let err = deliveries.dispatch(id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }
}
