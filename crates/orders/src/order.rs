//! Order entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{entity_id, DomainError, DomainResult, Entity};
use orderdesk_directory::ClientId;

use crate::status::OrderStatus;

entity_id! {
    /// Order number, assigned by the store on creation.
    pub struct OrderId
}

/// A customer order progressing through preparation to delivery or cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    /// Stamped once at creation; immutable thereafter.
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// A freshly placed order, before the store has persisted it.
    pub fn placed(id: OrderId, client_id: ClientId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id,
            created_at,
            status: OrderStatus::initial(),
        }
    }

    /// Whether a delivery may still be attached (requires `PR`).
    pub fn is_schedulable(&self) -> bool {
        self.status == OrderStatus::Ready
    }

    /// Validate a requested status change against the transition table.
    pub fn check_transition(&self, target: OrderStatus) -> DomainResult<()> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(format!(
                "order {} cannot move {} -> {}",
                self.id, self.status, target
            )))
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
