//! Delivery record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity};
use orderdesk_directory::PersonnelId;
use orderdesk_orders::OrderId;

use crate::status::DeliveryStatus;

/// Dispatch record for one order. The order number doubles as the key: the
/// store enforces at most one delivery per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub order_id: OrderId,
    pub scheduled_at: DateTime<Utc>,
    pub agent_id: PersonnelId,
    /// Free-text payment mode ("cash", "card", ...). Payment processing is out
    /// of scope here; the label travels with the record for reporting.
    pub payment_mode: String,
    pub status: DeliveryStatus,
}

impl Delivery {
    /// A freshly scheduled delivery, before the store has persisted it.
    pub fn scheduled(
        order_id: OrderId,
        scheduled_at: DateTime<Utc>,
        agent_id: PersonnelId,
        payment_mode: String,
    ) -> Self {
        Self {
            order_id,
            scheduled_at,
            agent_id,
            payment_mode,
            status: DeliveryStatus::initial(),
        }
    }

    /// Reject mutations (reschedule, cancel, complete) once delivered.
    pub fn check_mutable(&self) -> DomainResult<()> {
        if self.status.is_terminal() {
            Err(DomainError::invalid_state(format!(
                "delivery for order {} is already delivered",
                self.order_id
            )))
        } else {
            Ok(())
        }
    }
}

impl Entity for Delivery {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_deliveries_start_preparing() {
        let d = Delivery::scheduled(
            OrderId::new(9),
            Utc::now(),
            PersonnelId::new(4),
            "cash".into(),
        );
        assert_eq!(d.status, DeliveryStatus::Preparing);
        assert!(d.check_mutable().is_ok());
    }

    #[test]
    fn delivered_records_are_frozen() {
        let mut d = Delivery::scheduled(
            OrderId::new(9),
            Utc::now(),
            PersonnelId::new(4),
            "card".into(),
        );
        d.status = DeliveryStatus::Delivered;
        let err = d.check_mutable().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }
}
