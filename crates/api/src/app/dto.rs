use chrono::{DateTime, Utc};
use serde::Deserialize;

use orderdesk_directory::{ClientId, PersonnelId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: ClientId,
}

/// Target status as its two-letter code, e.g. `{"status": "PR"}`.
#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleDeliveryRequest {
    pub order_id: orderdesk_orders::OrderId,
    pub scheduled_at: DateTime<Utc>,
    pub agent_id: PersonnelId,
    pub payment_mode: String,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleDeliveryRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub agent_id: Option<PersonnelId>,
}
