//! Read-query parameter and row-set types.
//!
//! These are the shapes of the store's parameterized read contract: filter
//! structs carry resolved parameters (intervals are already half-open UTC
//! ranges; time-zone handling lives in the query façade) and row types carry
//! the joined display fields the views need.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderdesk_delivery::Delivery;
use orderdesk_directory::{ClientId, PersonnelId};
use orderdesk_orders::{Order, OrderStatus};

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// Result ordering for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    /// Newest order number first (default listing).
    #[default]
    IdDesc,
    /// Ascending order number (day listings).
    IdAsc,
    /// Most recently created first (per-client listings).
    CreatedDesc,
}

/// Filter for order read queries. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub client: Option<ClientId>,
    pub status: Option<OrderStatus>,
    pub created_within: Option<Interval>,
    pub sort: OrderSort,
}

/// Result ordering for delivery listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliverySort {
    /// Most recently scheduled first (default listing).
    #[default]
    ScheduledDesc,
    /// Ascending order number (day listings).
    OrderIdAsc,
}

/// Filter for delivery read queries. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    pub agent: Option<PersonnelId>,
    /// Matched against the ordering client's postal code, exact.
    pub postal_code: Option<String>,
    pub scheduled_within: Option<Interval>,
    pub sort: DeliverySort,
}

/// Order row joined with its client's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithClient {
    #[serde(flatten)]
    pub order: Order,
    pub client_name: String,
}

/// Delivery row joined with client, agent and order display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryDetails {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub client_id: ClientId,
    pub client_name: String,
    pub postal_code: String,
    pub agent_name: String,
    pub order_status: OrderStatus,
}

/// Case-insensitive substring match (designation search).
pub fn matches_substring_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive exact match (category search).
pub fn matches_exact_ci(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn interval_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap();
        let day = Interval { start, end };

        assert!(day.contains(start));
        assert!(day.contains(end - chrono::Duration::seconds(1)));
        assert!(!day.contains(end));
        assert!(!day.contains(start - chrono::Duration::seconds(1)));
    }

    #[test]
    fn text_matching_ignores_case() {
        assert!(matches_substring_ci("Ground Coffee 1kg", "coffee"));
        assert!(!matches_substring_ci("Ground Coffee 1kg", "tea"));
        assert!(matches_exact_ci("Grocery", "grocery"));
        assert!(!matches_exact_ci("Grocery", "groc"));
    }
}
