//! Order status state machine.
//!
//! The transition table below is the sole source of truth for permitted order
//! status changes; every caller-facing path funnels through
//! [`OrderStatus::can_transition_to`].

use serde::{Deserialize, Serialize};

use orderdesk_core::DomainError;

/// Order status lifecycle.
///
/// Serialized as the historical two-letter codes carried by the store
/// (`EC`, `PR`, `LI`, `SO`, `AN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// `EC` — order is being assembled.
    #[serde(rename = "EC")]
    InProgress,
    /// `PR` — order is ready for delivery scheduling.
    #[serde(rename = "PR")]
    Ready,
    /// `LI` — a delivery has been attached and is underway.
    #[serde(rename = "LI")]
    InDelivery,
    /// `SO` — terminal: delivered and closed out.
    #[serde(rename = "SO")]
    Completed,
    /// `AN` — terminal: cancelled before dispatch.
    #[serde(rename = "AN")]
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::InDelivery,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Initial status of every freshly created order.
    pub fn initial() -> Self {
        OrderStatus::InProgress
    }

    /// Two-letter status code as stored.
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "EC",
            OrderStatus::Ready => "PR",
            OrderStatus::InDelivery => "LI",
            OrderStatus::Completed => "SO",
            OrderStatus::Cancelled => "AN",
        }
    }

    /// Parse a stored two-letter code.
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "EC" => Ok(OrderStatus::InProgress),
            "PR" => Ok(OrderStatus::Ready),
            "LI" => Ok(OrderStatus::InDelivery),
            "SO" => Ok(OrderStatus::Completed),
            "AN" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status code '{other}'"
            ))),
        }
    }

    /// Statuses reachable from `self` in exactly one step.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::InProgress => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::InDelivery, OrderStatus::Cancelled],
            OrderStatus::InDelivery => &[OrderStatus::Completed],
            OrderStatus::Completed => &[],
            OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Terminal statuses accept no further transitions and no delivery.
    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transition_table_is_exact() {
        use OrderStatus::*;

        let table: [(OrderStatus, &[OrderStatus]); 5] = [
            (InProgress, &[Ready, Cancelled]),
            (Ready, &[InDelivery, Cancelled]),
            (InDelivery, &[Completed]),
            (Completed, &[]),
            (Cancelled, &[]),
        ];

        for (from, allowed) in table {
            assert_eq!(from.allowed_targets(), allowed, "from {from}");
            for target in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(target),
                    allowed.contains(&target),
                    "{from} -> {target}"
                );
            }
        }
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
        assert!(!OrderStatus::InDelivery.is_terminal());
    }

    #[test]
    fn codes_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.code()).unwrap(), status);
        }
        assert!(OrderStatus::from_code("XX").is_err());
    }

    #[test]
    fn serde_uses_codes() {
        let json = serde_json::to_string(&OrderStatus::Ready).unwrap();
        assert_eq!(json, "\"PR\"");
        let back: OrderStatus = serde_json::from_str("\"AN\"").unwrap();
        assert_eq!(back, OrderStatus::Cancelled);
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        /// Walking only permitted transitions never escapes the status set and
        /// never leaves a terminal status.
        #[test]
        fn permitted_walks_respect_terminality(targets in prop::collection::vec(any_status(), 0..12)) {
            let mut current = OrderStatus::initial();
            for target in targets {
                let was_terminal = current.is_terminal();
                if current.can_transition_to(target) {
                    prop_assert!(!was_terminal);
                    current = target;
                }
            }
            prop_assert!(OrderStatus::ALL.contains(&current));
        }

        /// A rejected target is never reachable: the table and the predicate agree.
        #[test]
        fn predicate_matches_table(from in any_status(), target in any_status()) {
            prop_assert_eq!(
                from.can_transition_to(target),
                from.allowed_targets().contains(&target)
            );
        }
    }
}
