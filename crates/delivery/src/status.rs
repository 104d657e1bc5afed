//! Delivery status state machine.

use serde::{Deserialize, Serialize};

use orderdesk_core::DomainError;

/// Delivery status lifecycle.
///
/// Serialized as the historical two-letter codes carried by the store
/// (`EP`, `EL`, `LV`). Advancement is driven by explicit lifecycle operations
/// (`dispatch`, `complete`), never by a caller-supplied status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// `EP` — being prepared.
    #[serde(rename = "EP")]
    Preparing,
    /// `EL` — out with the agent.
    #[serde(rename = "EL")]
    InTransit,
    /// `LV` — terminal: handed over to the customer.
    #[serde(rename = "LV")]
    Delivered,
}

impl DeliveryStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [DeliveryStatus; 3] = [
        DeliveryStatus::Preparing,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
    ];

    /// Initial status of every freshly scheduled delivery.
    pub fn initial() -> Self {
        DeliveryStatus::Preparing
    }

    /// Two-letter status code as stored.
    pub fn code(&self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "EP",
            DeliveryStatus::InTransit => "EL",
            DeliveryStatus::Delivered => "LV",
        }
    }

    /// Parse a stored two-letter code.
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "EP" => Ok(DeliveryStatus::Preparing),
            "EL" => Ok(DeliveryStatus::InTransit),
            "LV" => Ok(DeliveryStatus::Delivered),
            other => Err(DomainError::validation(format!(
                "unknown delivery status code '{other}'"
            ))),
        }
    }

    /// Statuses reachable from `self` in exactly one step.
    pub fn allowed_targets(&self) -> &'static [DeliveryStatus] {
        match self {
            DeliveryStatus::Preparing => &[DeliveryStatus::InTransit, DeliveryStatus::Delivered],
            DeliveryStatus::InTransit => &[DeliveryStatus::Delivered],
            DeliveryStatus::Delivered => &[],
        }
    }

    pub fn can_transition_to(&self, target: DeliveryStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// A delivered record accepts no rescheduling, cancellation or completion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }
}

impl core::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl core::str::FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}
