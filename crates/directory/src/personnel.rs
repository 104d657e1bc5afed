//! Personnel records and delivery-agent eligibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{entity_id, Entity};

entity_id! {
    /// Personnel number.
    pub struct PersonnelId
}

/// Role-label marker that makes a staff member an eligible delivery agent.
///
/// Matching is case-insensitive substring, so labels like "Senior Driver" or
/// "driver (part-time)" qualify.
pub const DELIVERY_ROLE_MARKER: &str = "DRIVER";

/// A staff member on record. Referenced by deliveries; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: PersonnelId,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub hired_on: NaiveDate,
    /// Role label; `None` when the staff member has no assigned role.
    pub role_label: Option<String>,
}

impl Personnel {
    /// Eligibility is purely role-based: the label must carry the marker.
    pub fn is_delivery_agent(&self) -> bool {
        self.role_label
            .as_deref()
            .is_some_and(|label| label.to_uppercase().contains(DELIVERY_ROLE_MARKER))
    }

    /// "Name Surname" display form used by delivery views.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

impl Entity for Personnel {
    type Id = PersonnelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(role: Option<&str>) -> Personnel {
        Personnel {
            id: PersonnelId::new(1),
            name: "Nadia".into(),
            surname: "Berger".into(),
            address: "12 Elm St".into(),
            city: "Lyon".into(),
            phone: "0600000000".into(),
            hired_on: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            role_label: role.map(Into::into),
        }
    }

    #[test]
    fn driver_roles_are_eligible_case_insensitively() {
        assert!(staff(Some("Driver")).is_delivery_agent());
        assert!(staff(Some("senior driver")).is_delivery_agent());
        assert!(staff(Some("DRIVER (night shift)")).is_delivery_agent());
    }

    #[test]
    fn other_roles_and_missing_roles_are_not_eligible() {
        assert!(!staff(Some("Cashier")).is_delivery_agent());
        assert!(!staff(Some("Warehouse lead")).is_delivery_agent());
        assert!(!staff(None).is_delivery_agent());
    }
}
