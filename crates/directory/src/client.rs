//! Client records.

use serde::{Deserialize, Serialize};

use orderdesk_core::{entity_id, Entity};

entity_id! {
    /// Client number.
    pub struct ClientId
}

/// A customer on record. Referenced by orders; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub postal_code: String,
    pub phone: String,
    pub email: String,
}

impl Client {
    /// "Name Surname" display form used by order and delivery views.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
