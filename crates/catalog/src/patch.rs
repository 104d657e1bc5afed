//! Three-state partial-update field.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field slot in a partial update.
///
/// JSON mapping (requires `#[serde(default)]` on the containing field):
/// absent key → `Keep`, explicit `null` → `Clear`, value → `Set`. The
/// distinction matters because "leave unchanged" and "erase" are different
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field was not mentioned; keep the current value.
    #[default]
    Keep,
    /// Field was explicitly nulled; clear it.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Patch::Clear)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present key deserializes here; `null` becomes Clear. An absent key
        // never reaches this impl and falls back to Default (Keep).
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // Keep has no wire form of its own; it serializes like Clear and
            // relies on skip_serializing_if at the struct level when fidelity
            // matters. Round-tripping patches is not a supported path.
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
            Patch::Set(value) => serializer.serialize_some(value),
        }
    }
}
