pub mod account;
pub mod branch;
pub mod monitoring_config;
pub mod processing_request;
pub mod region;
pub mod user;

pub(crate) mod patch_field {
    use serde::{Deserialize, Deserializer};

    /// Deserializer for nullable patch fields: a missing field stays `None`
    /// (field untouched, via `#[serde(default)]`), an explicit JSON `null`
    /// becomes `Some(None)` (unset the column), a value becomes
    /// `Some(Some(value))`.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
