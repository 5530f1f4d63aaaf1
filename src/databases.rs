use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::resource_id::DatabaseId;
use crate::timeouts::ReadContext;

pub use error::DatabasesClientError;

mod error;
pub mod http;

/// API version of the `Microsoft.Cache/redisEnterprise` management API.
pub const API_VERSION: &str = "2021-08-01";

/// A database access key. The value is wiped on drop and never shown by `Debug`.
#[derive(Clone, PartialEq, Default)]
pub struct AccessKey(Zeroizing<String>);

impl AccessKey {
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for AccessKey {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl From<&str> for AccessKey {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

impl Serialize for AccessKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AccessKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Access keys of a database as returned by the `listKeys` action.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeys {
    #[serde(default)]
    pub primary_key: Option<AccessKey>,
    #[serde(default)]
    pub secondary_key: Option<AccessKey>,
}

/// Outcome of a successful `listKeys` call. A response without payload carries no model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListKeysResponse {
    pub model: Option<AccessKeys>,
}

/// Client for the Redis Enterprise databases API.
pub trait DatabasesClient {
    /// Lists the access keys of `id`, within the time budget of `ctx`.
    fn list_keys(
        &self,
        id: &DatabaseId,
        ctx: &ReadContext,
    ) -> Result<ListKeysResponse, DatabasesClientError>;
}
