//! The `azurerm_redis_enterprise_database` data source.
//!
//! A read resolves the database identifier from the cluster identifier and
//! the database name, lists the database access keys once and projects them
//! into a flat state record.
use std::env::{self, VarError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::databases::{AccessKey, DatabasesClient, DatabasesClientError};
use crate::resource_id::{ParseError, resolve};
use crate::timeouts::{DEFAULT_READ_TIMEOUT, ReadContext, StopContext};

pub use schema::{FieldKind, FieldSchema, Schema, SchemaError};

pub mod schema;

pub const DATA_SOURCE_NAME: &str = "azurerm_redis_enterprise_database";

const FOUR_POINT_OH_BETA_ENV_NAME: &str = "ARM_FOURPOINTZERO_BETA";

/// Selects the set of fields exposed by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureMode {
    /// Keeps the deprecated `resource_group_name` field.
    #[default]
    Legacy,
    Modern,
}

impl FeatureMode {
    /// Reads `ARM_FOURPOINTZERO_BETA`; `true` opts into the modern field set.
    pub fn from_env() -> Self {
        Self::from_env_with(env::var)
    }

    fn from_env_with<F>(env_var: F) -> Self
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        Self::from_four_point_oh_beta(
            env_var(FOUR_POINT_OH_BETA_ENV_NAME)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or_default(),
        )
    }

    pub fn from_four_point_oh_beta(enabled: bool) -> Self {
        if enabled { Self::Modern } else { Self::Legacy }
    }
}

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("listing keys for {id}: {source}")]
    Lookup {
        id: String,
        source: DatabasesClientError,
    },
}

/// Configuration supplied to a read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSourceInput {
    /// Name of the database.
    pub name: String,
    pub cluster_id: String,
    /// Computed-only; `Schema::validate` rejects a supplied value and `read` never uses it.
    #[serde(default)]
    pub resource_group_name: Option<String>,
}

/// Outcome of a read, in the field set of the modern schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseState {
    pub id: String,
    pub name: String,
    pub cluster_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_access_key: Option<AccessKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_access_key: Option<AccessKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyDatabaseState {
    #[serde(flatten)]
    pub state: DatabaseState,
    pub resource_group_name: String,
}

/// State produced by a read. Serializes to the flat record handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataSourceState {
    Legacy(LegacyDatabaseState),
    Modern(DatabaseState),
}

impl DataSourceState {
    pub fn database(&self) -> &DatabaseState {
        match self {
            Self::Legacy(legacy) => &legacy.state,
            Self::Modern(state) => state,
        }
    }

    pub fn resource_group_name(&self) -> Option<&str> {
        match self {
            Self::Legacy(legacy) => Some(&legacy.resource_group_name),
            Self::Modern(_) => None,
        }
    }
}

pub struct DatabaseDataSource<D>
where
    D: DatabasesClient,
{
    client: D,
    mode: FeatureMode,
    read_timeout: Duration,
}

impl<D> DatabaseDataSource<D>
where
    D: DatabasesClient,
{
    pub fn new(client: D, mode: FeatureMode) -> Self {
        Self {
            client,
            mode,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ..self
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.mode, self.read_timeout)
    }

    /// Performs a single lookup of the database keys.
    pub fn read(
        &self,
        input: &DataSourceInput,
        stop: &StopContext,
    ) -> Result<DataSourceState, DataSourceError> {
        let ctx = ReadContext::for_read(stop, self.read_timeout);

        let id = resolve(&input.cluster_id, &input.name)?;
        let cluster_id = id.cluster();

        let response = self
            .client
            .list_keys(&id, &ctx)
            .map_err(|source| DataSourceError::Lookup {
                id: id.id(),
                source,
            })?;

        let mut state = DatabaseState {
            id: id.id(),
            name: id.database_name.clone(),
            cluster_id: cluster_id.id(),
            primary_access_key: None,
            secondary_access_key: None,
        };

        match response.model {
            Some(keys) => {
                state.primary_access_key = Some(keys.primary_key.unwrap_or_default());
                state.secondary_access_key = Some(keys.secondary_key.unwrap_or_default());
            }
            None => debug!(%id, "listKeys returned no payload, leaving access keys unset"),
        }

        info!(%id, mode = ?self.mode, "read redis enterprise database");

        Ok(match self.mode {
            FeatureMode::Legacy => DataSourceState::Legacy(LegacyDatabaseState {
                state,
                resource_group_name: id.resource_group_name,
            }),
            FeatureMode::Modern => DataSourceState::Modern(state),
        })
    }
}
