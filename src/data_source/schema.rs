use std::time::Duration;

use thiserror::Error;

use crate::resource_id::{ParseError, validate_cluster_id};

use super::{DataSourceInput, FeatureMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Required,
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub sensitive: bool,
    pub deprecation: Option<&'static str>,
}

impl FieldSchema {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Required,
            sensitive: false,
            deprecation: None,
        }
    }

    const fn sensitive(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Computed,
            sensitive: true,
            deprecation: None,
        }
    }
}

const RESOURCE_GROUP_NAME_DEPRECATION: &str =
    "This field is no longer used and will be removed in the next major version";

const COMMON_FIELDS: [FieldSchema; 4] = [
    FieldSchema::required("name"),
    FieldSchema::required("cluster_id"),
    FieldSchema::sensitive("primary_access_key"),
    FieldSchema::sensitive("secondary_access_key"),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("`{0}` is required")]
    MissingRequired(&'static str),
    #[error("invalid value for `{field}`: {source}")]
    Invalid {
        field: &'static str,
        source: ParseError,
    },
    #[error("`{0}` is not expected here")]
    Unexpected(&'static str),
}

/// Declared shape of the data source for a given [`FeatureMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Carries the deprecated `resource_group_name` attribute.
    Legacy { read_timeout: Duration },
    Modern { read_timeout: Duration },
}

impl Schema {
    pub fn new(mode: FeatureMode, read_timeout: Duration) -> Self {
        match mode {
            FeatureMode::Legacy => Self::Legacy { read_timeout },
            FeatureMode::Modern => Self::Modern { read_timeout },
        }
    }

    pub fn read_timeout(&self) -> Duration {
        match self {
            Self::Legacy { read_timeout } | Self::Modern { read_timeout } => *read_timeout,
        }
    }

    pub fn fields(&self) -> Vec<FieldSchema> {
        let mut fields = COMMON_FIELDS.to_vec();
        if let Self::Legacy { .. } = self {
            fields.push(FieldSchema {
                name: "resource_group_name",
                kind: FieldKind::Computed,
                sensitive: false,
                deprecation: Some(RESOURCE_GROUP_NAME_DEPRECATION),
            });
        }
        fields
    }

    pub fn field(&self, name: &str) -> Option<FieldSchema> {
        self.fields().into_iter().find(|f| f.name == name)
    }

    /// Checks `input` against the declared fields before any read happens.
    pub fn validate(&self, input: &DataSourceInput) -> Result<(), SchemaError> {
        if input.name.is_empty() {
            return Err(SchemaError::MissingRequired("name"));
        }
        if input.cluster_id.is_empty() {
            return Err(SchemaError::MissingRequired("cluster_id"));
        }
        validate_cluster_id(&input.cluster_id).map_err(|source| SchemaError::Invalid {
            field: "cluster_id",
            source,
        })?;
        // Computed-only, or absent from the modern schema: either way not settable.
        let settable = self
            .field("resource_group_name")
            .is_some_and(|f| f.kind == FieldKind::Required);
        if input.resource_group_name.is_some() && !settable {
            return Err(SchemaError::Unexpected("resource_group_name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::timeouts::DEFAULT_READ_TIMEOUT;

    const CLUSTER: &str =
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.Cache/redisEnterprise/C";

    fn input() -> DataSourceInput {
        DataSourceInput {
            name: "db1".to_string(),
            cluster_id: CLUSTER.to_string(),
            resource_group_name: None,
        }
    }

    #[test]
    fn modern_schema_has_no_resource_group_name() {
        let schema = Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT);

        let names: Vec<_> = schema.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "cluster_id",
                "primary_access_key",
                "secondary_access_key"
            ]
        );
        assert_eq!(schema.read_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn legacy_schema_has_deprecated_resource_group_name() {
        let schema = Schema::new(FeatureMode::Legacy, DEFAULT_READ_TIMEOUT);

        let field = schema.field("resource_group_name").unwrap();
        assert_eq!(field.kind, FieldKind::Computed);
        assert!(field.deprecation.is_some());
    }

    #[test]
    fn access_keys_are_sensitive() {
        let schema = Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT);

        for field in schema.fields() {
            assert_eq!(field.sensitive, field.name.ends_with("_access_key"));
        }
    }

    #[test]
    fn validate_accepts_well_formed_input() {
        let schema = Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT);
        assert_eq!(schema.validate(&input()), Ok(()));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let schema = Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT);

        let mut no_name = input();
        no_name.name.clear();
        assert_eq!(
            schema.validate(&no_name),
            Err(SchemaError::MissingRequired("name"))
        );

        let mut no_cluster = input();
        no_cluster.cluster_id.clear();
        assert_eq!(
            schema.validate(&no_cluster),
            Err(SchemaError::MissingRequired("cluster_id"))
        );
    }

    #[test]
    fn validate_rejects_malformed_cluster_id() {
        let schema = Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT);
        let mut malformed = input();
        malformed.cluster_id = "/subscriptions/S/resourceGroups/G".to_string();

        assert_matches!(
            schema.validate(&malformed),
            Err(SchemaError::Invalid { field: "cluster_id", .. })
        );
    }

    #[test]
    fn resource_group_name_cannot_be_supplied() {
        let mut with_group = input();
        with_group.resource_group_name = Some("G".to_string());

        assert_eq!(
            Schema::new(FeatureMode::Legacy, DEFAULT_READ_TIMEOUT).validate(&with_group),
            Err(SchemaError::Unexpected("resource_group_name"))
        );
        assert_eq!(
            Schema::new(FeatureMode::Modern, DEFAULT_READ_TIMEOUT).validate(&with_group),
            Err(SchemaError::Unexpected("resource_group_name"))
        );
    }
}
