//! Typed identifiers for Redis Enterprise clusters and their databases.
//!
//! Identifiers follow the Azure Resource Manager grammar:
//!
//! ```text
//! /subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Cache/redisEnterprise/{clusterName}[/databases/{databaseName}]
//! ```
use std::fmt;

use thiserror::Error;

const PROVIDER_NAMESPACE: &str = "Microsoft.Cache";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("parsing resource id: id was empty")]
    Empty,
    #[error("parsing resource id `{0}`: expected a leading `/`")]
    MissingLeadingSlash(String),
    #[error("parsing resource id `{input}`: expected the segment `{expected}` but got `{found}`")]
    UnexpectedSegment {
        input: String,
        expected: &'static str,
        found: String,
    },
    #[error("parsing resource id `{input}`: the segment `{expected}` was not found")]
    MissingSegment {
        input: String,
        expected: &'static str,
    },
    #[error("parsing resource id `{input}`: the user-specified segment `{name}` was empty")]
    EmptySegment { input: String, name: &'static str },
    #[error("parsing resource id `{input}`: unexpected trailing segments `{extra}`")]
    TrailingSegments { input: String, extra: String },
    #[error("parsing resource id `{input}`: the segment `{name}` has the invalid value `{value}`")]
    InvalidSegment {
        input: String,
        name: &'static str,
        value: String,
    },
    #[error("the database name must not be empty")]
    EmptyDatabaseName,
    #[error("invalid database name `{0}`: must not contain `/`, `?`, `#` or `%`, nor be `.` or `..`")]
    InvalidDatabaseName(String),
}

/// A user-specified segment must stay a single path segment once rendered into a URL.
fn is_valid_segment_value(value: &str) -> bool {
    !matches!(value, "" | "." | "..") && !value.contains(['/', '?', '#', '%'])
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Static(&'static str),
    User(&'static str),
}

const CLUSTER_SEGMENTS: &[Segment] = &[
    Segment::Static("subscriptions"),
    Segment::User("subscriptionId"),
    Segment::Static("resourceGroups"),
    Segment::User("resourceGroupName"),
    Segment::Static("providers"),
    Segment::Static(PROVIDER_NAMESPACE),
    Segment::Static("redisEnterprise"),
    Segment::User("clusterName"),
];

const DATABASE_SEGMENTS: &[Segment] = &[
    Segment::Static("databases"),
    Segment::User("databaseName"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Casing {
    Strict,
    Insensitive,
}

/// Walks `input` against the expected segments and returns the user-specified values in order.
fn parse_segments(
    input: &str,
    expected: &[&[Segment]],
    casing: Casing,
) -> Result<Vec<String>, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }
    let rest = input
        .strip_prefix('/')
        .ok_or_else(|| ParseError::MissingLeadingSlash(input.to_string()))?;

    let mut parts = rest.split('/');
    let mut values = Vec::new();

    for segment in expected.iter().flat_map(|s| s.iter()) {
        match *segment {
            Segment::Static(name) => {
                let found = parts.next().ok_or_else(|| ParseError::MissingSegment {
                    input: input.to_string(),
                    expected: name,
                })?;
                let matches = match casing {
                    Casing::Strict => found == name,
                    Casing::Insensitive => found.eq_ignore_ascii_case(name),
                };
                if !matches {
                    return Err(ParseError::UnexpectedSegment {
                        input: input.to_string(),
                        expected: name,
                        found: found.to_string(),
                    });
                }
            }
            Segment::User(name) => {
                let value = parts.next().ok_or_else(|| ParseError::MissingSegment {
                    input: input.to_string(),
                    expected: name,
                })?;
                if value.is_empty() {
                    return Err(ParseError::EmptySegment {
                        input: input.to_string(),
                        name,
                    });
                }
                if !is_valid_segment_value(value) {
                    return Err(ParseError::InvalidSegment {
                        input: input.to_string(),
                        name,
                        value: value.to_string(),
                    });
                }
                values.push(value.to_string());
            }
        }
    }

    let extra = parts.collect::<Vec<_>>().join("/");
    if !extra.is_empty() {
        return Err(ParseError::TrailingSegments {
            input: input.to_string(),
            extra,
        });
    }

    Ok(values)
}

/// Identity of a Redis Enterprise cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub cluster_name: String,
}

impl ClusterId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Parses a cluster identifier, matching the static segments exactly.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Self::parse_with(input, Casing::Strict)
    }

    /// Parses a cluster identifier ignoring the casing of the static segments.
    /// The parsed value is always rendered back in canonical casing.
    pub fn parse_insensitively(input: &str) -> Result<Self, ParseError> {
        Self::parse_with(input, Casing::Insensitive)
    }

    fn parse_with(input: &str, casing: Casing) -> Result<Self, ParseError> {
        let mut values = parse_segments(input, &[CLUSTER_SEGMENTS], casing)?.into_iter();
        match (values.next(), values.next(), values.next()) {
            (Some(subscription_id), Some(resource_group_name), Some(cluster_name)) => Ok(Self {
                subscription_id,
                resource_group_name,
                cluster_name,
            }),
            _ => Err(ParseError::MissingSegment {
                input: input.to_string(),
                expected: "clusterName",
            }),
        }
    }

    /// Composes the identifier of a database living in this cluster.
    pub fn database(&self, database_name: impl Into<String>) -> DatabaseId {
        DatabaseId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            cluster_name: self.cluster_name.clone(),
            database_name: database_name.into(),
        }
    }

    /// Canonical string form of the identifier.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{PROVIDER_NAMESPACE}/redisEnterprise/{}",
            self.subscription_id, self.resource_group_name, self.cluster_name
        )
    }
}

/// Identity of a database inside a Redis Enterprise cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub cluster_name: String,
    pub database_name: String,
}

impl DatabaseId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        cluster_name: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            cluster_name: cluster_name.into(),
            database_name: database_name.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut values =
            parse_segments(input, &[CLUSTER_SEGMENTS, DATABASE_SEGMENTS], Casing::Strict)?
                .into_iter();
        match (values.next(), values.next(), values.next(), values.next()) {
            (
                Some(subscription_id),
                Some(resource_group_name),
                Some(cluster_name),
                Some(database_name),
            ) => Ok(Self {
                subscription_id,
                resource_group_name,
                cluster_name,
                database_name,
            }),
            _ => Err(ParseError::MissingSegment {
                input: input.to_string(),
                expected: "databaseName",
            }),
        }
    }

    /// Identifier of the cluster owning this database.
    pub fn cluster(&self) -> ClusterId {
        ClusterId::new(
            self.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.cluster_name.clone(),
        )
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/databases/{}", self.cluster(), self.database_name)
    }
}

/// Builds the database identifier from a user-supplied cluster identifier and database name.
///
/// No remote call can happen before this succeeds, so any error here is final.
pub fn resolve(cluster_id: &str, database_name: &str) -> Result<DatabaseId, ParseError> {
    let cluster = ClusterId::parse(cluster_id)?;
    if database_name.is_empty() {
        return Err(ParseError::EmptyDatabaseName);
    }
    if !is_valid_segment_value(database_name) {
        return Err(ParseError::InvalidDatabaseName(database_name.to_string()));
    }
    Ok(cluster.database(database_name))
}

/// Validation hook for fields holding a cluster identifier.
pub fn validate_cluster_id(value: &str) -> Result<(), ParseError> {
    ClusterId::parse(value).map(|_| ())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    const CLUSTER: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/group1/providers/Microsoft.Cache/redisEnterprise/cluster1";

    #[test]
    fn parse_cluster_id() {
        let id = ClusterId::parse(CLUSTER).unwrap();

        assert_eq!(id.subscription_id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.resource_group_name, "group1");
        assert_eq!(id.cluster_name, "cluster1");
        assert_eq!(id.id(), CLUSTER);
    }

    #[test]
    fn parse_database_id() {
        let input = format!("{CLUSTER}/databases/default");
        let id = DatabaseId::parse(&input).unwrap();

        assert_eq!(id.database_name, "default");
        assert_eq!(id.cluster(), ClusterId::parse(CLUSTER).unwrap());
        assert_eq!(id.to_string(), input);
    }

    #[rstest]
    #[case("", ParseError::Empty)]
    #[case(
        "subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c",
        ParseError::MissingLeadingSlash("subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c".to_string())
    )]
    #[case(
        "/subscriptions/s/resourceGroups/g",
        ParseError::MissingSegment { input: "/subscriptions/s/resourceGroups/g".to_string(), expected: "providers" }
    )]
    #[case(
        "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redis/c",
        ParseError::UnexpectedSegment {
            input: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redis/c".to_string(),
            expected: "redisEnterprise",
            found: "redis".to_string(),
        }
    )]
    #[case(
        "/subscriptions//resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c",
        ParseError::EmptySegment {
            input: "/subscriptions//resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c".to_string(),
            name: "subscriptionId",
        }
    )]
    #[case(
        "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/",
        ParseError::EmptySegment {
            input: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/".to_string(),
            name: "clusterName",
        }
    )]
    #[case(
        "/subscriptions/s/resourceGroups/../providers/Microsoft.Cache/redisEnterprise/c",
        ParseError::InvalidSegment {
            input: "/subscriptions/s/resourceGroups/../providers/Microsoft.Cache/redisEnterprise/c".to_string(),
            name: "resourceGroupName",
            value: "..".to_string(),
        }
    )]
    #[case(
        "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c?x=1",
        ParseError::InvalidSegment {
            input: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c?x=1".to_string(),
            name: "clusterName",
            value: "c?x=1".to_string(),
        }
    )]
    #[case(
        "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c/databases/d",
        ParseError::TrailingSegments {
            input: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Cache/redisEnterprise/c/databases/d".to_string(),
            extra: "databases/d".to_string(),
        }
    )]
    fn invalid_cluster_ids(#[case] input: &str, #[case] expected: ParseError) {
        assert_eq!(ClusterId::parse(input).unwrap_err(), expected);
        assert!(validate_cluster_id(input).is_err());
    }

    #[test]
    fn strict_parsing_rejects_other_casing() {
        let input = CLUSTER.replace("resourceGroups", "resourcegroups");

        assert_matches!(
            ClusterId::parse(&input),
            Err(ParseError::UnexpectedSegment { expected: "resourceGroups", .. })
        );
    }

    #[test]
    fn insensitive_parsing_canonicalizes() {
        let input = CLUSTER
            .replace("resourceGroups", "RESOURCEGROUPS")
            .replace("Microsoft.Cache", "microsoft.cache")
            .replace("redisEnterprise", "redisenterprise");

        let id = ClusterId::parse_insensitively(&input).unwrap();

        assert_eq!(id.id(), CLUSTER);
    }

    #[rstest]
    #[case(CLUSTER, "db1")]
    #[case(
        "/subscriptions/S/resourceGroups/G/providers/Microsoft.Cache/redisEnterprise/C",
        "default"
    )]
    #[case(CLUSTER, "db-1.cache_v2")]
    fn resolve_round_trips_through_canonical_form(#[case] cluster_id: &str, #[case] name: &str) {
        let id = resolve(cluster_id, name).unwrap();

        assert_eq!(id.database_name, name);
        assert_eq!(DatabaseId::parse(&id.id()).unwrap(), id);
        assert_eq!(resolve(&id.cluster().id(), &id.database_name).unwrap(), id);
    }

    #[test]
    fn resolve_rejects_empty_database_name() {
        assert_eq!(resolve(CLUSTER, ""), Err(ParseError::EmptyDatabaseName));
    }

    #[rstest]
    #[case("a/b")]
    #[case("x/../../../../../../../subscriptions/OTHER/providers/Microsoft.Foo/bar")]
    #[case("..")]
    #[case(".")]
    #[case("db?api-version=1")]
    #[case("db#fragment")]
    #[case("db%2Fother")]
    fn resolve_rejects_names_leaving_the_database_segment(#[case] name: &str) {
        assert_eq!(
            resolve(CLUSTER, name),
            Err(ParseError::InvalidDatabaseName(name.to_string()))
        );
    }

    #[test]
    fn resolve_reports_the_cluster_error_first() {
        assert_matches!(resolve("not-an-id", ""), Err(ParseError::MissingLeadingSlash(_)));
    }
}
