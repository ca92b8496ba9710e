//! Naming & Addressing
//!
//! Deterministic mapping from a logical partition name (`<resource>_<shard>`) to the
//! identifiers the storage nodes and blob storage understand.
//!
//! - **Database name**: `<resource><shard zero-padded to 5 digits>`, e.g. `p2p1_1 -> p2p100001`.
//! - **Blob prefix**: `part-<shard zero-padded to 5 digits>-`, e.g. `test_0 -> part-00000-`.
//! - **Metadata location**: `/metadata/<cluster>/<resource>/resource_meta`.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PARTITION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<resource>.*)_(?P<shard>[0-9]+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("malformed partition id '{0}': expected <resource>_<shard index>")]
    MalformedPartitionId(String),
}

/// A partition (shard) of a resource, as named by the cluster manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId {
    pub resource: String,
    pub shard: u32,
}

impl PartitionId {
    pub fn new(resource: impl Into<String>, shard: u32) -> Self {
        Self {
            resource: resource.into(),
            shard,
        }
    }

    /// Parses `<resource>_<shard>`. The shard index is taken after the last `_`.
    pub fn parse(partition_name: &str) -> Result<Self, NamingError> {
        let malformed = || NamingError::MalformedPartitionId(partition_name.to_string());

        let captures = PARTITION_NAME.captures(partition_name).ok_or_else(malformed)?;
        let shard = captures["shard"].parse::<u32>().map_err(|_| malformed())?;

        Ok(Self {
            resource: captures["resource"].to_string(),
            shard,
        })
    }

    pub fn database_name(&self) -> String {
        format!("{}{:05}", self.resource, self.shard)
    }

    pub fn blob_prefix(&self) -> String {
        format!("part-{:05}-", self.shard)
    }
}

impl FromStr for PartitionId {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.resource, self.shard)
    }
}

/// `"p2p1_1"` -> `"p2p100001"`
pub fn to_database_name(partition_name: &str) -> Result<String, NamingError> {
    PartitionId::parse(partition_name).map(|id| id.database_name())
}

/// `"test_0"` -> `"part-00000-"`
pub fn to_blob_prefix(partition_name: &str) -> Result<String, NamingError> {
    PartitionId::parse(partition_name).map(|id| id.blob_prefix())
}

pub fn metadata_location(cluster: &str, resource: &str) -> String {
    format!("/metadata/{}/{}/resource_meta", cluster, resource)
}
