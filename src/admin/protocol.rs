//! Admin Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) of the administrative
//! surface every storage node exposes.
//!
//! Each admin procedure is a single JSON `POST`. A successful call answers with the
//! procedure's response DTO; a rejected call answers with an [`AdminErrorResponse`]
//! whose `code` is the contract callers branch on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- API Endpoints ---

pub const ENDPOINT_ADD_DB: &str = "/admin/add_db";
pub const ENDPOINT_CLOSE_DB: &str = "/admin/close_db";
pub const ENDPOINT_CLEAR_DB: &str = "/admin/clear_db";
pub const ENDPOINT_COMPACT_DB: &str = "/admin/compact_db";
pub const ENDPOINT_CHECK_DB: &str = "/admin/check_db";
pub const ENDPOINT_GET_SEQUENCE_NUMBER: &str = "/admin/get_sequence_number";
pub const ENDPOINT_CHANGE_ROLE_AND_UPSTREAM: &str = "/admin/change_db_role_and_upstream";
pub const ENDPOINT_BACKUP_DB: &str = "/admin/backup_db";
pub const ENDPOINT_BACKUP_DB_TO_S3: &str = "/admin/backup_db_to_s3";
pub const ENDPOINT_RESTORE_DB: &str = "/admin/restore_db";
pub const ENDPOINT_RESTORE_DB_FROM_S3: &str = "/admin/restore_db_from_s3";

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-admin-request-id";

// --- Shared Types ---

/// Role of a replica on its hosting node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicaRole {
    /// Authoritative writer.
    Master,
    /// Follower replicating from an upstream.
    Slave,
    /// Inert placeholder.
    Noop,
}

impl ReplicaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaRole::Master => "MASTER",
            ReplicaRole::Slave => "SLAVE",
            ReplicaRole::Noop => "NOOP",
        }
    }
}

impl fmt::Display for ReplicaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown replica role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for ReplicaRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MASTER" => Ok(ReplicaRole::Master),
            "SLAVE" => Ok(ReplicaRole::Slave),
            "NOOP" => Ok(ReplicaRole::Noop),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The node a slave replica pulls updates from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Upstream {
    pub host: String,
    pub port: u16,
}

impl Upstream {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Closed set of rejection codes a node may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminErrorCode {
    DbNotExist,
    DbExist,
    InvalidDbRole,
    InvalidUpstream,
    DbAdminError,
    DbError,
}

impl fmt::Display for AdminErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            AdminErrorCode::DbNotExist => "DB_NOT_EXIST",
            AdminErrorCode::DbExist => "DB_EXIST",
            AdminErrorCode::InvalidDbRole => "INVALID_DB_ROLE",
            AdminErrorCode::InvalidUpstream => "INVALID_UPSTREAM",
            AdminErrorCode::DbAdminError => "DB_ADMIN_ERROR",
            AdminErrorCode::DbError => "DB_ERROR",
        };
        f.write_str(code)
    }
}

/// Body of every rejected admin call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminErrorResponse {
    pub code: AdminErrorCode,
    pub message: String,
}

/// Acknowledgment for procedures with no payload.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}

// --- Data Transfer Objects ---

/// Opens (or creates) a database on the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDbRequest {
    pub db_name: String,
    /// Upstream recorded for the new replica. Callers pass their own address.
    pub upstream_ip: String,
    #[serde(default)]
    pub upstream_port: Option<u16>,
    pub db_role: ReplicaRole,
    /// Forcibly reinitialize a database that exists but cannot be opened.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseDbRequest {
    pub db_name: String,
}

/// Destroys the content of a database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearDbRequest {
    pub db_name: String,
    /// Reopen the (now empty) database afterwards.
    #[serde(default)]
    pub reopen_db: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactDbRequest {
    pub db_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDbRequest {
    pub db_name: String,
}

/// Point-in-time status of a database. Never cached by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDbResponse {
    pub seq_num: i64,
    pub is_master: bool,
    pub role: ReplicaRole,
    pub upstream: Option<Upstream>,
    pub last_update_timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSequenceNumberRequest {
    pub db_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSequenceNumberResponse {
    pub seq_num: i64,
}

/// Role and upstream are applied together or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDbRoleAndUpstreamRequest {
    pub db_name: String,
    pub new_role: ReplicaRole,
    pub upstream_ip: Option<String>,
    pub upstream_port: Option<u16>,
}

/// Backup to a filesystem-rooted path (e.g. HDFS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDbRequest {
    pub db_name: String,
    pub hdfs_backup_dir: String,
    pub limit_mbs: Option<u32>,
    pub share_files_with_checksum: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDbToS3Request {
    pub db_name: String,
    pub s3_bucket: String,
    pub s3_backup_dir: String,
    pub limit_mbs: Option<u32>,
    pub share_files_with_checksum: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreDbRequest {
    pub db_name: String,
    pub hdfs_backup_dir: String,
    pub upstream_ip: String,
    pub upstream_port: u16,
    pub limit_mbs: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreDbFromS3Request {
    pub db_name: String,
    pub s3_bucket: String,
    pub s3_backup_dir: String,
    pub upstream_ip: String,
    pub upstream_port: u16,
    pub limit_mbs: Option<u32>,
}
