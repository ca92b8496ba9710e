//! Snapshot/Restore Orchestration
//!
//! Backups go to either a filesystem-rooted path (HDFS style) or an object store
//! bucket/path. The node performs the transfer; this side only picks the procedure and
//! its parameters and waits for completion. Every failure is fatal: a partial backup or
//! restore is never repaired in place, the caller retries the whole operation.

use super::{ReplicaAdmin, ReplicaError};
use crate::admin::protocol::*;
use crate::admin::{AdminError, LOCALHOST};
use crate::naming::PartitionId;

use std::fmt;
use tracing::Instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupDestination {
    Filesystem { path: String },
    ObjectStore { bucket: String, path: String },
}

impl BackupDestination {
    pub fn filesystem(path: impl Into<String>) -> Self {
        BackupDestination::Filesystem { path: path.into() }
    }

    pub fn object_store(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        BackupDestination::ObjectStore {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Object store location of one partition below `base_path`, using the
    /// `part-<shard>-` key prefix.
    pub fn object_store_for_partition(
        bucket: impl Into<String>,
        base_path: &str,
        partition: &PartitionId,
    ) -> Self {
        let base = base_path.trim_end_matches('/');
        let path = if base.is_empty() {
            partition.blob_prefix()
        } else {
            format!("{}/{}", base, partition.blob_prefix())
        };
        Self::object_store(bucket, path)
    }
}

impl fmt::Display for BackupDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupDestination::Filesystem { path } => write!(f, "hdfs:{}", path),
            BackupDestination::ObjectStore { bucket, path } => write!(f, "s3://{}/{}", bucket, path),
        }
    }
}

/// Parameters of one backup or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub destination: BackupDestination,
    /// Bandwidth cap in MB/s. Falls back to the configured default.
    pub rate_limit_mbs: Option<u32>,
    /// Share immutable files across successive backups of the same database.
    pub share_files_with_checksum: Option<bool>,
    /// Where a restored replica resumes replication from. Required for restore.
    pub upstream: Option<Upstream>,
}

impl TransferSpec {
    pub fn new(destination: BackupDestination) -> Self {
        Self {
            destination,
            rate_limit_mbs: None,
            share_files_with_checksum: None,
            upstream: None,
        }
    }

    pub fn with_rate_limit(mut self, limit_mbs: u32) -> Self {
        self.rate_limit_mbs = Some(limit_mbs);
        self
    }

    pub fn with_checksum_sharing(mut self, share: bool) -> Self {
        self.share_files_with_checksum = Some(share);
        self
    }

    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.upstream = Some(upstream);
        self
    }
}

impl ReplicaAdmin {
    fn rate_limit(&self, spec: &TransferSpec) -> Option<u32> {
        spec.rate_limit_mbs.or(self.default_rate_limit_mbs)
    }

    fn checksum_sharing(&self, spec: &TransferSpec) -> bool {
        spec.share_files_with_checksum.unwrap_or(self.share_files_with_checksum)
    }

    /// Snapshots `db_name` on `host:port` to `spec.destination`. Returns once the node
    /// reports the backup complete.
    pub async fn backup(
        &self,
        host: &str,
        port: u16,
        db_name: &str,
        spec: &TransferSpec,
    ) -> Result<(), ReplicaError> {
        let limit_mbs = self.rate_limit(spec);
        let share_files_with_checksum = Some(self.checksum_sharing(spec));

        async move {
            tracing::info!(
                "Backup {} from {} to {} (limit_mbs={:?})",
                db_name,
                host,
                spec.destination,
                limit_mbs
            );
            let client = self
                .client(host, port)
                .map_err(|e| ReplicaError::runtime("backupDB", db_name, e))?;

            let result: Result<(), AdminError> = match &spec.destination {
                BackupDestination::Filesystem { path } => {
                    client
                        .backup_db(&BackupDbRequest {
                            db_name: db_name.to_string(),
                            hdfs_backup_dir: path.clone(),
                            limit_mbs,
                            share_files_with_checksum,
                        })
                        .await
                }
                BackupDestination::ObjectStore { bucket, path } => {
                    client
                        .backup_db_to_s3(&BackupDbToS3Request {
                            db_name: db_name.to_string(),
                            s3_bucket: bucket.clone(),
                            s3_backup_dir: path.clone(),
                            limit_mbs,
                            share_files_with_checksum,
                        })
                        .await
                }
            };

            result.map_err(|e| {
                tracing::error!("Failed to backup DB {}: {}", db_name, e);
                ReplicaError::runtime("backupDB", db_name, e)
            })
        }
        .instrument(self.span.clone())
        .await
    }

    /// Restores `db_name` on `host:port` from `spec.destination` and records
    /// `spec.upstream` as the replica's upstream. Catch-up is left to replication.
    pub async fn restore(
        &self,
        host: &str,
        port: u16,
        db_name: &str,
        spec: &TransferSpec,
    ) -> Result<(), ReplicaError> {
        let Some(upstream) = spec.upstream.as_ref() else {
            return Err(ReplicaError::MissingUpstream {
                db_name: db_name.to_string(),
            });
        };
        let limit_mbs = self.rate_limit(spec);

        async move {
            tracing::info!(
                "Restore {} on {} from {} with upstream {}",
                db_name,
                host,
                spec.destination,
                upstream
            );
            let client = self
                .client(host, port)
                .map_err(|e| ReplicaError::runtime("restoreDB", db_name, e))?;

            let result: Result<(), AdminError> = match &spec.destination {
                BackupDestination::Filesystem { path } => {
                    client
                        .restore_db(&RestoreDbRequest {
                            db_name: db_name.to_string(),
                            hdfs_backup_dir: path.clone(),
                            upstream_ip: upstream.host.clone(),
                            upstream_port: upstream.port,
                            limit_mbs,
                        })
                        .await
                }
                BackupDestination::ObjectStore { bucket, path } => {
                    client
                        .restore_db_from_s3(&RestoreDbFromS3Request {
                            db_name: db_name.to_string(),
                            s3_bucket: bucket.clone(),
                            s3_backup_dir: path.clone(),
                            upstream_ip: upstream.host.clone(),
                            upstream_port: upstream.port,
                            limit_mbs,
                        })
                        .await
                }
            };

            result.map_err(|e| {
                tracing::error!("Failed to restore DB {}: {}", db_name, e);
                ReplicaError::runtime("restoreDB", db_name, e)
            })
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn restore_local(&self, db_name: &str, spec: &TransferSpec) -> Result<(), ReplicaError> {
        self.restore(LOCALHOST, self.admin_port, db_name, spec).await
    }
}
