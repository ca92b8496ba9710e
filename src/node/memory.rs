//! In-Memory Admin Node
//!
//! Keeps per-database replica state and a blob store of snapshots, and answers admin
//! procedures with the same rejection codes a real storage node uses. Data pages are
//! not modelled; a database is its lifecycle state plus a sequence number.

use crate::admin::protocol::*;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::Span;

pub type AdminResult<T> = Result<T, AdminErrorResponse>;

fn reject<T>(code: AdminErrorCode, message: impl Into<String>) -> AdminResult<T> {
    Err(AdminErrorResponse {
        code,
        message: message.into(),
    })
}

fn not_open<T>(db_name: &str) -> AdminResult<T> {
    reject(
        AdminErrorCode::DbNotExist,
        format!("{} is not open on this node", db_name),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    Open,
    Closed,
    /// Present on disk but cannot be opened without overwriting.
    Damaged,
}

#[derive(Debug, Clone)]
pub struct DbEntry {
    pub state: DbState,
    pub role: ReplicaRole,
    pub upstream: Option<Upstream>,
    pub seq_num: i64,
    pub last_update_timestamp_ms: u64,
    pub compactions: u64,
}

impl DbEntry {
    fn fresh(role: ReplicaRole, upstream: Option<Upstream>) -> Self {
        Self {
            state: DbState::Open,
            role,
            upstream,
            seq_num: 0,
            last_update_timestamp_ms: now_ms(),
            compactions: 0,
        }
    }
}

/// A backup stored under one destination.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub db_name: String,
    pub seq_num: i64,
    pub limit_mbs: Option<u32>,
    pub share_files_with_checksum: bool,
    /// Number of backups written to this destination so far.
    pub generation: u64,
    /// Files of the previous generation were kept instead of transferred again.
    pub reused_files: bool,
}

/// Identifies where a snapshot lives.
pub fn filesystem_key(dir: &str) -> String {
    format!("hdfs://{}", dir.trim_end_matches('/'))
}

pub fn object_store_key(bucket: &str, dir: &str) -> String {
    format!("s3://{}/{}", bucket, dir.trim_matches('/'))
}

pub struct InMemoryAdminNode {
    databases: DashMap<String, DbEntry>,
    snapshots: DashMap<String, Snapshot>,
    requests: AtomicU64,
    span: Span,
}

impl InMemoryAdminNode {
    pub fn new(span: Span) -> Self {
        Self {
            databases: DashMap::new(),
            snapshots: DashMap::new(),
            requests: AtomicU64::new(0),
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Total admin requests served since startup.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn database(&self, db_name: &str) -> Option<DbEntry> {
        self.databases.get(db_name).map(|entry| entry.value().clone())
    }

    pub fn snapshot(&self, key: &str) -> Option<Snapshot> {
        self.snapshots.get(key).map(|entry| entry.value().clone())
    }

    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    pub fn add_db(&self, req: &AddDbRequest) -> AdminResult<()> {
        let upstream = req
            .upstream_port
            .map(|port| Upstream::new(req.upstream_ip.clone(), port));

        match self.databases.entry(req.db_name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(DbEntry::fresh(req.db_role, upstream));
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let state = slot.get().state;
                match state {
                    DbState::Open => reject(
                        AdminErrorCode::DbExist,
                        format!("{} is already open", req.db_name),
                    ),
                    DbState::Damaged if !req.overwrite => reject(
                        AdminErrorCode::DbError,
                        format!("{} exists but could not be opened", req.db_name),
                    ),
                    DbState::Damaged => {
                        tracing::warn!("Overwriting damaged DB {}", req.db_name);
                        slot.insert(DbEntry::fresh(req.db_role, upstream));
                        Ok(())
                    }
                    DbState::Closed => {
                        let entry = slot.get_mut();
                        entry.state = DbState::Open;
                        entry.role = req.db_role;
                        entry.upstream = upstream;
                        Ok(())
                    }
                }
            }
        }
    }

    pub fn close_db(&self, req: &CloseDbRequest) -> AdminResult<()> {
        match self.databases.get_mut(&req.db_name) {
            Some(mut entry) if entry.state == DbState::Open => {
                entry.state = DbState::Closed;
                Ok(())
            }
            _ => not_open(&req.db_name),
        }
    }

    pub fn clear_db(&self, req: &ClearDbRequest) -> AdminResult<()> {
        let Some(mut entry) = self.databases.get_mut(&req.db_name) else {
            return reject(
                AdminErrorCode::DbNotExist,
                format!("{} does not exist", req.db_name),
            );
        };

        entry.seq_num = 0;
        entry.last_update_timestamp_ms = now_ms();
        entry.state = if req.reopen_db {
            DbState::Open
        } else {
            DbState::Closed
        };
        Ok(())
    }

    pub fn compact_db(&self, req: &CompactDbRequest) -> AdminResult<()> {
        match self.databases.get_mut(&req.db_name) {
            Some(mut entry) if entry.state == DbState::Open => {
                entry.compactions += 1;
                Ok(())
            }
            _ => not_open(&req.db_name),
        }
    }

    pub fn check_db(&self, req: &CheckDbRequest) -> AdminResult<CheckDbResponse> {
        match self.databases.get(&req.db_name) {
            Some(entry) if entry.state == DbState::Open => Ok(CheckDbResponse {
                seq_num: entry.seq_num,
                is_master: entry.role == ReplicaRole::Master,
                role: entry.role,
                upstream: entry.upstream.clone(),
                last_update_timestamp_ms: entry.last_update_timestamp_ms,
            }),
            _ => not_open(&req.db_name),
        }
    }

    pub fn get_sequence_number(
        &self,
        req: &GetSequenceNumberRequest,
    ) -> AdminResult<GetSequenceNumberResponse> {
        match self.databases.get(&req.db_name) {
            Some(entry) if entry.state == DbState::Open => Ok(GetSequenceNumberResponse {
                seq_num: entry.seq_num,
            }),
            _ => not_open(&req.db_name),
        }
    }

    pub fn change_db_role_and_upstream(
        &self,
        req: &ChangeDbRoleAndUpstreamRequest,
    ) -> AdminResult<()> {
        let upstream = match (&req.upstream_ip, req.upstream_port) {
            (Some(ip), Some(port)) => Some(Upstream::new(ip.clone(), port)),
            _ => None,
        };
        if req.new_role == ReplicaRole::Slave && upstream.is_none() {
            return reject(
                AdminErrorCode::InvalidUpstream,
                format!("{} cannot become SLAVE without an upstream", req.db_name),
            );
        }

        match self.databases.get_mut(&req.db_name) {
            Some(mut entry) if entry.state == DbState::Open => {
                entry.role = req.new_role;
                entry.upstream = upstream;
                Ok(())
            }
            _ => not_open(&req.db_name),
        }
    }

    /// Writes a snapshot of `db_name` under `key`.
    pub fn backup(
        &self,
        db_name: &str,
        key: String,
        limit_mbs: Option<u32>,
        share_files_with_checksum: bool,
    ) -> AdminResult<()> {
        let seq_num = match self.databases.get(db_name) {
            Some(entry) if entry.state == DbState::Open => entry.seq_num,
            _ => return not_open(db_name),
        };

        let previous = self.snapshot(&key);
        let generation = previous.as_ref().map(|s| s.generation + 1).unwrap_or(1);
        let reused_files = share_files_with_checksum
            && previous.is_some_and(|s| s.db_name == db_name && s.share_files_with_checksum);

        tracing::debug!(
            "Backup of {} to {} (generation {}, reused_files={})",
            db_name,
            key,
            generation,
            reused_files
        );
        self.snapshots.insert(
            key,
            Snapshot {
                db_name: db_name.to_string(),
                seq_num,
                limit_mbs,
                share_files_with_checksum,
                generation,
                reused_files,
            },
        );
        Ok(())
    }

    /// Replaces `db_name` with the snapshot under `key` and opens it as a slave of
    /// `upstream`.
    pub fn restore(&self, db_name: &str, key: &str, upstream: Upstream) -> AdminResult<()> {
        let Some(snapshot) = self.snapshot(key) else {
            return reject(AdminErrorCode::DbError, format!("no backup found at {}", key));
        };

        self.databases.insert(
            db_name.to_string(),
            DbEntry {
                state: DbState::Open,
                role: ReplicaRole::Slave,
                upstream: Some(upstream),
                seq_num: snapshot.seq_num,
                last_update_timestamp_ms: now_ms(),
                compactions: 0,
            },
        );
        Ok(())
    }

    /// Simulates `count` writes landing on an open database. Returns the new sequence number.
    pub fn apply_writes(&self, db_name: &str, count: u64) -> AdminResult<i64> {
        match self.databases.get_mut(db_name) {
            Some(mut entry) if entry.state == DbState::Open => {
                entry.seq_num = entry.seq_num.saturating_add_unsigned(count);
                entry.last_update_timestamp_ms = now_ms();
                Ok(entry.seq_num)
            }
            _ => not_open(db_name),
        }
    }

    /// Puts a database into a state where it can only be opened with `overwrite`.
    pub fn mark_damaged(&self, db_name: &str) {
        self.databases
            .entry(db_name.to_string())
            .or_insert_with(|| DbEntry::fresh(ReplicaRole::Noop, None))
            .state = DbState::Damaged;
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
