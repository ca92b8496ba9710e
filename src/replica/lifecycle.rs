//! Replica Lifecycle Operations
//!
//! A replica on a node is `ABSENT`, `CLOSED` or `OPEN` (with a role). Opening is
//! idempotent so that an at-least-once delivery of the same transition is harmless:
//!
//! 1. **try_open**: plain `addDB`. `DB_EXIST` means the replica is already open.
//! 2. **force_reopen**: only after `DB_ERROR`, a single `addDB` with `overwrite` set.
//!
//! Any other outcome is fatal for the transition.

use super::{ReplicaAdmin, ReplicaError};
use crate::admin::protocol::*;
use crate::admin::{AdminClient, AdminError, LOCALHOST};
use crate::naming::PartitionId;
use crate::transition::TransitionMessage;

use tracing::Instrument;

/// Outcome of the first, non-destructive open attempt.
#[derive(Debug, PartialEq, Eq)]
enum OpenAttempt {
    Opened,
    AlreadyOpen,
    /// The database exists but the node cannot open it as is.
    NeedsOverwrite,
}

impl ReplicaAdmin {
    /// Opens `db_name` on the local node as `role`, recording `self_address` as its upstream.
    ///
    /// Only `SLAVE` and `NOOP` may be requested; promotion to `MASTER` goes through
    /// [`ReplicaAdmin::change_role_and_upstream`].
    pub async fn open(
        &self,
        db_name: &str,
        role: ReplicaRole,
        self_address: &Upstream,
    ) -> Result<(), ReplicaError> {
        match role {
            ReplicaRole::Slave | ReplicaRole::Noop => {}
            ReplicaRole::Master => {
                return Err(ReplicaError::InvalidRole {
                    db_name: db_name.to_string(),
                    role: role.to_string(),
                });
            }
        }

        async move {
            tracing::info!("Add local DB {} with role {}", db_name, role);
            let client = self
                .local_client()
                .map_err(|e| ReplicaError::runtime("addDB", db_name, e))?;

            let mut request = AddDbRequest {
                db_name: db_name.to_string(),
                upstream_ip: self_address.host.clone(),
                upstream_port: Some(self_address.port),
                db_role: role,
                overwrite: false,
            };

            match self.try_open(&client, &request).await? {
                OpenAttempt::Opened => Ok(()),
                OpenAttempt::AlreadyOpen => {
                    tracing::info!("{} already exists", db_name);
                    Ok(())
                }
                OpenAttempt::NeedsOverwrite => {
                    request.overwrite = true;
                    self.force_reopen(&client, &request).await
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Like [`ReplicaAdmin::open`], for roles delivered as text by the lifecycle framework.
    pub async fn open_with_role_name(
        &self,
        db_name: &str,
        role: &str,
        self_address: &Upstream,
    ) -> Result<(), ReplicaError> {
        let role: ReplicaRole = role.parse().map_err(|_| ReplicaError::InvalidRole {
            db_name: db_name.to_string(),
            role: role.to_string(),
        })?;
        self.open(db_name, role, self_address).await
    }

    /// Opens `db_name` as a slave of this node. Failures are logged, never returned.
    pub async fn open_or_log(&self, db_name: &str) {
        let self_address = self.self_address();
        if let Err(e) = self.open(db_name, ReplicaRole::Slave, &self_address).await {
            self.span.in_scope(|| {
                tracing::error!("addDB failed for {}: {:#}", db_name, anyhow::Error::new(e))
            });
        }
    }

    /// Opens the database behind `message.partition_name` with the role named by
    /// `message.to_state`, recording this node as its upstream.
    pub async fn open_for_transition(&self, message: &TransitionMessage) -> Result<(), ReplicaError> {
        let db_name = PartitionId::parse(&message.partition_name)?.database_name();
        let self_address = self.self_address();
        self.open_with_role_name(&db_name, &message.to_state, &self_address)
            .await
    }

    async fn try_open(
        &self,
        client: &AdminClient,
        request: &AddDbRequest,
    ) -> Result<OpenAttempt, ReplicaError> {
        let db_name = request.db_name.as_str();
        match client.add_db(request).await {
            Ok(()) => Ok(OpenAttempt::Opened),
            Err(AdminError::Remote { code, message }) => match code {
                AdminErrorCode::DbExist => Ok(OpenAttempt::AlreadyOpen),
                AdminErrorCode::DbError => {
                    tracing::error!("Failed to open {}: {}", db_name, message);
                    Ok(OpenAttempt::NeedsOverwrite)
                }
                AdminErrorCode::DbNotExist
                | AdminErrorCode::InvalidDbRole
                | AdminErrorCode::InvalidUpstream
                | AdminErrorCode::DbAdminError => Err(ReplicaError::runtime(
                    "addDB",
                    db_name,
                    AdminError::Remote { code, message },
                )),
            },
            Err(e) => {
                tracing::error!("AddDB() request for {} failed: {}", db_name, e);
                Err(ReplicaError::runtime("addDB", db_name, e))
            }
        }
    }

    async fn force_reopen(
        &self,
        client: &AdminClient,
        request: &AddDbRequest,
    ) -> Result<(), ReplicaError> {
        tracing::warn!("Trying to overwrite open {}", request.db_name);
        client.add_db(request).await.map_err(|e| {
            tracing::error!("Overwrite open of {} failed: {}", request.db_name, e);
            ReplicaError::runtime("addDB", &request.db_name, e)
        })
    }

    /// Closes `db_name` on `host:port`. The caller addresses a specific node and expects
    /// the database to be there, so a missing database is fatal.
    pub async fn close(&self, host: &str, port: u16, db_name: &str) -> Result<(), ReplicaError> {
        async move {
            tracing::info!("Close DB {} on host {}", db_name, host);
            let client = self
                .client(host, port)
                .map_err(|e| ReplicaError::runtime("closeDB", db_name, e))?;

            let request = CloseDbRequest {
                db_name: db_name.to_string(),
            };
            client.close_db(&request).await.map_err(|e| {
                tracing::error!("CloseDB() of {} on {} failed: {}", db_name, host, e);
                ReplicaError::runtime("closeDB", db_name, e)
            })
        }
        .instrument(self.span.clone())
        .await
    }

    /// Closes `db_name` on the local node. Failures, a missing database included, are
    /// logged and swallowed.
    pub async fn close_local(&self, db_name: &str) {
        let Err(e) = self.close(LOCALHOST, self.admin_port, db_name).await else {
            return;
        };

        self.span.in_scope(|| match e.admin_code() {
            Some(AdminErrorCode::DbNotExist) => {
                tracing::warn!("{} doesn't exist, nothing to close", db_name)
            }
            _ => tracing::error!("closeDB failed for {}: {:#}", db_name, anyhow::Error::new(e)),
        });
    }

    /// Destroys the content of the local `db_name` and leaves it closed. Best effort.
    pub async fn clear_local(&self, db_name: &str) {
        async move {
            tracing::warn!("Clear local DB {}", db_name);
            let client = match self.local_client() {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!("Failed to connect to local admin port: {}", e);
                    return;
                }
            };

            let request = ClearDbRequest {
                db_name: db_name.to_string(),
                reopen_db: false,
            };
            if let Err(e) = client.clear_db(&request).await {
                match e {
                    AdminError::Remote { .. } => tracing::error!("Failed to destroy DB: {}", e),
                    AdminError::Transport { .. } => {
                        tracing::error!("Failed to connect to local admin port: {}", e)
                    }
                    AdminError::Protocol(_) => tracing::error!("ClearDB() request failed: {}", e),
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Starts a background compaction of the local `db_name`.
    pub async fn compact_local(&self, db_name: &str) -> Result<(), ReplicaError> {
        async move {
            tracing::info!("Compact partition {}", db_name);
            let client = self
                .local_client()
                .map_err(|e| ReplicaError::runtime("compactDB", db_name, e))?;

            let request = CompactDbRequest {
                db_name: db_name.to_string(),
            };
            client.compact_db(&request).await.map_err(|e| {
                tracing::error!("Failed to compact {}: {}", db_name, e);
                ReplicaError::runtime("compactDB", db_name, e)
            })
        }
        .instrument(self.span.clone())
        .await
    }

    /// Applies `role` and `upstream` to `db_name` on `host:port` in one call.
    ///
    /// A master names itself as upstream by convention.
    pub async fn change_role_and_upstream(
        &self,
        host: &str,
        port: u16,
        db_name: &str,
        role: ReplicaRole,
        upstream: &Upstream,
    ) -> Result<(), ReplicaError> {
        async move {
            tracing::info!(
                "Change {} on {} to {} with upstream {}",
                db_name,
                host,
                role,
                upstream
            );
            let client = self
                .client(host, port)
                .map_err(|e| ReplicaError::runtime("changeDBRoleAndUpstream", db_name, e))?;

            let request = ChangeDbRoleAndUpstreamRequest {
                db_name: db_name.to_string(),
                new_role: role,
                upstream_ip: Some(upstream.host.clone()),
                upstream_port: Some(upstream.port),
            };
            client
                .change_db_role_and_upstream(&request)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to change role of {}: {}", db_name, e);
                    ReplicaError::runtime("changeDBRoleAndUpstream", db_name, e)
                })
        }
        .instrument(self.span.clone())
        .await
    }

    /// Authoritative status of `db_name` on `host:port`. Always fetched, never cached.
    pub async fn check_status(
        &self,
        host: &str,
        port: u16,
        db_name: &str,
    ) -> Result<CheckDbResponse, ReplicaError> {
        async move {
            let client = self
                .client(host, port)
                .map_err(|e| ReplicaError::runtime("checkDB", db_name, e))?;

            let request = CheckDbRequest {
                db_name: db_name.to_string(),
            };
            client.check_db(&request).await.map_err(|e| {
                tracing::error!("Failed to check DB {}: {}", db_name, e);
                ReplicaError::runtime("checkDB", db_name, e)
            })
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn check_status_local(&self, db_name: &str) -> Result<CheckDbResponse, ReplicaError> {
        self.check_status(LOCALHOST, self.admin_port, db_name).await
    }

    /// Best-effort probe: `false` whenever the status cannot be fetched.
    pub async fn is_master(&self, host: &str, port: u16, db_name: &str) -> bool {
        self.check_status(host, port, db_name)
            .await
            .map(|status| status.is_master)
            .unwrap_or(false)
    }
}
