//! Replica Lifecycle Module
//!
//! Translates lifecycle intents (open, promote, snapshot, ...) into correctly sequenced
//! admin calls against local or remote storage nodes, and interprets their outcome.
//!
//! ## Error policy
//! The policy is chosen per operation, not globally:
//! - **Best effort** (`clear_local`, `close_local`, `is_master`, `sequence_number`):
//!   failures are logged and a safe default is returned.
//! - **Fatal** (`open`, `close`, `compact_local`, `change_role_and_upstream`,
//!   `check_status`, `backup`, `restore`): failures surface as `ReplicaError::Runtime`
//!   so the orchestrator can retry the whole transition or escalate.
//!
//! ## Submodules
//! - **`lifecycle`**: open / close / clear / compact / role change / status.
//! - **`consistency`**: sequence numbers and freshness comparison.
//! - **`snapshot`**: backup to and restore from blob storage.

pub mod consistency;
pub mod error;
pub mod lifecycle;
pub mod snapshot;

pub use consistency::{UNKNOWN_SEQUENCE_NUMBER, is_caught_up};
pub use error::ReplicaError;
pub use snapshot::{BackupDestination, TransferSpec};

use crate::admin::{AdminClient, AdminError, LOCALHOST, Upstream};
use crate::config::AgentConfig;

use std::time::Duration;
use tracing::Span;

/// Drives the admin surface of the local node and, where an operation allows it, of
/// remote nodes. Holds configuration only; every operation opens its own client.
#[derive(Debug, Clone)]
pub struct ReplicaAdmin {
    admin_port: u16,
    self_host: String,
    request_timeout: Duration,
    default_rate_limit_mbs: Option<u32>,
    share_files_with_checksum: bool,
    span: Span,
}

impl ReplicaAdmin {
    pub fn new(admin_port: u16, span: Span) -> Self {
        Self::from_config(
            &AgentConfig {
                admin_port,
                ..AgentConfig::default()
            },
            span,
        )
    }

    pub fn from_config(config: &AgentConfig, span: Span) -> Self {
        Self {
            admin_port: config.admin_port,
            self_host: config.self_address.clone(),
            request_timeout: config.request_timeout(),
            default_rate_limit_mbs: config.default_rate_limit_mbs,
            share_files_with_checksum: config.share_files_with_checksum,
            span,
        }
    }

    pub fn admin_port(&self) -> u16 {
        self.admin_port
    }

    /// Address this node advertises as upstream for its own replicas.
    pub fn self_address(&self) -> Upstream {
        Upstream::new(self.self_host.clone(), self.admin_port)
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    fn client(&self, host: &str, port: u16) -> Result<AdminClient, AdminError> {
        AdminClient::connect(host, port, self.request_timeout, self.span.clone())
    }

    fn local_client(&self) -> Result<AdminClient, AdminError> {
        self.client(LOCALHOST, self.admin_port)
    }
}
