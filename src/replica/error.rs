use crate::admin::{AdminError, AdminErrorCode};
use crate::naming::NamingError;

#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    /// Rejected before any RPC was issued.
    #[error("invalid db role requested for {db_name}: {role}")]
    InvalidRole { db_name: String, role: String },

    /// Restore needs to know where the replica resumes replication from.
    #[error("no upstream given for restore of {db_name}")]
    MissingUpstream { db_name: String },

    #[error(transparent)]
    MalformedPartitionId(#[from] NamingError),

    /// A state-changing admin operation did not complete.
    #[error("{operation} failed for {db_name}")]
    Runtime {
        operation: &'static str,
        db_name: String,
        #[source]
        source: Option<AdminError>,
    },
}

impl ReplicaError {
    pub(crate) fn runtime(operation: &'static str, db_name: &str, source: AdminError) -> Self {
        ReplicaError::Runtime {
            operation,
            db_name: db_name.to_string(),
            source: Some(source),
        }
    }

    pub fn admin_error(&self) -> Option<&AdminError> {
        match self {
            ReplicaError::Runtime { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Remote rejection code behind a runtime failure, if any.
    pub fn admin_code(&self) -> Option<AdminErrorCode> {
        self.admin_error().and_then(AdminError::code)
    }
}
