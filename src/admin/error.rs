use super::protocol::AdminErrorCode;

/// Outcome of a single admin call that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The node could not be reached or the connection broke mid-call.
    #[error("transport error talking to {addr}: {source}")]
    Transport {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node understood the request and rejected it.
    #[error("remote admin error {code}: {message}")]
    Remote {
        code: AdminErrorCode,
        message: String,
    },

    /// The node answered with something that is not a valid admin response.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl AdminError {
    /// The remote rejection code, if this is a structured rejection.
    pub fn code(&self) -> Option<AdminErrorCode> {
        match self {
            AdminError::Remote { code, .. } => Some(*code),
            AdminError::Transport { .. } | AdminError::Protocol(_) => None,
        }
    }
}
