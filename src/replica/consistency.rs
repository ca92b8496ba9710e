//! Consistency Verification
//!
//! Sequence numbers are the storage engine's monotonic write-progress counter. They are
//! only ever read here, to compare how fresh two replicas are.

use super::{ReplicaAdmin, ReplicaError};
use crate::admin::protocol::GetSequenceNumberRequest;
use crate::admin::{LOCALHOST, Upstream};

use tracing::Instrument;

/// Returned when a sequence number could not be fetched. Sorts below every real value,
/// so an unreachable replica is never considered caught up.
pub const UNKNOWN_SEQUENCE_NUMBER: i64 = -1;

/// True iff both sides are known and `local` has reached `upstream`.
pub fn is_caught_up(local: i64, upstream: i64) -> bool {
    local != UNKNOWN_SEQUENCE_NUMBER && upstream != UNKNOWN_SEQUENCE_NUMBER && local >= upstream
}

impl ReplicaAdmin {
    /// Latest sequence number of `db_name` on `host:port`, or [`UNKNOWN_SEQUENCE_NUMBER`]
    /// on any failure.
    pub async fn sequence_number(&self, host: &str, port: u16, db_name: &str) -> i64 {
        async move {
            tracing::debug!("Get seq number from {} for {}", host, db_name);
            let client = match self.client(host, port) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!("Failed to get sequence number: {}", e);
                    return UNKNOWN_SEQUENCE_NUMBER;
                }
            };

            let request = GetSequenceNumberRequest {
                db_name: db_name.to_string(),
            };
            match client.get_sequence_number(&request).await {
                Ok(response) => {
                    tracing::debug!(
                        "Seq number for {} on {}: {}",
                        db_name,
                        host,
                        response.seq_num
                    );
                    response.seq_num
                }
                Err(e) => {
                    tracing::error!("Failed to get sequence number: {}", e);
                    UNKNOWN_SEQUENCE_NUMBER
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Latest sequence number of the local `db_name`. An unknown value is an error here.
    pub async fn local_sequence_number(&self, db_name: &str) -> Result<i64, ReplicaError> {
        let seq_num = self.sequence_number(LOCALHOST, self.admin_port, db_name).await;
        if seq_num == UNKNOWN_SEQUENCE_NUMBER {
            return Err(ReplicaError::Runtime {
                operation: "getSequenceNumber",
                db_name: db_name.to_string(),
                source: None,
            });
        }

        self.span
            .in_scope(|| tracing::info!("Local seq number of {}: {}", db_name, seq_num));
        Ok(seq_num)
    }

    /// Probes `candidates` one after another and returns the one holding the freshest copy
    /// of `db_name`. Candidates that cannot be probed are skipped; ties keep the earlier one.
    pub async fn most_up_to_date(
        &self,
        db_name: &str,
        candidates: &[Upstream],
    ) -> Option<(Upstream, i64)> {
        let mut best: Option<(Upstream, i64)> = None;

        for candidate in candidates {
            let seq_num = self
                .sequence_number(&candidate.host, candidate.port, db_name)
                .await;
            if seq_num == UNKNOWN_SEQUENCE_NUMBER {
                continue;
            }
            if best.as_ref().is_none_or(|(_, best_seq)| seq_num > *best_seq) {
                best = Some((candidate.clone(), seq_num));
            }
        }

        best
    }
}
