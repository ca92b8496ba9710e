//! State Transition Messages
//!
//! The cluster manager delivers lifecycle commands as transition messages
//! (`OFFLINE -> SLAVE` for partition `p2p1_1`, ...). This module holds the envelope as it
//! is consumed here, plus the sanity check agents run before acting on one.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMessage {
    pub from_state: String,
    pub to_state: String,
    pub resource_name: String,
    pub partition_name: String,
}

impl TransitionMessage {
    pub fn new(
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        resource_name: impl Into<String>,
        partition_name: impl Into<String>,
    ) -> Self {
        Self {
            from_state: from_state.into(),
            to_state: to_state.into(),
            resource_name: resource_name.into(),
            partition_name: partition_name.into(),
        }
    }
}

impl fmt::Display for TransitionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {} -> {}",
            self.resource_name, self.partition_name, self.from_state, self.to_state
        )
    }
}

/// Case-insensitive comparison covering non-ASCII letters too.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

pub struct TransitionValidator {
    span: Span,
}

impl TransitionValidator {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// True iff the message matches the expected transition, resource and partition,
    /// ignoring case. A mismatch is logged, never raised.
    pub fn validate(
        &self,
        expected_from: &str,
        expected_to: &str,
        message: &TransitionMessage,
        resource_name: &str,
        partition_name: &str,
    ) -> bool {
        let matches = eq_ignore_case(expected_from, &message.from_state)
            && eq_ignore_case(expected_to, &message.to_state)
            && eq_ignore_case(resource_name, &message.resource_name)
            && eq_ignore_case(partition_name, &message.partition_name);

        if !matches {
            self.span.in_scope(|| {
                tracing::error!("Invalid message: {}", message);
                tracing::error!(
                    "Expected {} to {} for {}/{}",
                    expected_from,
                    expected_to,
                    resource_name,
                    partition_name
                );
            });
        }
        matches
    }

    pub fn log_started(&self, message: &TransitionMessage) {
        self.span.in_scope(|| {
            tracing::info!(
                "Transition started from {} to {} for {}",
                message.from_state,
                message.to_state,
                message.partition_name
            )
        });
    }

    pub fn log_completed(&self, message: &TransitionMessage) {
        self.span.in_scope(|| {
            tracing::info!(
                "Transition completed from {} to {} for {}",
                message.from_state,
                message.to_state,
                message.partition_name
            )
        });
    }
}

#[cfg(test)]
mod tests;
