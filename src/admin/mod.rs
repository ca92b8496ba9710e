//! Admin RPC Module
//!
//! The uniform administrative surface every storage node exposes, seen from the
//! caller's side.
//!
//! ## Submodules
//! - **`protocol`**: Endpoints, request/response DTOs, roles and the closed set of error codes.
//! - **`client`**: `AdminClient`, one connection per logical call group.
//! - **`error`**: `AdminError`, separating transport failures, remote rejections and malformed answers.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{AdminClient, LOCALHOST};
pub use error::AdminError;
pub use protocol::{AdminErrorCode, ReplicaRole, Upstream};

#[cfg(test)]
mod tests;
