//! Partition Replica Admin Library
//!
//! Control-plane logic for driving the lifecycle of a replicated shard ("partition")
//! hosted on storage nodes that expose a uniform admin RPC surface.
//!
//! ## Modules
//! - **`admin`**: The admin RPC surface: endpoints, DTOs, error codes and the `AdminClient`.
//! - **`naming`**: Partition name -> database name / blob prefix / metadata location.
//! - **`replica`**: Lifecycle operations (open, close, clear, compact, role change, status),
//!   consistency checks on sequence numbers, and backup/restore orchestration.
//! - **`transition`**: Transition message envelope and its sanity check.
//! - **`node`**: An in-memory admin node serving the same surface, for tests and local runs.
//! - **`config`**: Agent settings loaded from the environment.

pub mod admin;
pub mod config;
pub mod naming;
pub mod node;
pub mod replica;
pub mod transition;
