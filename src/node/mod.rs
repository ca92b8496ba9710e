//! In-Memory Admin Node Module
//!
//! A self-contained implementation of the admin RPC surface, served over HTTP.
//! It lets the lifecycle logic be exercised end-to-end without a real storage engine
//! and can be run standalone from the binary.
//!
//! ## Submodules
//! - **`memory`**: DashMap-backed replica state and snapshot store.
//! - **`handlers`**: Axum handlers translating admin DTOs to node operations.

pub mod handlers;
pub mod memory;

pub use memory::InMemoryAdminNode;

use crate::admin::protocol::*;
use handlers::*;

use anyhow::Result;
use axum::{Router, extract::Extension, routing::post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub fn router(node: Arc<InMemoryAdminNode>) -> Router {
    Router::new()
        .route(ENDPOINT_ADD_DB, post(handle_add_db))
        .route(ENDPOINT_CLOSE_DB, post(handle_close_db))
        .route(ENDPOINT_CLEAR_DB, post(handle_clear_db))
        .route(ENDPOINT_COMPACT_DB, post(handle_compact_db))
        .route(ENDPOINT_CHECK_DB, post(handle_check_db))
        .route(ENDPOINT_GET_SEQUENCE_NUMBER, post(handle_get_sequence_number))
        .route(
            ENDPOINT_CHANGE_ROLE_AND_UPSTREAM,
            post(handle_change_db_role_and_upstream),
        )
        .route(ENDPOINT_BACKUP_DB, post(handle_backup_db))
        .route(ENDPOINT_BACKUP_DB_TO_S3, post(handle_backup_db_to_s3))
        .route(ENDPOINT_RESTORE_DB, post(handle_restore_db))
        .route(ENDPOINT_RESTORE_DB_FROM_S3, post(handle_restore_db_from_s3))
        .layer(Extension(node))
}

/// Serves the admin surface of `node` on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, node: Arc<InMemoryAdminNode>) -> Result<()> {
    axum::serve(listener, router(node)).await?;
    Ok(())
}

/// Binds `bind_addr` and serves `node` in the background.
///
/// Returns the actual bound address, so `127.0.0.1:0` can be used to pick a free port.
pub async fn spawn(
    bind_addr: SocketAddr,
    node: Arc<InMemoryAdminNode>,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, node).await {
            tracing::error!("Admin node on {} stopped: {}", local_addr, e);
        }
    });

    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests;
