use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::memory::{AdminResult, InMemoryAdminNode, filesystem_key, object_store_key};
use crate::admin::protocol::*;

fn status_for(code: AdminErrorCode) -> StatusCode {
    match code {
        AdminErrorCode::DbExist => StatusCode::CONFLICT,
        AdminErrorCode::DbNotExist => StatusCode::NOT_FOUND,
        AdminErrorCode::InvalidDbRole | AdminErrorCode::InvalidUpstream => StatusCode::BAD_REQUEST,
        AdminErrorCode::DbAdminError | AdminErrorCode::DbError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn respond<T: Serialize>(operation: &str, result: AdminResult<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(rejection) => {
            tracing::warn!(
                "{} rejected with {}: {}",
                operation,
                rejection.code,
                rejection.message
            );
            (status_for(rejection.code), Json(rejection)).into_response()
        }
    }
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

fn acked(result: AdminResult<()>) -> AdminResult<EmptyResponse> {
    result.map(|_| EmptyResponse::default())
}

pub async fn handle_add_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<AddDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Add DB {} as {} (overwrite={})",
            req.db_name,
            req.db_role,
            req.overwrite
        );
        node.add_db(&req)
    });
    respond("addDB", acked(result))
}

pub async fn handle_close_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<CloseDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(request_id = request_id(&headers), "Close DB {}", req.db_name);
        node.close_db(&req)
    });
    respond("closeDB", acked(result))
}

pub async fn handle_clear_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<ClearDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Clear DB {} (reopen={})",
            req.db_name,
            req.reopen_db
        );
        node.clear_db(&req)
    });
    respond("clearDB", acked(result))
}

pub async fn handle_compact_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<CompactDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(request_id = request_id(&headers), "Compact DB {}", req.db_name);
        node.compact_db(&req)
    });
    respond("compactDB", acked(result))
}

pub async fn handle_check_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<CheckDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::debug!(request_id = request_id(&headers), "Check DB {}", req.db_name);
        node.check_db(&req)
    });
    respond("checkDB", result)
}

pub async fn handle_get_sequence_number(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<GetSequenceNumberRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::debug!(
            request_id = request_id(&headers),
            "Get sequence number of {}",
            req.db_name
        );
        node.get_sequence_number(&req)
    });
    respond("getSequenceNumber", result)
}

pub async fn handle_change_db_role_and_upstream(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<ChangeDbRoleAndUpstreamRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Change {} to {} with upstream {:?}:{:?}",
            req.db_name,
            req.new_role,
            req.upstream_ip,
            req.upstream_port
        );
        node.change_db_role_and_upstream(&req)
    });
    respond("changeDBRoleAndUpstream", acked(result))
}

pub async fn handle_backup_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<BackupDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Backup {} to {} (limit_mbs={:?})",
            req.db_name,
            req.hdfs_backup_dir,
            req.limit_mbs
        );
        node.backup(
            &req.db_name,
            filesystem_key(&req.hdfs_backup_dir),
            req.limit_mbs,
            req.share_files_with_checksum.unwrap_or(false),
        )
    });
    respond("backupDB", acked(result))
}

pub async fn handle_backup_db_to_s3(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<BackupDbToS3Request>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Backup {} to s3://{}/{} (limit_mbs={:?})",
            req.db_name,
            req.s3_bucket,
            req.s3_backup_dir,
            req.limit_mbs
        );
        node.backup(
            &req.db_name,
            object_store_key(&req.s3_bucket, &req.s3_backup_dir),
            req.limit_mbs,
            req.share_files_with_checksum.unwrap_or(false),
        )
    });
    respond("backupDBToS3", acked(result))
}

pub async fn handle_restore_db(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<RestoreDbRequest>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Restore {} from {} with upstream {}:{}",
            req.db_name,
            req.hdfs_backup_dir,
            req.upstream_ip,
            req.upstream_port
        );
        node.restore(
            &req.db_name,
            &filesystem_key(&req.hdfs_backup_dir),
            Upstream::new(req.upstream_ip.clone(), req.upstream_port),
        )
    });
    respond("restoreDB", acked(result))
}

pub async fn handle_restore_db_from_s3(
    Extension(node): Extension<Arc<InMemoryAdminNode>>,
    headers: HeaderMap,
    Json(req): Json<RestoreDbFromS3Request>,
) -> Response {
    node.record_request();
    let result = node.span().in_scope(|| {
        tracing::info!(
            request_id = request_id(&headers),
            "Restore {} from s3://{}/{} with upstream {}:{}",
            req.db_name,
            req.s3_bucket,
            req.s3_backup_dir,
            req.upstream_ip,
            req.upstream_port
        );
        node.restore(
            &req.db_name,
            &object_store_key(&req.s3_bucket, &req.s3_backup_dir),
            Upstream::new(req.upstream_ip.clone(), req.upstream_port),
        )
    });
    respond("restoreDBFromS3", acked(result))
}
