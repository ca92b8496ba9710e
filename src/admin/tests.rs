//! Admin Module Tests
//!
//! Validates the wire contract of the admin surface and how the client classifies
//! failures.
//!
//! ## Test Scopes
//! - **Protocol**: Error codes and roles on the wire.
//! - **Client**: Successful calls, remote rejections, unreachable nodes and malformed answers.

#[cfg(test)]
mod tests {
    use crate::admin::protocol::*;
    use crate::admin::{AdminClient, AdminError};
    use crate::node::{self, InMemoryAdminNode};
    use axum::{Router, http::StatusCode, routing::post};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Span;

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn start_node() -> (Arc<InMemoryAdminNode>, u16) {
        let node = Arc::new(InMemoryAdminNode::new(Span::none()));
        let (addr, _handle) = node::spawn("127.0.0.1:0".parse().unwrap(), node.clone())
            .await
            .unwrap();
        (node, addr.port())
    }

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn add_request(db_name: &str, role: ReplicaRole) -> AddDbRequest {
        AddDbRequest {
            db_name: db_name.to_string(),
            upstream_ip: "127.0.0.1".to_string(),
            upstream_port: None,
            db_role: role,
            overwrite: false,
        }
    }

    // ============================================================
    // PROTOCOL TESTS
    // ============================================================

    #[test]
    fn test_error_codes_on_the_wire() {
        let json = serde_json::to_string(&AdminErrorCode::DbExist).unwrap();
        assert_eq!(json, "\"DB_EXIST\"");

        let code: AdminErrorCode = serde_json::from_str("\"DB_NOT_EXIST\"").unwrap();
        assert_eq!(code, AdminErrorCode::DbNotExist);
        assert_eq!(AdminErrorCode::DbError.to_string(), "DB_ERROR");
    }

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("slave".parse::<ReplicaRole>().unwrap(), ReplicaRole::Slave);
        assert_eq!("Master".parse::<ReplicaRole>().unwrap(), ReplicaRole::Master);
        assert_eq!("NOOP".parse::<ReplicaRole>().unwrap(), ReplicaRole::Noop);
        assert!("LEADER".parse::<ReplicaRole>().is_err());
    }

    #[test]
    fn test_role_wire_format_matches_display() {
        for role in [ReplicaRole::Master, ReplicaRole::Slave, ReplicaRole::Noop] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    // ============================================================
    // CLIENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_add_then_check_db() {
        // ARRANGE
        let (_node, port) = start_node().await;
        let client = AdminClient::connect_local(port, TIMEOUT, Span::none()).unwrap();

        // ACT
        client.add_db(&add_request("seg00001", ReplicaRole::Slave)).await.unwrap();
        let status = client
            .check_db(&CheckDbRequest {
                db_name: "seg00001".to_string(),
            })
            .await
            .unwrap();

        // ASSERT
        assert_eq!(status.role, ReplicaRole::Slave);
        assert!(!status.is_master);
        assert_eq!(status.seq_num, 0);
    }

    #[tokio::test]
    async fn test_remote_rejection_carries_code() {
        let (_node, port) = start_node().await;
        let client = AdminClient::connect_local(port, TIMEOUT, Span::none()).unwrap();

        client.add_db(&add_request("seg00002", ReplicaRole::Noop)).await.unwrap();
        let err = client
            .add_db(&add_request("seg00002", ReplicaRole::Noop))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(AdminErrorCode::DbExist));
    }

    #[tokio::test]
    async fn test_missing_db_is_db_not_exist() {
        let (_node, port) = start_node().await;
        let client = AdminClient::connect_local(port, TIMEOUT, Span::none()).unwrap();

        let err = client
            .get_sequence_number(&GetSequenceNumberRequest {
                db_name: "missing00000".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AdminError::Remote {
                code: AdminErrorCode::DbNotExist,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let port = closed_port().await;
        let client = AdminClient::connect_local(port, TIMEOUT, Span::none()).unwrap();

        let err = client
            .close_db(&CloseDbRequest {
                db_name: "seg00003".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Transport { .. }));
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn test_malformed_answers_are_protocol_errors() {
        // ARRANGE: a server that speaks HTTP but not the admin protocol
        let app = Router::new()
            .route(ENDPOINT_CHECK_DB, post(|| async { "definitely not json" }))
            .route(
                ENDPOINT_COMPACT_DB,
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = AdminClient::connect_local(port, TIMEOUT, Span::none()).unwrap();

        // ACT
        let check = client
            .check_db(&CheckDbRequest {
                db_name: "seg00004".to_string(),
            })
            .await;
        let compact = client
            .compact_db(&CompactDbRequest {
                db_name: "seg00004".to_string(),
            })
            .await;

        // ASSERT
        assert!(matches!(check, Err(AdminError::Protocol(_))));
        assert!(matches!(compact, Err(AdminError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_generic_call_reaches_endpoint() {
        let (node, port) = start_node().await;
        let client = AdminClient::connect("127.0.0.1", port, TIMEOUT, Span::none()).unwrap();
        assert_eq!(client.addr(), format!("127.0.0.1:{}", port));

        client.add_db(&add_request("seg00005", ReplicaRole::Slave)).await.unwrap();
        node.apply_writes("seg00005", 7).unwrap();

        let response: GetSequenceNumberResponse = client
            .call(
                ENDPOINT_GET_SEQUENCE_NUMBER,
                &GetSequenceNumberRequest {
                    db_name: "seg00005".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.seq_num, 7);
        assert_eq!(node.request_count(), 2);
    }
}
