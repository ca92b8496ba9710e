//! Node Module Tests
//!
//! Validates the replica state machine of the in-memory admin node directly, without
//! going through HTTP.
//!
//! ## Test Scopes
//! - **Open/Close**: `ABSENT -> OPEN -> CLOSED -> OPEN`, `DB_EXIST`, damaged databases.
//! - **Clear/Compact**: content reset and the open-database requirement.
//! - **Role changes**: role and upstream applied together or not at all.
//! - **Snapshots**: backup generations, checksum sharing and restore.

#[cfg(test)]
mod tests {
    use crate::admin::protocol::*;
    use crate::node::memory::{DbState, InMemoryAdminNode, filesystem_key, object_store_key};
    use tracing::Span;

    fn node() -> InMemoryAdminNode {
        InMemoryAdminNode::new(Span::none())
    }

    fn add(db_name: &str, role: ReplicaRole, overwrite: bool) -> AddDbRequest {
        AddDbRequest {
            db_name: db_name.to_string(),
            upstream_ip: "10.0.0.1".to_string(),
            upstream_port: Some(9090),
            db_role: role,
            overwrite,
        }
    }

    fn code<T: std::fmt::Debug>(result: Result<T, AdminErrorResponse>) -> AdminErrorCode {
        result.unwrap_err().code
    }

    // ============================================================
    // OPEN / CLOSE TESTS
    // ============================================================

    #[test]
    fn test_open_close_reopen() {
        let node = node();

        node.add_db(&add("db00001", ReplicaRole::Slave, false)).unwrap();
        assert_eq!(
            code(node.add_db(&add("db00001", ReplicaRole::Slave, false))),
            AdminErrorCode::DbExist
        );

        node.close_db(&CloseDbRequest {
            db_name: "db00001".to_string(),
        })
        .unwrap();
        assert_eq!(node.database("db00001").unwrap().state, DbState::Closed);

        // Reopening a closed database takes the requested role
        node.add_db(&add("db00001", ReplicaRole::Noop, false)).unwrap();
        let entry = node.database("db00001").unwrap();
        assert_eq!(entry.state, DbState::Open);
        assert_eq!(entry.role, ReplicaRole::Noop);
        assert_eq!(entry.upstream, Some(Upstream::new("10.0.0.1", 9090)));
    }

    #[test]
    fn test_close_requires_open_db() {
        let node = node();
        let close = CloseDbRequest {
            db_name: "db00002".to_string(),
        };

        assert_eq!(code(node.close_db(&close)), AdminErrorCode::DbNotExist);

        node.add_db(&add("db00002", ReplicaRole::Slave, false)).unwrap();
        node.close_db(&close).unwrap();
        assert_eq!(code(node.close_db(&close)), AdminErrorCode::DbNotExist);
    }

    #[test]
    fn test_damaged_db_needs_overwrite() {
        let node = node();
        node.add_db(&add("db00003", ReplicaRole::Slave, false)).unwrap();
        node.apply_writes("db00003", 10).unwrap();
        node.mark_damaged("db00003");

        assert_eq!(
            code(node.add_db(&add("db00003", ReplicaRole::Slave, false))),
            AdminErrorCode::DbError
        );

        node.add_db(&add("db00003", ReplicaRole::Slave, true)).unwrap();
        let entry = node.database("db00003").unwrap();
        assert_eq!(entry.state, DbState::Open);
        assert_eq!(entry.seq_num, 0, "overwrite reinitializes the database");
    }

    #[test]
    fn test_sequence_number_never_moves_backwards() {
        let node = node();
        node.add_db(&add("db00011", ReplicaRole::Slave, false)).unwrap();

        assert_eq!(node.apply_writes("db00011", 4).unwrap(), 4);
        assert_eq!(node.apply_writes("db00011", 0).unwrap(), 4);
        assert_eq!(node.apply_writes("db00011", u64::MAX).unwrap(), i64::MAX);
        assert_eq!(node.apply_writes("db00011", 1).unwrap(), i64::MAX);
    }

    // ============================================================
    // CLEAR / COMPACT TESTS
    // ============================================================

    #[test]
    fn test_clear_resets_and_closes() {
        let node = node();
        node.add_db(&add("db00004", ReplicaRole::Slave, false)).unwrap();
        node.apply_writes("db00004", 5).unwrap();

        node.clear_db(&ClearDbRequest {
            db_name: "db00004".to_string(),
            reopen_db: false,
        })
        .unwrap();

        let entry = node.database("db00004").unwrap();
        assert_eq!(entry.state, DbState::Closed);
        assert_eq!(entry.seq_num, 0);

        assert_eq!(
            code(node.clear_db(&ClearDbRequest {
                db_name: "nope00000".to_string(),
                reopen_db: false,
            })),
            AdminErrorCode::DbNotExist
        );
    }

    #[test]
    fn test_compact_counts_and_requires_open_db() {
        let node = node();
        let compact = CompactDbRequest {
            db_name: "db00005".to_string(),
        };
        assert_eq!(code(node.compact_db(&compact)), AdminErrorCode::DbNotExist);

        node.add_db(&add("db00005", ReplicaRole::Slave, false)).unwrap();
        node.compact_db(&compact).unwrap();
        node.compact_db(&compact).unwrap();
        assert_eq!(node.database("db00005").unwrap().compactions, 2);
    }

    // ============================================================
    // ROLE CHANGE TESTS
    // ============================================================

    #[test]
    fn test_slave_without_upstream_is_rejected_atomically() {
        let node = node();
        node.add_db(&add("db00006", ReplicaRole::Noop, false)).unwrap();

        let result = node.change_db_role_and_upstream(&ChangeDbRoleAndUpstreamRequest {
            db_name: "db00006".to_string(),
            new_role: ReplicaRole::Slave,
            upstream_ip: Some("10.0.0.2".to_string()),
            upstream_port: None,
        });

        assert_eq!(code(result), AdminErrorCode::InvalidUpstream);
        let entry = node.database("db00006").unwrap();
        assert_eq!(entry.role, ReplicaRole::Noop, "role must not change on rejection");
        assert_eq!(entry.upstream, Some(Upstream::new("10.0.0.1", 9090)));
    }

    #[test]
    fn test_promote_to_master() {
        let node = node();
        node.add_db(&add("db00007", ReplicaRole::Slave, false)).unwrap();

        node.change_db_role_and_upstream(&ChangeDbRoleAndUpstreamRequest {
            db_name: "db00007".to_string(),
            new_role: ReplicaRole::Master,
            upstream_ip: Some("10.0.0.1".to_string()),
            upstream_port: Some(9090),
        })
        .unwrap();

        let status = node
            .check_db(&CheckDbRequest {
                db_name: "db00007".to_string(),
            })
            .unwrap();
        assert!(status.is_master);
        assert_eq!(status.role, ReplicaRole::Master);
    }

    // ============================================================
    // SNAPSHOT TESTS
    // ============================================================

    #[test]
    fn test_backup_generations_and_checksum_sharing() {
        let node = node();
        node.add_db(&add("db00008", ReplicaRole::Slave, false)).unwrap();
        let key = object_store_key("bucket", "/backups/db00008/");
        assert_eq!(key, "s3://bucket/backups/db00008");

        node.backup("db00008", key.clone(), Some(32), true).unwrap();
        let first = node.snapshot(&key).unwrap();
        assert_eq!(first.generation, 1);
        assert!(!first.reused_files);
        assert_eq!(first.limit_mbs, Some(32));

        node.apply_writes("db00008", 3).unwrap();
        node.backup("db00008", key.clone(), None, true).unwrap();
        let second = node.snapshot(&key).unwrap();
        assert_eq!(second.generation, 2);
        assert!(second.reused_files);
        assert_eq!(second.seq_num, 3);
    }

    #[test]
    fn test_restore_opens_as_slave_of_upstream() {
        let node = node();
        node.add_db(&add("db00009", ReplicaRole::Master, false)).unwrap();
        node.apply_writes("db00009", 12).unwrap();
        let key = filesystem_key("/hdfs/backups/db00009/");
        node.backup("db00009", key.clone(), None, false).unwrap();

        node.restore("restored00009", &key, Upstream::new("10.0.0.9", 9090))
            .unwrap();

        let entry = node.database("restored00009").unwrap();
        assert_eq!(entry.state, DbState::Open);
        assert_eq!(entry.role, ReplicaRole::Slave);
        assert_eq!(entry.seq_num, 12);
        assert_eq!(entry.upstream, Some(Upstream::new("10.0.0.9", 9090)));
    }

    #[test]
    fn test_restore_without_backup_is_db_error() {
        let node = node();
        let result = node.restore(
            "db00010",
            &filesystem_key("/nowhere"),
            Upstream::new("10.0.0.9", 9090),
        );
        assert_eq!(code(result), AdminErrorCode::DbError);
        assert!(node.database("db00010").is_none());
    }
}
