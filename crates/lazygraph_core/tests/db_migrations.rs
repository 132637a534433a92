use lazygraph_core::db::migrations::{current_version, latest_version};
use lazygraph_core::db::{open_db, open_db_in_memory, DbError};
use lazygraph_core::{CoreConfig, GraphService, NewEntity, OwnerId};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "entities");
    assert_table_exists(&conn, "capabilities");
    assert_table_exists(&conn, "links");
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO capabilities (id, entity_id, type, data, created_at)
             VALUES ('c', 'missing', 'task', '{}', 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn opening_same_database_twice_is_idempotent_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazygraph.db");
    let alice = OwnerId::new("alice").unwrap();
    let config = CoreConfig {
        db_path: Some(path.clone()),
        ..CoreConfig::default()
    };

    let created = {
        let service = GraphService::open(&config).unwrap();
        service
            .create_entity(NewEntity::new("persisted"), &alice)
            .unwrap()
    };

    let conn = open_db(&path).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
    drop(conn);

    let reopened = GraphService::open(&config).unwrap();
    assert_eq!(
        reopened.get_entity(created.id, &alice).unwrap().title,
        "persisted"
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
