use ksqlite_core::{Error, ResultCode, SqliteError, Value};
use ksqlite_sqlite::{AuthResult, SqliteConnection};
use std::sync::{Arc, Mutex};

fn sqlite_error(err: Error) -> SqliteError {
    match err {
        Error::Sqlite(e) => e,
        other => panic!("expected a SQLite error, got {other}"),
    }
}

#[test]
fn open_in_memory() {
    let conn = SqliteConnection::open_connection(":memory:").expect("open memory db");
    conn.close().expect("close");
}

#[test]
fn open_invalid_path() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("missing").join("db.sqlite");
    let path = path.to_str().expect("utf-8 path");

    let err = sqlite_error(SqliteConnection::open_connection(path).unwrap_err());
    assert_eq!(err.code, ResultCode::CANTOPEN);
    assert_eq!(err.message, format!("could not open database at path  {path}"));
}

#[test]
fn open_on_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("testdb.db");

    let conn = SqliteConnection::open_connection(path.to_str().unwrap()).expect("open file db");
    conn.close().expect("close");
    assert!(path.exists(), "no file in {}", path.display());
}

#[test]
fn read_errors() {
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    let err = sqlite_error(conn.prepare_stmt("SELECT * FROM nonExistingTable").unwrap_err());

    assert_eq!(err.code, ResultCode::ERROR);
    assert_eq!(err.message, "no such table: nonExistingTable");
    assert_eq!(err.sql.as_deref(), Some("SELECT * FROM nonExistingTable"));
    assert_eq!(conn.last_error_code().unwrap(), ResultCode::ERROR);
    assert_eq!(
        conn.last_error_message().unwrap().as_deref(),
        Some("no such table: nonExistingTable")
    );
}

#[test]
fn one_time_query() {
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    let res = conn
        .query("SELECT ?, ?", &[Value::from(3), Value::from("a")], |mut rows| {
            let row = rows.next().expect("one row")?;
            Ok((row.read_int(0)?, row.read_string(1)?))
        })
        .unwrap();
    assert_eq!(res, (3, Some("a".to_string())));
}

#[test]
fn auth_callback() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    {
        let seen = Arc::clone(&seen);
        conn.set_authorizer(move |params| {
            let mut seen = seen.lock().unwrap();
            seen.extend(
                [&params.param1, &params.param2, &params.param3, &params.param4]
                    .into_iter()
                    .flatten()
                    .cloned(),
            );
            AuthResult::Ok
        })
        .unwrap();
    }

    let stmt = conn.prepare_stmt("SELECT * from sqlite_master").unwrap();
    stmt.finalize().unwrap();
    assert!(
        seen.lock().unwrap().iter().any(|p| p == "sqlite_master"),
        "auth callback has not been called"
    );
}

#[test]
fn auth_callback_deny() {
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    conn.set_authorizer(|_| AuthResult::Deny).unwrap();
    let err = sqlite_error(conn.prepare_stmt("SELECT * from sqlite_master").unwrap_err());
    assert_eq!(err.code, ResultCode::AUTH);

    conn.clear_authorizer().unwrap();
    conn.prepare_stmt("SELECT * from sqlite_master").unwrap();
}

#[test]
fn use_after_close() {
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    let db = Arc::clone(conn.db_ref());
    conn.close().unwrap();

    let err = sqlite_error(ksqlite_sqlite::SqliteApi::prepare_stmt(&db, "SELECT 1").unwrap_err());
    assert_eq!(err.code, ResultCode::MISUSE);
}
