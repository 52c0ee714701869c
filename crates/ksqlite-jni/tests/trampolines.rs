//! Drives the generated trampoline bodies through the in-memory boundary.

use jni::sys::{JNI_FALSE, JNI_TRUE};
use ksqlite_jni::exception::PANIC_EXCEPTION_CLASS;
use ksqlite_jni::generated::*;
use ksqlite_jni::marshal::MemoryBoundary;

fn s(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn open_memory(env: &mut MemoryBoundary) -> i64 {
    let db = native_open_connection(env, s(":memory:"));
    assert_ne!(db, 0, "open failed: {:?}", env.take_exception());
    db
}

#[test]
fn select_bound_values() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);

    let stmt = native_prepare_stmt(&mut env, db, s("SELECT ?, ?"));
    assert_ne!(stmt, 0);
    native_bind_int(&mut env, stmt, 1, 3);
    native_bind_text(&mut env, stmt, 2, s("a"));
    assert_eq!(native_step(&mut env, stmt), 100);
    assert_eq!(native_column_int(&mut env, stmt, 0), 3);
    assert_eq!(native_column_text(&mut env, stmt, 1), s("a"));
    assert_eq!(native_step(&mut env, stmt), 101);

    native_finalize(&mut env, stmt);
    native_close(&mut env, db);
    assert!(!env.exception_pending());
}

#[test]
fn missing_table_throws_and_sets_last_error() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);

    let stmt = native_prepare_stmt(&mut env, db, s("SELECT * FROM missingTable"));
    assert_eq!(stmt, 0);
    let thrown = env.take_exception().expect("exception pending");
    assert_eq!(thrown.class, "com/birbit/sqlite3/SqliteException");
    assert_eq!(thrown.code, Some(1));
    assert_eq!(thrown.message, "no such table: missingTable");

    assert_eq!(native_error_code(&mut env, db), 1);
    assert_eq!(native_error_msg(&mut env, db), s("no such table: missingTable"));
    native_close(&mut env, db);
}

#[test]
fn select_null() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);
    let stmt = native_prepare_stmt(&mut env, db, s("SELECT NULL"));
    assert_eq!(native_step(&mut env, stmt), 100);

    assert_eq!(native_column_is_null(&mut env, stmt, 0), JNI_TRUE);
    assert_eq!(native_column_int(&mut env, stmt, 0), 0);
    assert_eq!(native_column_text(&mut env, stmt, 0), None);
    assert_eq!(native_column_blob(&mut env, stmt, 0), None);
    assert_eq!(native_column_type(&mut env, stmt, 0), 5);
    assert!(!env.exception_pending());

    native_finalize(&mut env, stmt);
    native_close(&mut env, db);
}

#[test]
fn blob_and_double_round_trip() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);
    let stmt = native_prepare_stmt(&mut env, db, s("SELECT ?, ?"));
    native_bind_blob(&mut env, stmt, 1, Some(vec![1, 2, 3]));
    native_bind_double(&mut env, stmt, 2, 1.5);
    native_step(&mut env, stmt);

    assert_eq!(native_column_blob(&mut env, stmt, 0), Some(vec![1, 2, 3]));
    assert!((native_column_double(&mut env, stmt, 1) - 1.5).abs() < f64::EPSILON);
    assert_eq!(native_column_is_null(&mut env, stmt, 0), JNI_FALSE);
    assert_eq!(native_column_count(&mut env, stmt), 2);

    native_finalize(&mut env, stmt);
    native_close(&mut env, db);
    assert!(!env.exception_pending());
}

#[test]
fn exec_and_row_metadata() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);
    native_exec(
        &mut env,
        db,
        s("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT); INSERT INTO t (v) VALUES ('x');"),
    );
    assert!(!env.exception_pending());
    assert_eq!(native_changes(&mut env, db), 1);
    assert_eq!(native_last_insert_rowid(&mut env, db), 1);
    native_close(&mut env, db);
}

#[test]
fn open_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("db.sqlite");
    let mut env = MemoryBoundary::new();

    let db = native_open_connection(&mut env, path.to_str().map(String::from));
    assert_eq!(db, 0);
    let thrown = env.take_exception().expect("exception pending");
    assert_eq!(thrown.class, "com/birbit/sqlite3/SqliteException");
    assert_eq!(thrown.code, Some(14));
    assert_eq!(
        thrown.message,
        format!("could not open database at path  {}", path.display())
    );
}

#[test]
fn null_string_argument() {
    let mut env = MemoryBoundary::new();
    assert_eq!(native_open_connection(&mut env, None), 0);
    assert_eq!(
        env.take_exception().unwrap().class,
        "java/lang/IllegalArgumentException"
    );
}

#[test]
fn disposed_token_throws() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);
    let stmt = native_prepare_stmt(&mut env, db, s("SELECT 1"));
    native_finalize(&mut env, stmt);
    assert!(!env.exception_pending());

    assert_eq!(native_step(&mut env, stmt), 0);
    let thrown = env.take_exception().expect("exception pending");
    assert_eq!(thrown.class, PANIC_EXCEPTION_CLASS);
    assert!(thrown
        .message
        .contains("tried to access stable ref after it is disposed"));

    native_close(&mut env, db);
    native_close(&mut env, db);
    assert_eq!(env.take_exception().unwrap().class, PANIC_EXCEPTION_CLASS);
}

#[test]
fn statement_after_connection_close() {
    let mut env = MemoryBoundary::new();
    let db = open_memory(&mut env);
    let stmt = native_prepare_stmt(&mut env, db, s("SELECT 42"));
    native_close(&mut env, db);
    assert!(!env.exception_pending());

    assert_eq!(native_step(&mut env, stmt), 0);
    let thrown = env.take_exception().expect("exception pending");
    assert_eq!(thrown.class, "com/birbit/sqlite3/SqliteException");
    assert_eq!(thrown.code, Some(21));
    assert_eq!(thrown.message, "connection is closed");

    assert_eq!(native_column_int(&mut env, stmt, 0), 0);
    assert_eq!(env.take_exception().unwrap().code, Some(21));

    native_finalize(&mut env, stmt);
    assert!(!env.exception_pending());
}

#[test]
fn infallible_operations() {
    let mut env = MemoryBoundary::new();
    assert_eq!(native_error_string(&mut env, 1), s("SQL logic error"));
    let version = native_sqlite_version(&mut env).unwrap();
    assert!(version.starts_with('3'));
}
