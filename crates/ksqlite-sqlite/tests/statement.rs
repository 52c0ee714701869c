use ksqlite_core::{ColumnType, ResultCode, Value};
use ksqlite_sqlite::{Row, SqliteConnection, StmtState};

fn one_row_query(query: &str, block: impl FnOnce(&Row<'_>)) {
    let conn = SqliteConnection::open_connection(":memory:").unwrap();
    let stmt = conn.prepare_stmt(query).unwrap();
    {
        let mut rows = stmt.query();
        let row = rows.next().expect("one row").unwrap();
        block(&row);
    }
    stmt.finalize().unwrap();
}

#[test]
fn read_int() {
    one_row_query("SELECT 7", |row| {
        assert_eq!(row.read_int(0).unwrap(), 7);
        assert!(!row.is_null(0).unwrap());
        assert_eq!(row.column_type(0).unwrap(), ColumnType::Integer);
    });
}

#[test]
fn read_nulls() {
    one_row_query("SELECT NULL", |row| {
        assert_eq!(row.read_int(0).unwrap(), 0);
        assert_eq!(row.read_string(0).unwrap(), None);
        assert!(row.is_null(0).unwrap());
        assert_eq!(row.read_value(0).unwrap(), Value::Null);
    });
}

#[test]
fn read_text() {
    one_row_query("SELECT 'hello'", |row| {
        assert_eq!(row.read_string(0).unwrap().as_deref(), Some("hello"));
        assert!(!row.is_null(0).unwrap());
    });
}

#[test]
fn read_double_and_long() {
    one_row_query("SELECT 2.5, 5000000000", |row| {
        assert!((row.read_double(0).unwrap() - 2.5).abs() < f64::EPSILON);
        assert_eq!(row.read_long(1).unwrap(), 5_000_000_000);
        assert_eq!(row.column_type(0).unwrap(), ColumnType::Float);
    });
}

#[test]
fn statement_reuse_after_reset() {
    let conn = SqliteConnection::open_memory().unwrap();
    conn.exec("CREATE TABLE t (v INTEGER)").unwrap();

    let insert = conn.prepare_stmt("INSERT INTO t VALUES (?)").unwrap();
    for v in 1..=3 {
        insert.bind(1, &Value::from(v)).unwrap();
        assert_eq!(insert.step().unwrap(), ResultCode::DONE);
        assert_eq!(insert.stmt_ref().state(), StmtState::Done);
        insert.reset().unwrap();
    }
    insert.finalize().unwrap();

    let sum = conn
        .query("SELECT sum(v) FROM t", &[], |mut rows| {
            rows.next().expect("one row")?.read_long(0)
        })
        .unwrap();
    assert_eq!(sum, 6);
}

#[test]
fn column_metadata() {
    let conn = SqliteConnection::open_memory().unwrap();
    let stmt = conn.prepare_stmt("SELECT 1 AS one, 'x' AS two").unwrap();
    assert_eq!(stmt.column_count().unwrap(), 2);
    assert_eq!(stmt.column_name(0).unwrap().as_deref(), Some("one"));
    assert_eq!(stmt.column_name(1).unwrap().as_deref(), Some("two"));
}

#[test]
fn clear_bindings_resets_to_null() {
    let conn = SqliteConnection::open_memory().unwrap();
    let stmt = conn.prepare_stmt("SELECT ?").unwrap();
    stmt.bind(1, &Value::from("bound")).unwrap();
    stmt.clear_bindings().unwrap();
    let mut rows = stmt.query();
    let row = rows.next().unwrap().unwrap();
    assert!(row.is_null(0).unwrap());
}

#[test]
fn step_after_finalize_is_misuse() {
    let conn = SqliteConnection::open_memory().unwrap();
    let stmt = conn.prepare_stmt("SELECT 1").unwrap();
    let raw = std::sync::Arc::clone(stmt.stmt_ref());
    stmt.finalize().unwrap();

    let err = ksqlite_sqlite::SqliteApi::step(&raw).unwrap_err();
    assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
}
