//! The native library facade.
//!
//! [`SqliteApi`] owns every call into the SQLite C API and is the delegation
//! target of the generated JNI trampolines. Native handles are wrapped in
//! [`DbRef`] and [`StmtRef`], which implement [`StableRef`] so they can be
//! handed to the JVM as opaque tokens.
//!
//! Connections are opened in serialized mode; SQLite's connection mutex is the
//! only lock held around native calls. Lifecycle state lives in atomics.

#![allow(clippy::cast_possible_truncation)]

use crate::auth::{self, AuthCallback, AuthHolder};
use crate::config::SqliteConfig;
use crate::{ffi, types};
use ksqlite_core::{
    ColumnType, Error, HandleTable, NativeRef, Result, ResultCode, SqliteError, StableRef, Value,
};
use std::ffi::{CString, c_char, c_int};
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static DB_REFS: HandleTable<DbRef> = HandleTable::new();
static STMT_REFS: HandleTable<StmtRef> = HandleTable::new();

/// An open database connection.
///
/// `Open -> Closed` is the only transition; every operation after close
/// fails with `MISUSE`.
pub struct DbRef {
    raw: *mut ffi::sqlite3,
    path: String,
    closed: AtomicBool,
    native_ref: NativeRef,
    authorizer: Mutex<Option<AuthHolder>>,
}

// SAFETY: connections are opened with SQLITE_OPEN_FULLMUTEX, so SQLite
// serializes every call on the handle internally.
unsafe impl Send for DbRef {}
unsafe impl Sync for DbRef {}

impl DbRef {
    fn new(raw: *mut ffi::sqlite3, path: String) -> Self {
        Self {
            raw,
            path,
            closed: AtomicBool::new(false),
            native_ref: NativeRef::new(),
            authorizer: Mutex::new(None),
        }
    }

    /// The path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn handle(&self) -> Result<*mut ffi::sqlite3> {
        if self.is_closed() {
            tracing::warn!(path = %self.path, "connection used after close");
            return Err(SqliteError::misuse("connection is closed").into());
        }
        Ok(self.raw)
    }

    /// Build an error for `code` carrying the connection's last error message.
    fn last_error(&self, code: ResultCode) -> SqliteError {
        let message = if self.is_closed() {
            None
        } else {
            // SAFETY: raw is valid until closed
            unsafe { types::owned_string(ffi::sqlite3_errmsg(self.raw)) }
        };
        let message = message
            .or_else(|| ffi::error_string(code.value()).map(String::from))
            .unwrap_or_else(|| code.to_string());
        SqliteError::new(code, message)
    }

    /// Unregister the authorizer and close the native handle.
    ///
    /// # Safety
    /// Must run at most once per connection.
    unsafe fn close_native(&self) -> c_int {
        // SAFETY: raw is still open; the authorizer is removed before its
        // user data is released below.
        let rc = unsafe {
            ffi::sqlite3_set_authorizer(self.raw, None, ptr::null_mut());
            ffi::sqlite3_close_v2(self.raw)
        };
        let holder = self
            .authorizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(holder);
        rc
    }
}

impl StableRef for DbRef {
    fn handle_table() -> &'static HandleTable<Self> {
        &DB_REFS
    }

    fn native_ref(&self) -> &NativeRef {
        &self.native_ref
    }
}

impl Drop for DbRef {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(path = %self.path, "closing connection dropped without close");
            // SAFETY: closed flag just flipped, so this is the only close
            unsafe { self.close_native() };
        }
    }
}

impl fmt::Debug for DbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbRef")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of a prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StmtState {
    Prepared = 0,
    Row = 1,
    Done = 2,
    Error = 3,
    Finalized = 4,
}

impl StmtState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StmtState::Prepared,
            1 => StmtState::Row,
            2 => StmtState::Done,
            3 => StmtState::Error,
            _ => StmtState::Finalized,
        }
    }
}

/// A prepared statement. Keeps its connection alive.
pub struct StmtRef {
    db: Arc<DbRef>,
    raw: *mut ffi::sqlite3_stmt,
    sql: String,
    state: AtomicU8,
    native_ref: NativeRef,
}

// SAFETY: the statement belongs to a serialized-mode connection.
unsafe impl Send for StmtRef {}
unsafe impl Sync for StmtRef {}

impl StmtRef {
    fn new(db: Arc<DbRef>, raw: *mut ffi::sqlite3_stmt, sql: &str) -> Self {
        Self {
            db,
            raw,
            sql: sql.to_string(),
            state: AtomicU8::new(StmtState::Prepared as u8),
            native_ref: NativeRef::new(),
        }
    }

    /// The connection this statement was prepared on.
    pub fn db_ref(&self) -> &Arc<DbRef> {
        &self.db
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn state(&self) -> StmtState {
        StmtState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: StmtState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// The native statement, unless it is finalized or its connection is
    /// closed. Only `finalize` bypasses this.
    fn handle(&self) -> Result<*mut ffi::sqlite3_stmt> {
        if self.state() == StmtState::Finalized {
            tracing::warn!(sql = %self.sql, "statement used after finalize");
            return Err(SqliteError::misuse("statement is finalized").into());
        }
        if self.db.is_closed() {
            tracing::warn!(sql = %self.sql, path = %self.db.path, "statement used after connection close");
            return Err(SqliteError::misuse("connection is closed").into());
        }
        Ok(self.raw)
    }

    fn check(&self, rc: c_int) -> Result<()> {
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(self
                .db
                .last_error(ResultCode::new(rc))
                .with_sql(&self.sql)
                .into())
        }
    }
}

impl StableRef for StmtRef {
    fn handle_table() -> &'static HandleTable<Self> {
        &STMT_REFS
    }

    fn native_ref(&self) -> &NativeRef {
        &self.native_ref
    }
}

impl Drop for StmtRef {
    fn drop(&mut self) {
        if self.state() != StmtState::Finalized {
            tracing::debug!(sql = %self.sql, "finalizing statement dropped without finalize");
            // SAFETY: not finalized yet and no other reference exists
            unsafe { ffi::sqlite3_finalize(self.raw) };
        }
    }
}

impl fmt::Debug for StmtRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StmtRef")
            .field("sql", &self.sql)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn to_c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value).map_err(|_| Error::InvalidArgument(format!("{} contains a NUL byte", what)))
}

/// The logical operations over the SQLite C API.
pub struct SqliteApi;

impl SqliteApi {
    /// Open (creating if needed) the database at `path`.
    pub fn open_connection(path: &str) -> Result<Arc<DbRef>> {
        Self::open_with(&SqliteConfig::file(path))
    }

    /// Open a connection with explicit configuration.
    ///
    /// A failed open still closes the half-open native handle before the
    /// error is returned.
    pub fn open_with(config: &SqliteConfig) -> Result<Arc<DbRef>> {
        let c_path = to_c_string(&config.path, "database path")?;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &raw mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let detail = if db.is_null() {
                None
            } else {
                // SAFETY: SQLite returns a connection object even on failure
                unsafe {
                    let msg = types::owned_string(ffi::sqlite3_errmsg(db));
                    ffi::sqlite3_close(db);
                    msg
                }
            };
            tracing::warn!(path = %config.path, code = rc, detail = ?detail, "failed to open database");
            return Err(SqliteError::new(
                ResultCode::new(rc),
                format!("could not open database at path  {}", config.path),
            )
            .into());
        }

        if config.busy_timeout_ms > 0 {
            let ms = c_int::try_from(config.busy_timeout_ms).unwrap_or(c_int::MAX);
            // SAFETY: db is valid
            unsafe { ffi::sqlite3_busy_timeout(db, ms) };
        }

        tracing::debug!(path = %config.path, "opened database");
        Ok(Arc::new(DbRef::new(db, config.path.clone())))
    }

    /// Close the connection and release its token.
    ///
    /// Statements still alive keep the native connection around until they
    /// are finalized (`sqlite3_close_v2` semantics).
    pub fn close(db: &DbRef) -> Result<()> {
        if db.closed.swap(true, Ordering::AcqRel) {
            return Err(SqliteError::misuse("connection is already closed").into());
        }
        // SAFETY: closed flag just flipped, so this is the only close
        let rc = unsafe { db.close_native() };
        db.dispose_token();
        tracing::debug!(path = %db.path, "closed database");
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            let message = ffi::error_string(rc).unwrap_or("close failed");
            Err(SqliteError::new(ResultCode::new(rc), message).into())
        }
    }

    pub fn prepare_stmt(db: &Arc<DbRef>, sql: &str) -> Result<Arc<StmtRef>> {
        let raw_db = db.handle()?;
        let c_sql = to_c_string(sql, "SQL")?;
        let len = c_int::try_from(c_sql.as_bytes().len())
            .map_err(|_| Error::InvalidArgument("SQL is too long".to_string()))?;
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                raw_db,
                c_sql.as_ptr(),
                len,
                &raw mut stmt,
                ptr::null_mut(),
            )
        };

        if rc != ffi::SQLITE_OK {
            let err = db.last_error(ResultCode::new(rc)).with_sql(sql);
            tracing::debug!(sql, code = rc, message = %err.message, "prepare failed");
            return Err(err.into());
        }
        if stmt.is_null() {
            return Err(Error::InvalidArgument(format!(
                "SQL contains no statement: {:?}",
                sql
            )));
        }

        tracing::trace!(sql, "prepared statement");
        Ok(Arc::new(StmtRef::new(Arc::clone(db), stmt, sql)))
    }

    /// Advance the statement. Returns `ROW` or `DONE`; any other status is an error.
    pub fn step(stmt: &StmtRef) -> Result<ResultCode> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        let rc = ResultCode::new(unsafe { ffi::sqlite3_step(raw) });
        match rc.primary() {
            ResultCode::ROW => {
                stmt.set_state(StmtState::Row);
                Ok(rc)
            }
            ResultCode::DONE => {
                stmt.set_state(StmtState::Done);
                Ok(rc)
            }
            _ => {
                stmt.set_state(StmtState::Error);
                Err(stmt.db.last_error(rc).with_sql(&stmt.sql).into())
            }
        }
    }

    /// Rewind the statement to `Prepared`. Bindings are kept.
    ///
    /// The error of a failed step is not reported a second time.
    pub fn reset(stmt: &StmtRef) -> Result<()> {
        let raw = stmt.handle()?;
        let previous = stmt.state();
        // SAFETY: raw is a live statement
        let rc = unsafe { ffi::sqlite3_reset(raw) };
        stmt.set_state(StmtState::Prepared);
        if previous == StmtState::Error {
            return Ok(());
        }
        stmt.check(rc)
    }

    /// Destroy the statement and release its token. Terminal.
    ///
    /// Allowed after the connection is closed, which lets SQLite release the
    /// deferred connection. The statement is destroyed even when an error is
    /// returned; as with [`reset`](Self::reset), the error of a failed step is
    /// not reported again.
    pub fn finalize(stmt: &StmtRef) -> Result<()> {
        let previous = StmtState::from_u8(
            stmt.state
                .swap(StmtState::Finalized as u8, Ordering::AcqRel),
        );
        if previous == StmtState::Finalized {
            return Err(SqliteError::misuse("statement is already finalized").into());
        }
        // SAFETY: state just moved to Finalized, so this is the only finalize.
        // The statement is destroyed whatever the return code says.
        let rc = unsafe { ffi::sqlite3_finalize(stmt.raw) };
        stmt.dispose_token();
        tracing::trace!(sql = %stmt.sql, code = rc, "finalized statement");
        if previous == StmtState::Error {
            return Ok(());
        }
        stmt.check(rc)
    }

    pub fn clear_bindings(stmt: &StmtRef) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { ffi::sqlite3_clear_bindings(raw) })
    }

    pub fn bind_parameter_count(stmt: &StmtRef) -> Result<i32> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { ffi::sqlite3_bind_parameter_count(raw) })
    }

    pub fn bind_int(stmt: &StmtRef, index: i32, value: i32) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { ffi::sqlite3_bind_int(raw, index, value) })
    }

    pub fn bind_long(stmt: &StmtRef, index: i32, value: i64) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { ffi::sqlite3_bind_int64(raw, index, value) })
    }

    pub fn bind_double(stmt: &StmtRef, index: i32, value: f64) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { ffi::sqlite3_bind_double(raw, index, value) })
    }

    pub fn bind_text(stmt: &StmtRef, index: i32, value: &str) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement; SQLite copies the text
        stmt.check(unsafe { types::bind_text(raw, index, value) })
    }

    pub fn bind_blob(stmt: &StmtRef, index: i32, value: &[u8]) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement; SQLite copies the bytes
        stmt.check(unsafe { types::bind_blob(raw, index, value) })
    }

    pub fn bind_null(stmt: &StmtRef, index: i32) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { ffi::sqlite3_bind_null(raw, index) })
    }

    pub fn bind_value(stmt: &StmtRef, index: i32, value: &Value) -> Result<()> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        stmt.check(unsafe { types::bind_value(raw, index, value) })
    }

    pub fn column_count(stmt: &StmtRef) -> Result<i32> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { ffi::sqlite3_column_count(raw) })
    }

    pub fn column_name(stmt: &StmtRef, index: i32) -> Result<Option<String>> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { types::column_name(raw, index) })
    }

    pub fn column_type(stmt: &StmtRef, index: i32) -> Result<ColumnType> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(ColumnType::from_raw(unsafe {
            ffi::sqlite3_column_type(raw, index)
        }))
    }

    pub fn column_is_null(stmt: &StmtRef, index: i32) -> Result<bool> {
        Ok(Self::column_type(stmt, index)? == ColumnType::Null)
    }

    pub fn column_int(stmt: &StmtRef, index: i32) -> Result<i32> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { ffi::sqlite3_column_int(raw, index) })
    }

    pub fn column_long(stmt: &StmtRef, index: i32) -> Result<i64> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { ffi::sqlite3_column_int64(raw, index) })
    }

    pub fn column_double(stmt: &StmtRef, index: i32) -> Result<f64> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { ffi::sqlite3_column_double(raw, index) })
    }

    /// Text of the column; `None` for NULL.
    pub fn column_text(stmt: &StmtRef, index: i32) -> Result<Option<String>> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { types::read_text(raw, index) })
    }

    /// Bytes of the column; `None` for NULL and for empty blobs.
    pub fn column_blob(stmt: &StmtRef, index: i32) -> Result<Option<Vec<u8>>> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { types::read_blob(raw, index) })
    }

    pub fn column_value(stmt: &StmtRef, index: i32) -> Result<Value> {
        let raw = stmt.handle()?;
        // SAFETY: raw is a live statement
        Ok(unsafe { types::read_column(raw, index) })
    }

    /// The connection's most recent error message.
    pub fn error_msg(db: &DbRef) -> Result<Option<String>> {
        let raw = db.handle()?;
        // SAFETY: raw is open
        Ok(unsafe { types::owned_string(ffi::sqlite3_errmsg(raw)) })
    }

    /// The connection's most recent result code.
    pub fn error_code(db: &DbRef) -> Result<ResultCode> {
        let raw = db.handle()?;
        // SAFETY: raw is open
        Ok(ResultCode::new(unsafe { ffi::sqlite3_errcode(raw) }))
    }

    /// The English description of a result code.
    pub fn error_string(code: ResultCode) -> Option<String> {
        ffi::error_string(code.value()).map(String::from)
    }

    /// Run one or more SQL statements without returning rows.
    pub fn exec(db: &DbRef, sql: &str) -> Result<()> {
        let raw = db.handle()?;
        let c_sql = to_c_string(sql, "SQL")?;
        let mut errmsg: *mut c_char = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(raw, c_sql.as_ptr(), None, ptr::null_mut(), &raw mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let message = if errmsg.is_null() {
                db.last_error(ResultCode::new(rc)).message
            } else {
                // SAFETY: errmsg was allocated by SQLite
                unsafe {
                    let msg = types::owned_string(errmsg).unwrap_or_default();
                    ffi::sqlite3_free(errmsg.cast());
                    msg
                }
            };
            return Err(SqliteError::new(ResultCode::new(rc), message)
                .with_sql(sql)
                .into());
        }
        Ok(())
    }

    /// Rows changed by the most recent INSERT/UPDATE/DELETE.
    pub fn changes(db: &DbRef) -> Result<i32> {
        let raw = db.handle()?;
        // SAFETY: raw is open
        Ok(unsafe { ffi::sqlite3_changes(raw) })
    }

    pub fn last_insert_rowid(db: &DbRef) -> Result<i64> {
        let raw = db.handle()?;
        // SAFETY: raw is open
        Ok(unsafe { ffi::sqlite3_last_insert_rowid(raw) })
    }

    /// Install (or with `None`, remove) the connection's authorizer.
    pub fn set_authorizer(db: &DbRef, callback: Option<Box<AuthCallback>>) -> Result<()> {
        let raw = db.handle()?;
        let mut slot = db
            .authorizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let holder = callback.map(auth::into_holder);
        // SAFETY: raw is open; the holder outlives its registration because it
        // is stored on the connection and only dropped after being replaced
        // or unregistered.
        let rc = unsafe {
            match &holder {
                Some(holder) => ffi::sqlite3_set_authorizer(
                    raw,
                    Some(auth::authorizer_trampoline),
                    auth::holder_ptr(holder),
                ),
                None => ffi::sqlite3_set_authorizer(raw, None, ptr::null_mut()),
            }
        };
        if rc != ffi::SQLITE_OK {
            return Err(db.last_error(ResultCode::new(rc)).into());
        }
        let previous = std::mem::replace(&mut *slot, holder);
        drop(slot);
        drop(previous);
        Ok(())
    }

    /// The SQLite library version string.
    pub fn sqlite_version() -> String {
        ffi::version().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Arc<DbRef> {
        SqliteApi::open_connection(":memory:").unwrap()
    }

    #[test]
    fn test_open_and_close() {
        let db = memory();
        assert!(!db.is_closed());
        SqliteApi::close(&db).unwrap();
        assert!(db.is_closed());
    }

    #[test]
    fn test_close_twice_is_misuse() {
        let db = memory();
        SqliteApi::close(&db).unwrap();
        let err = SqliteApi::close(&db).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
    }

    #[test]
    fn test_operations_after_close_fail() {
        let db = memory();
        SqliteApi::close(&db).unwrap();
        let err = SqliteApi::prepare_stmt(&db, "SELECT 1").unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
        assert!(SqliteApi::error_msg(&db).is_err());
    }

    #[test]
    fn test_statement_fails_after_connection_close() {
        let db = memory();
        let stmt = SqliteApi::prepare_stmt(&db, "SELECT 42").unwrap();
        SqliteApi::close(&db).unwrap();

        let err = SqliteApi::step(&stmt).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
        let err = SqliteApi::column_int(&stmt, 0).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
        let err = SqliteApi::reset(&stmt).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));

        SqliteApi::finalize(&stmt).unwrap();
        assert_eq!(stmt.state(), StmtState::Finalized);
    }

    #[test]
    fn test_finalize_after_failed_step() {
        let db = memory();
        SqliteApi::exec(&db, "CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        SqliteApi::exec(&db, "INSERT INTO t VALUES (1)").unwrap();
        let stmt = SqliteApi::prepare_stmt(&db, "INSERT INTO t VALUES (1)").unwrap();
        assert!(SqliteApi::step(&stmt).is_err());
        SqliteApi::finalize(&stmt).unwrap();
        SqliteApi::close(&db).unwrap();
    }

    #[test]
    fn test_bind_and_read() {
        let db = memory();
        let stmt = SqliteApi::prepare_stmt(&db, "SELECT ?, ?").unwrap();
        SqliteApi::bind_int(&stmt, 1, 3).unwrap();
        SqliteApi::bind_text(&stmt, 2, "a").unwrap();
        assert_eq!(SqliteApi::step(&stmt).unwrap(), ResultCode::ROW);
        assert_eq!(stmt.state(), StmtState::Row);
        assert_eq!(SqliteApi::column_int(&stmt, 0).unwrap(), 3);
        assert_eq!(SqliteApi::column_text(&stmt, 1).unwrap().as_deref(), Some("a"));
        assert_eq!(SqliteApi::step(&stmt).unwrap(), ResultCode::DONE);
        assert_eq!(stmt.state(), StmtState::Done);
        SqliteApi::finalize(&stmt).unwrap();
        SqliteApi::close(&db).unwrap();
    }

    #[test]
    fn test_state_machine() {
        let db = memory();
        let stmt = SqliteApi::prepare_stmt(&db, "SELECT 1").unwrap();
        assert_eq!(stmt.state(), StmtState::Prepared);
        SqliteApi::step(&stmt).unwrap();
        SqliteApi::step(&stmt).unwrap();
        SqliteApi::reset(&stmt).unwrap();
        assert_eq!(stmt.state(), StmtState::Prepared);
        assert_eq!(SqliteApi::step(&stmt).unwrap(), ResultCode::ROW);
        SqliteApi::finalize(&stmt).unwrap();
        assert_eq!(stmt.state(), StmtState::Finalized);

        let err = SqliteApi::step(&stmt).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
        let err = SqliteApi::finalize(&stmt).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::MISUSE));
    }

    #[test]
    fn test_step_error_then_reset() {
        let db = memory();
        SqliteApi::exec(&db, "CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        SqliteApi::exec(&db, "INSERT INTO t VALUES (1)").unwrap();
        let stmt = SqliteApi::prepare_stmt(&db, "INSERT INTO t VALUES (1)").unwrap();
        let err = SqliteApi::step(&stmt).unwrap_err();
        assert_eq!(err.result_code().map(ResultCode::primary), Some(ResultCode::CONSTRAINT));
        assert_eq!(stmt.state(), StmtState::Error);
        SqliteApi::reset(&stmt).unwrap();
        assert_eq!(stmt.state(), StmtState::Prepared);
    }

    #[test]
    fn test_bind_out_of_range() {
        let db = memory();
        let stmt = SqliteApi::prepare_stmt(&db, "SELECT ?").unwrap();
        let err = SqliteApi::bind_int(&stmt, 5, 1).unwrap_err();
        assert_eq!(err.result_code(), Some(ResultCode::RANGE));
        assert_eq!(SqliteApi::bind_parameter_count(&stmt).unwrap(), 1);
    }

    #[test]
    fn test_empty_sql_is_invalid_argument() {
        let db = memory();
        let err = SqliteApi::prepare_stmt(&db, "   ").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_nul_in_path_is_invalid_argument() {
        let err = SqliteApi::open_connection("bad\0path").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_error_string() {
        assert_eq!(
            SqliteApi::error_string(ResultCode::ERROR).as_deref(),
            Some("SQL logic error")
        );
    }

    #[test]
    fn test_tokens_are_released_on_close_and_finalize() {
        let db = memory();
        let db_token = DbRef::to_token(&db).unwrap();
        let stmt = SqliteApi::prepare_stmt(&db, "SELECT 1").unwrap();
        let stmt_token = StmtRef::to_token(&stmt).unwrap();
        assert!(Arc::ptr_eq(&StmtRef::from_token(stmt_token), &stmt));

        SqliteApi::finalize(&stmt).unwrap();
        assert!(StmtRef::handle_table().is_disposed(stmt_token));
        SqliteApi::close(&db).unwrap();
        assert!(DbRef::handle_table().is_disposed(db_token));
    }

    #[test]
    fn test_exec_error_message() {
        let db = memory();
        let err = SqliteApi::exec(&db, "SELECT * FROM nowhere").unwrap_err();
        match err {
            Error::Sqlite(e) => {
                assert_eq!(e.code, ResultCode::ERROR);
                assert_eq!(e.message, "no such table: nowhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
