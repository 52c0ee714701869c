//! Safe, owned wrappers over [`SqliteApi`].
//!
//! ```rust,ignore
//! use ksqlite_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_memory()?;
//! conn.exec("CREATE TABLE t (a INTEGER)")?;
//! let total = conn.query("SELECT count(*) FROM t", &[], |rows| {
//!     rows.map(|row| row.and_then(|r| r.read_long(0))).sum::<Result<i64, _>>()
//! })?;
//! ```

use crate::api::{DbRef, SqliteApi, StmtRef};
use crate::auth::{AuthResult, AuthorizationParams};
use crate::config::SqliteConfig;
use ksqlite_core::{ColumnType, Error, Result, ResultCode, Value};
use std::sync::Arc;

/// An open connection. Closed on drop if not closed explicitly.
#[derive(Debug)]
pub struct SqliteConnection {
    db: Arc<DbRef>,
}

impl SqliteConnection {
    /// Open (creating if needed) the database file at `path`.
    pub fn open_connection(path: &str) -> Result<Self> {
        SqliteApi::open_connection(path).map(|db| Self { db })
    }

    /// Open with explicit configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        SqliteApi::open_with(config).map(|db| Self { db })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// The underlying connection handle.
    pub fn db_ref(&self) -> &Arc<DbRef> {
        &self.db
    }

    pub fn path(&self) -> &str {
        self.db.path()
    }

    pub fn prepare_stmt(&self, sql: &str) -> Result<SqliteStmt> {
        SqliteApi::prepare_stmt(&self.db, sql).map(SqliteStmt::new)
    }

    /// Execute SQL without reading results. Multiple statements are allowed.
    pub fn exec(&self, sql: &str) -> Result<()> {
        SqliteApi::exec(&self.db, sql)
    }

    /// Prepare `sql`, bind `params` (1-based, in order) and hand the rows to `block`.
    ///
    /// The statement is finalized when `block` returns.
    pub fn query<T>(
        &self,
        sql: &str,
        params: &[Value],
        block: impl FnOnce(Rows<'_>) -> Result<T>,
    ) -> Result<T> {
        let stmt = self.prepare_stmt(sql)?;
        stmt.bind_values(params)?;
        let result = block(stmt.query());
        stmt.finalize()?;
        result
    }

    pub fn changes(&self) -> Result<i32> {
        SqliteApi::changes(&self.db)
    }

    pub fn last_insert_rowid(&self) -> Result<i64> {
        SqliteApi::last_insert_rowid(&self.db)
    }

    pub fn last_error_code(&self) -> Result<ResultCode> {
        SqliteApi::error_code(&self.db)
    }

    pub fn last_error_message(&self) -> Result<Option<String>> {
        SqliteApi::error_msg(&self.db)
    }

    /// Install an authorizer consulted while statements are compiled.
    pub fn set_authorizer(
        &self,
        callback: impl Fn(&AuthorizationParams) -> AuthResult + Send + Sync + 'static,
    ) -> Result<()> {
        SqliteApi::set_authorizer(&self.db, Some(Box::new(callback)))
    }

    pub fn clear_authorizer(&self) -> Result<()> {
        SqliteApi::set_authorizer(&self.db, None)
    }

    /// Close the connection, reporting any failure.
    pub fn close(self) -> Result<()> {
        SqliteApi::close(&self.db)
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.db.is_closed() {
            if let Err(e) = SqliteApi::close(&self.db) {
                tracing::warn!(error = %e, "failed to close connection on drop");
            }
        }
    }
}

/// A prepared statement. Finalized on drop if not finalized explicitly.
#[derive(Debug)]
pub struct SqliteStmt {
    stmt: Arc<StmtRef>,
}

impl SqliteStmt {
    fn new(stmt: Arc<StmtRef>) -> Self {
        Self { stmt }
    }

    /// The underlying statement handle.
    pub fn stmt_ref(&self) -> &Arc<StmtRef> {
        &self.stmt
    }

    pub fn step(&self) -> Result<ResultCode> {
        SqliteApi::step(&self.stmt)
    }

    pub fn reset(&self) -> Result<()> {
        SqliteApi::reset(&self.stmt)
    }

    pub fn clear_bindings(&self) -> Result<()> {
        SqliteApi::clear_bindings(&self.stmt)
    }

    pub fn bind(&self, index: i32, value: &Value) -> Result<()> {
        SqliteApi::bind_value(&self.stmt, index, value)
    }

    /// Bind `values` to parameters 1..=n.
    pub fn bind_values(&self, values: &[Value]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            let index = i32::try_from(i + 1)
                .map_err(|_| Error::InvalidArgument("too many parameters".to_string()))?;
            self.bind(index, value)?;
        }
        Ok(())
    }

    pub fn column_count(&self) -> Result<i32> {
        SqliteApi::column_count(&self.stmt)
    }

    pub fn column_name(&self, index: i32) -> Result<Option<String>> {
        SqliteApi::column_name(&self.stmt, index)
    }

    /// Iterate over the remaining rows.
    pub fn query(&self) -> Rows<'_> {
        Rows {
            stmt: &self.stmt,
            done: false,
        }
    }

    pub fn finalize(self) -> Result<()> {
        SqliteApi::finalize(&self.stmt)
    }
}

impl Drop for SqliteStmt {
    fn drop(&mut self) {
        if self.stmt.state() != crate::api::StmtState::Finalized {
            if let Err(e) = SqliteApi::finalize(&self.stmt) {
                tracing::warn!(error = %e, "failed to finalize statement on drop");
            }
        }
    }
}

/// Row iterator driven by `step`. Stops after `DONE` or the first error.
pub struct Rows<'a> {
    stmt: &'a Arc<StmtRef>,
    done: bool,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<Row<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match SqliteApi::step(self.stmt) {
            Ok(code) if code.primary() == ResultCode::ROW => Some(Ok(Row { stmt: self.stmt })),
            Ok(_) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// The current row of a statement.
///
/// Valid until the iterator advances; reads after that see the next row.
pub struct Row<'a> {
    stmt: &'a StmtRef,
}

impl Row<'_> {
    /// Integer value; NULL reads as 0.
    pub fn read_int(&self, index: i32) -> Result<i32> {
        SqliteApi::column_int(self.stmt, index)
    }

    pub fn read_long(&self, index: i32) -> Result<i64> {
        SqliteApi::column_long(self.stmt, index)
    }

    pub fn read_double(&self, index: i32) -> Result<f64> {
        SqliteApi::column_double(self.stmt, index)
    }

    /// Text value; NULL reads as `None`.
    pub fn read_string(&self, index: i32) -> Result<Option<String>> {
        SqliteApi::column_text(self.stmt, index)
    }

    /// Blob value; NULL and empty blobs read as `None`.
    pub fn read_blob(&self, index: i32) -> Result<Option<Vec<u8>>> {
        SqliteApi::column_blob(self.stmt, index)
    }

    pub fn read_value(&self, index: i32) -> Result<Value> {
        SqliteApi::column_value(self.stmt, index)
    }

    pub fn is_null(&self, index: i32) -> Result<bool> {
        SqliteApi::column_is_null(self.stmt, index)
    }

    pub fn column_type(&self, index: i32) -> Result<ColumnType> {
        SqliteApi::column_type(self.stmt, index)
    }
}
