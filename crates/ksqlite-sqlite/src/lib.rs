//! SQLite facade for ksqlite.
//!
// FFI bindings require unsafe code
#![allow(unsafe_code)]
//!
//! This crate wraps the SQLite C API behind two layers:
//!
//! - [`SqliteApi`], a flat set of operations over [`DbRef`] and [`StmtRef`]
//!   handles. This is what the generated JNI trampolines call.
//! - [`SqliteConnection`] / [`SqliteStmt`], owned wrappers with row iteration
//!   for Rust callers.
//!
//! # Example
//!
//! ```rust,ignore
//! use ksqlite_sqlite::SqliteApi;
//!
//! let db = SqliteApi::open_connection(":memory:")?;
//! let stmt = SqliteApi::prepare_stmt(&db, "SELECT ?, ?")?;
//! SqliteApi::bind_int(&stmt, 1, 3)?;
//! SqliteApi::bind_text(&stmt, 2, "a")?;
//! SqliteApi::step(&stmt)?;
//! assert_eq!(SqliteApi::column_int(&stmt, 0)?, 3);
//! SqliteApi::finalize(&stmt)?;
//! SqliteApi::close(&db)?;
//! ```
//!
//! # Thread Safety
//!
//! Connections are opened with `SQLITE_OPEN_FULLMUTEX`, so `DbRef` and
//! `StmtRef` are `Send + Sync` and may be used from any JVM thread.

pub mod api;
pub mod auth;
pub mod config;
pub mod connection;
pub mod ffi;
pub mod types;

pub use api::{DbRef, SqliteApi, StmtRef, StmtState};
pub use auth::{AuthCallback, AuthResult, AuthorizationParams};
pub use config::{MEMORY_PATH, OpenFlags, SqliteConfig};
pub use connection::{Row, Rows, SqliteConnection, SqliteStmt};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_version() {
        let version = sqlite_version();
        assert!(
            version.starts_with('3'),
            "Expected SQLite 3.x, got {}",
            version
        );
        assert_eq!(SqliteApi::sqlite_version(), version);
    }
}
