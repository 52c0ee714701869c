//! Core types for ksqlite.
//!
//! This crate provides the pieces shared by the native facade, the binding
//! generator and the JNI runtime:
//!
//! - `ResultCode` and `ColumnType`, the native status and storage class vocabularies
//! - `Error` / `SqliteError` for typed failures
//! - `Value` for dynamically-typed parameter binding
//! - `HandleTable`, `NativeRef` and `StableRef` for passing logical objects
//!   across the boundary as opaque integer tokens

pub mod error;
pub mod handle;
pub mod result_code;
pub mod types;
pub mod value;

pub use error::{BoundaryError, Error, Result, SqliteError};
pub use handle::{HandleTable, NativeRef, StableRef, Token};
pub use result_code::ResultCode;
pub use types::ColumnType;
pub use value::Value;
