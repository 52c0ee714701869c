//! Raw encoding and decoding between Rust values and SQLite.
//!
//! SQLite has a simple type system with 5 storage classes:
//! - INTEGER: Signed integer (1, 2, 3, 4, 6, or 8 bytes)
//! - REAL: 8-byte IEEE floating point
//! - TEXT: UTF-8 or UTF-16 string
//! - BLOB: Binary data
//! - NULL: The NULL value

#![allow(clippy::cast_possible_truncation)]

use crate::ffi;
use ksqlite_core::Value;
use std::ffi::{CStr, c_int};

/// Bind a Value to a prepared statement parameter.
///
/// # Safety
/// - `stmt` must be a valid, non-null prepared statement handle
/// - `index` is 1-based; out-of-range indices yield `SQLITE_RANGE`
pub unsafe fn bind_value(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &Value) -> c_int {
    unsafe {
        match value {
            Value::Null => ffi::sqlite3_bind_null(stmt, index),
            Value::Int(v) => ffi::sqlite3_bind_int(stmt, index, *v),
            Value::Long(v) => ffi::sqlite3_bind_int64(stmt, index, *v),
            Value::Double(v) => ffi::sqlite3_bind_double(stmt, index, *v),
            Value::Text(s) => bind_text(stmt, index, s),
            Value::Blob(b) => bind_blob(stmt, index, b),
        }
    }
}

/// Bind UTF-8 text, letting SQLite take its own copy.
///
/// # Safety
/// `stmt` must be a valid, non-null prepared statement handle.
pub unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &str) -> c_int {
    let Ok(len) = c_int::try_from(value.len()) else {
        return ffi::SQLITE_RANGE;
    };
    unsafe {
        ffi::sqlite3_bind_text(
            stmt,
            index,
            value.as_ptr().cast(),
            len,
            ffi::sqlite_transient(),
        )
    }
}

/// Bind a blob, letting SQLite take its own copy.
///
/// # Safety
/// `stmt` must be a valid, non-null prepared statement handle.
pub unsafe fn bind_blob(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &[u8]) -> c_int {
    let Ok(len) = c_int::try_from(value.len()) else {
        return ffi::SQLITE_RANGE;
    };
    unsafe {
        ffi::sqlite3_bind_blob(
            stmt,
            index,
            value.as_ptr().cast(),
            len,
            ffi::sqlite_transient(),
        )
    }
}

/// Read a column as text. NULL columns read as `None`.
///
/// # Safety
/// - `stmt` must be a valid prepared statement positioned on a row
pub unsafe fn read_text(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<String> {
    unsafe {
        let ptr = ffi::sqlite3_column_text(stmt, index);
        if ptr.is_null() {
            return None;
        }
        // column_bytes must come after column_text so the length matches the UTF-8 form
        let len = ffi::sqlite3_column_bytes(stmt, index);
        let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
        Some(String::from_utf8_lossy(slice).into_owned())
    }
}

/// Read a column as a blob. Empty and NULL blobs read as `None`.
///
/// # Safety
/// - `stmt` must be a valid prepared statement positioned on a row
pub unsafe fn read_blob(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<Vec<u8>> {
    unsafe {
        let ptr = ffi::sqlite3_column_blob(stmt, index);
        let len = ffi::sqlite3_column_bytes(stmt, index);
        if ptr.is_null() || len <= 0 {
            return None;
        }
        let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
        Some(slice.to_vec())
    }
}

/// Read a column into a dynamically-typed value.
///
/// # Safety
/// - `stmt` must be a valid prepared statement positioned on a row
pub unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    unsafe {
        match ffi::sqlite3_column_type(stmt, index) {
            ffi::SQLITE_INTEGER => {
                let v = ffi::sqlite3_column_int64(stmt, index);
                i32::try_from(v).map_or(Value::Long(v), Value::Int)
            }
            ffi::SQLITE_FLOAT => Value::Double(ffi::sqlite3_column_double(stmt, index)),
            ffi::SQLITE_TEXT => read_text(stmt, index).map_or(Value::Null, Value::Text),
            ffi::SQLITE_BLOB => Value::Blob(read_blob(stmt, index).unwrap_or_default()),
            _ => Value::Null,
        }
    }
}

/// Get the column name from a result.
///
/// # Safety
/// - `stmt` must be a valid prepared statement
pub unsafe fn column_name(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<String> {
    unsafe {
        let ptr = ffi::sqlite3_column_name(stmt, index);
        if ptr.is_null() {
            None
        } else {
            CStr::from_ptr(ptr).to_str().ok().map(String::from)
        }
    }
}

/// Copy a possibly-null C string owned by SQLite.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn owned_string(ptr: *const std::ffi::c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}
