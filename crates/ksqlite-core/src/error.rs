//! Error types for ksqlite operations.

use crate::result_code::ResultCode;
use std::fmt;

/// The primary error type for all ksqlite operations.
#[derive(Debug)]
pub enum Error {
    /// The native library returned a non-OK status
    Sqlite(SqliteError),
    /// A value could not be marshaled across the boundary
    Boundary(BoundaryError),
    /// The handle table has no free slot left
    HandleExhausted { capacity: usize },
    /// An argument cannot be handed to the native library (e.g. interior NUL)
    InvalidArgument(String),
}

/// A native status error together with the connection's last error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteError {
    pub code: ResultCode,
    pub message: String,
    pub sql: Option<String>,
}

#[derive(Debug)]
pub struct BoundaryError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Result type alias for ksqlite operations.
pub type Result<T> = std::result::Result<T, Error>;

impl SqliteError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            sql: None,
        }
    }

    /// Attach the SQL text that produced this error.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Error raised when a handle is used after close/finalize.
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::new(ResultCode::MISUSE, message)
    }
}

impl BoundaryError {
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Error {
    /// The native status code, if this error came from the native library.
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            Error::Sqlite(e) => Some(e.code),
            _ => None,
        }
    }

    /// The SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Sqlite(e) => e.sql.as_deref(),
            _ => None,
        }
    }

    /// Fully qualified JVM exception class used when this error crosses the boundary.
    pub fn jvm_exception_class(&self) -> &'static str {
        match self {
            Error::Sqlite(_) => "com/birbit/sqlite3/SqliteException",
            Error::InvalidArgument(_) => "java/lang/IllegalArgumentException",
            Error::HandleExhausted { .. } => "java/lang/OutOfMemoryError",
            Error::Boundary(_) => "java/lang/RuntimeException",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Sqlite(e) => write!(f, "{}", e),
            Error::Boundary(e) => write!(f, "Boundary error: {}", e.message),
            Error::HandleExhausted { capacity } => {
                write!(f, "Handle table exhausted ({} slots)", capacity)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sqlite(e) => Some(e),
            Error::Boundary(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for SqliteError {}

impl fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<SqliteError> for Error {
    fn from(err: SqliteError) -> Self {
        Error::Sqlite(err)
    }
}

impl From<BoundaryError> for Error {
    fn from(err: BoundaryError) -> Self {
        Error::Boundary(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_error_display() {
        let err = Error::from(SqliteError::new(
            ResultCode::ERROR,
            "no such table: missingTable",
        ));
        assert_eq!(err.to_string(), "no such table: missingTable (code ERROR)");
        assert_eq!(err.result_code(), Some(ResultCode::ERROR));
        assert_eq!(
            err.jvm_exception_class(),
            "com/birbit/sqlite3/SqliteException"
        );
    }

    #[test]
    fn test_sql_is_attached() {
        let err = Error::from(SqliteError::new(ResultCode::ERROR, "boom").with_sql("SELECT 1"));
        assert_eq!(err.sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_boundary_error_source() {
        let io = std::io::Error::other("jvm detached");
        let err = Error::from(BoundaryError::with_source("could not read string", io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "jvm detached");
        assert_eq!(err.result_code(), None);
    }
}
