//! Native status codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A status code returned by the native library.
///
/// Wraps the raw integer so extended codes survive the round trip; use
/// [`ResultCode::primary`] to compare against the primary vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(i32);

impl ResultCode {
    pub const OK: ResultCode = ResultCode(0);
    pub const ERROR: ResultCode = ResultCode(1);
    pub const INTERNAL: ResultCode = ResultCode(2);
    pub const PERM: ResultCode = ResultCode(3);
    pub const ABORT: ResultCode = ResultCode(4);
    pub const BUSY: ResultCode = ResultCode(5);
    pub const LOCKED: ResultCode = ResultCode(6);
    pub const NOMEM: ResultCode = ResultCode(7);
    pub const READONLY: ResultCode = ResultCode(8);
    pub const INTERRUPT: ResultCode = ResultCode(9);
    pub const IOERR: ResultCode = ResultCode(10);
    pub const CORRUPT: ResultCode = ResultCode(11);
    pub const NOTFOUND: ResultCode = ResultCode(12);
    pub const FULL: ResultCode = ResultCode(13);
    pub const CANTOPEN: ResultCode = ResultCode(14);
    pub const PROTOCOL: ResultCode = ResultCode(15);
    pub const EMPTY: ResultCode = ResultCode(16);
    pub const SCHEMA: ResultCode = ResultCode(17);
    pub const TOOBIG: ResultCode = ResultCode(18);
    pub const CONSTRAINT: ResultCode = ResultCode(19);
    pub const MISMATCH: ResultCode = ResultCode(20);
    pub const MISUSE: ResultCode = ResultCode(21);
    pub const NOLFS: ResultCode = ResultCode(22);
    pub const AUTH: ResultCode = ResultCode(23);
    pub const FORMAT: ResultCode = ResultCode(24);
    pub const RANGE: ResultCode = ResultCode(25);
    pub const NOTADB: ResultCode = ResultCode(26);
    pub const NOTICE: ResultCode = ResultCode(27);
    pub const WARNING: ResultCode = ResultCode(28);
    pub const ROW: ResultCode = ResultCode(100);
    pub const DONE: ResultCode = ResultCode(101);

    /// Wrap a raw status code.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// The raw status code, extended bits included.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// The primary code (low byte) of an extended result code.
    pub const fn primary(self) -> ResultCode {
        ResultCode(self.0 & 0xff)
    }

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Symbolic name of the primary code, if it is one of the known codes.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.primary().0 {
            0 => "OK",
            1 => "ERROR",
            2 => "INTERNAL",
            3 => "PERM",
            4 => "ABORT",
            5 => "BUSY",
            6 => "LOCKED",
            7 => "NOMEM",
            8 => "READONLY",
            9 => "INTERRUPT",
            10 => "IOERR",
            11 => "CORRUPT",
            12 => "NOTFOUND",
            13 => "FULL",
            14 => "CANTOPEN",
            15 => "PROTOCOL",
            16 => "EMPTY",
            17 => "SCHEMA",
            18 => "TOOBIG",
            19 => "CONSTRAINT",
            20 => "MISMATCH",
            21 => "MISUSE",
            22 => "NOLFS",
            23 => "AUTH",
            24 => "FORMAT",
            25 => "RANGE",
            26 => "NOTADB",
            27 => "NOTICE",
            28 => "WARNING",
            100 => "ROW",
            101 => "DONE",
            _ => return None,
        })
    }
}

impl From<i32> for ResultCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) if self.primary().0 == self.0 => write!(f, "{}", name),
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "UNKNOWN ({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_of_extended_code() {
        // SQLITE_CANTOPEN_ISDIR
        let code = ResultCode::new(14 | (2 << 8));
        assert_eq!(code.primary(), ResultCode::CANTOPEN);
        assert!(!code.is_ok());
        assert_eq!(code.to_string(), "CANTOPEN (526)");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ResultCode::OK.to_string(), "OK");
        assert_eq!(ResultCode::DONE.to_string(), "DONE");
        assert_eq!(ResultCode::new(77).to_string(), "UNKNOWN (77)");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&ResultCode::ROW).unwrap();
        assert_eq!(json, "100");
        let back: ResultCode = serde_json::from_str("19").unwrap();
        assert_eq!(back, ResultCode::CONSTRAINT);
    }
}
