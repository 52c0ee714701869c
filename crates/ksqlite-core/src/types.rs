//! SQLite storage classes.

use serde::{Deserialize, Serialize};

/// The fundamental datatype of a result column, as reported by `sqlite3_column_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ColumnType {
    /// Map the native type code. Unknown codes are treated as NULL.
    pub const fn from_raw(value: i32) -> Self {
        match value {
            1 => ColumnType::Integer,
            2 => ColumnType::Float,
            3 => ColumnType::Text,
            4 => ColumnType::Blob,
            _ => ColumnType::Null,
        }
    }

    /// The native type code.
    pub const fn value(self) -> i32 {
        match self {
            ColumnType::Integer => 1,
            ColumnType::Float => 2,
            ColumnType::Text => 3,
            ColumnType::Blob => 4,
            ColumnType::Null => 5,
        }
    }

    pub const fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
            ColumnType::Null => "NULL",
        }
    }
}

impl From<ColumnType> for i32 {
    fn from(ty: ColumnType) -> Self {
        ty.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for ty in [
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Text,
            ColumnType::Blob,
            ColumnType::Null,
        ] {
            assert_eq!(ColumnType::from_raw(ty.value()), ty);
        }
        assert_eq!(ColumnType::from_raw(42), ColumnType::Null);
    }
}
