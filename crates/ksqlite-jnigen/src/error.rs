//! Generation-time errors.

use std::fmt;
use std::io;

/// Errors that abort a generation run.
#[derive(Debug)]
pub enum GenError {
    /// A signature uses a type the registry has no descriptor for
    UnregisteredType { ty: String, pair: String },
    /// The generator configuration is unusable
    InvalidConfig(String),
    /// Reading the configuration or writing the output failed
    Io(io::Error),
    /// The configuration file is not valid JSON
    Json(serde_json::Error),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::UnregisteredType { ty, pair } => write!(
                f,
                "no type descriptor registered for `{}` (used by `{}`)",
                ty, pair
            ),
            GenError::InvalidConfig(msg) => write!(f, "invalid generator configuration: {}", msg),
            GenError::Io(e) => write!(f, "I/O error: {}", e),
            GenError::Json(e) => write!(f, "invalid configuration JSON: {}", e),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Io(e) => Some(e),
            GenError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GenError {
    fn from(err: io::Error) -> Self {
        GenError::Io(err)
    }
}

impl From<serde_json::Error> for GenError {
    fn from(err: serde_json::Error) -> Self {
        GenError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_type_names_pair() {
        let err = GenError::UnregisteredType {
            ty: "StmtRef".to_string(),
            pair: "step".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("StmtRef"));
        assert!(msg.contains("step"));
    }
}
