//! Error and panic conversion at the boundary.

use crate::marshal::Boundary;
use ksqlite_core::{Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Exception class for panics escaping native code.
pub const PANIC_EXCEPTION_CLASS: &str = "java/lang/IllegalStateException";

/// Run `block`, converting an `Err` or a panic into a pending exception.
///
/// Native status errors are thrown with their result code and the native
/// message as separate constructor arguments. On failure `default` is
/// returned; the JVM ignores the return value of a native method that leaves
/// an exception pending.
pub fn run_with_jni_exception_conversion<B, R>(
    env: &mut B,
    default: R,
    block: impl FnOnce(&mut B) -> Result<R>,
) -> R
where
    B: Boundary,
{
    match panic::catch_unwind(AssertUnwindSafe(|| block(env))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            let class = err.jvm_exception_class();
            tracing::debug!(class, error = %err, sql = ?err.sql(), "native call failed");
            match &err {
                Error::Sqlite(e) => env.throw_coded(class, e.code.value(), &e.message),
                _ => env.throw(class, &err.to_string()),
            }
            default
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(message = %message, "native call panicked");
            env.throw(PANIC_EXCEPTION_CLASS, &message);
            default
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "native code panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::MemoryBoundary;
    use ksqlite_core::{Error, ResultCode, SqliteError};

    #[test]
    fn test_ok_passes_value_through() {
        let mut env = MemoryBoundary::new();
        let value = run_with_jni_exception_conversion(&mut env, 0, |_| Ok(42));
        assert_eq!(value, 42);
        assert!(!env.exception_pending());
    }

    #[test]
    fn test_error_becomes_exception() {
        let mut env = MemoryBoundary::new();
        let value = run_with_jni_exception_conversion(&mut env, -1, |_| {
            Err(SqliteError::new(ResultCode::ERROR, "no such table: t").into())
        });
        assert_eq!(value, -1);
        let thrown = env.take_exception().unwrap();
        assert_eq!(thrown.class, "com/birbit/sqlite3/SqliteException");
        assert_eq!(thrown.code, Some(1));
        assert_eq!(thrown.message, "no such table: t");
    }

    #[test]
    fn test_invalid_argument_class() {
        let mut env = MemoryBoundary::new();
        run_with_jni_exception_conversion(&mut env, (), |_| {
            Err(Error::InvalidArgument("bad".to_string()))
        });
        let thrown = env.take_exception().unwrap();
        assert_eq!(thrown.class, "java/lang/IllegalArgumentException");
        assert_eq!(thrown.code, None);
        assert_eq!(thrown.message, "Invalid argument: bad");
    }

    #[test]
    fn test_panic_becomes_exception() {
        let mut env = MemoryBoundary::new();
        let value: Option<String> =
            run_with_jni_exception_conversion(&mut env, None, |_| panic!("boom {}", 1));
        assert_eq!(value, None);
        let thrown = env.take_exception().unwrap();
        assert_eq!(thrown.class, PANIC_EXCEPTION_CLASS);
        assert_eq!(thrown.message, "boom 1");
    }
}
