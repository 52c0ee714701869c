//! Value marshaling across the JNI boundary.
//!
//! Generated trampolines are generic over [`Boundary`]. The real
//! implementation is `JNIEnv`; [`MemoryBoundary`] stands in for the JVM when
//! exercising trampolines from Rust.

use jni::JNIEnv;
use jni::objects::{JByteArray, JObject, JString, JThrowable, JValue};
use jni::sys::{JNI_FALSE, JNI_TRUE, jboolean, jbyteArray, jint, jstring};
use ksqlite_core::{BoundaryError, ColumnType, Error, Result, ResultCode};
use std::ptr;

/// Thrown when the class chosen for an error cannot be thrown itself.
pub const FALLBACK_EXCEPTION_CLASS: &str = "java/lang/RuntimeException";

/// The environment a trampoline runs in.
pub trait Boundary {
    /// Reference to a string owned by the other side.
    type Str;
    /// Reference to a byte array owned by the other side.
    type Bytes;

    fn null_string() -> Self::Str;
    fn null_bytes() -> Self::Bytes;

    /// Copy a string out; `None` for a null reference.
    fn read_string(&mut self, value: &Self::Str) -> Result<Option<String>>;
    fn alloc_string(&mut self, value: &str) -> Result<Self::Str>;

    /// Copy a byte array out; `None` for a null reference.
    fn read_bytes(&mut self, value: &Self::Bytes) -> Result<Option<Vec<u8>>>;
    fn alloc_bytes(&mut self, value: &[u8]) -> Result<Self::Bytes>;

    /// Leave an exception pending. An exception already pending is kept.
    fn throw(&mut self, class: &str, message: &str);

    /// Like [`throw`](Self::throw), for exception classes constructed from
    /// `(int code, String message)`.
    fn throw_coded(&mut self, class: &str, code: jint, message: &str);
}

/// Constructor descriptor of exceptions thrown through [`Boundary::throw_coded`].
pub const CODED_EXCEPTION_CTOR: &str = "(ILjava/lang/String;)V";

fn jni_error(call: &str, err: jni::errors::Error) -> Error {
    Error::Boundary(BoundaryError::with_source(format!("{} failed", call), err))
}

fn new_coded_exception<'local>(
    env: &mut JNIEnv<'local>,
    class: &str,
    code: jint,
    message: &str,
) -> jni::errors::Result<JThrowable<'local>> {
    let message = JObject::from(env.new_string(message)?);
    let exception = env.new_object(
        class,
        CODED_EXCEPTION_CTOR,
        &[JValue::Int(code), JValue::Object(&message)],
    )?;
    Ok(JThrowable::from(exception))
}

impl<'local> Boundary for JNIEnv<'local> {
    type Str = jstring;
    type Bytes = jbyteArray;

    fn null_string() -> jstring {
        ptr::null_mut()
    }

    fn null_bytes() -> jbyteArray {
        ptr::null_mut()
    }

    fn read_string(&mut self, value: &jstring) -> Result<Option<String>> {
        if value.is_null() {
            return Ok(None);
        }
        // SAFETY: a non-null local reference passed to a native method by the JVM
        let string = unsafe { JString::from_raw(*value) };
        let chars = self
            .get_string(&string)
            .map_err(|e| jni_error("GetStringUTFChars", e))?;
        Ok(Some(chars.into()))
    }

    fn alloc_string(&mut self, value: &str) -> Result<jstring> {
        self.new_string(value)
            .map(|s| s.into_raw())
            .map_err(|e| jni_error("NewStringUTF", e))
    }

    fn read_bytes(&mut self, value: &jbyteArray) -> Result<Option<Vec<u8>>> {
        if value.is_null() {
            return Ok(None);
        }
        // SAFETY: a non-null local reference passed to a native method by the JVM
        let array = unsafe { JByteArray::from_raw(*value) };
        self.convert_byte_array(array)
            .map(Some)
            .map_err(|e| jni_error("GetByteArrayRegion", e))
    }

    fn alloc_bytes(&mut self, value: &[u8]) -> Result<jbyteArray> {
        self.byte_array_from_slice(value)
            .map(|a| a.into_raw())
            .map_err(|e| jni_error("NewByteArray", e))
    }

    fn throw(&mut self, class: &str, message: &str) {
        if self.exception_check().unwrap_or(false) {
            tracing::debug!(class, message, "exception already pending, keeping it");
            return;
        }
        if let Err(e) = self.throw_new(class, message) {
            tracing::warn!(class, error = %e, "could not throw, falling back");
            let _ = self.exception_clear();
            if let Err(e) = self.throw_new(FALLBACK_EXCEPTION_CLASS, message) {
                tracing::error!(error = %e, message, "could not throw fallback exception");
            }
        }
    }

    fn throw_coded(&mut self, class: &str, code: jint, message: &str) {
        if self.exception_check().unwrap_or(false) {
            tracing::debug!(class, code, message, "exception already pending, keeping it");
            return;
        }
        let thrown = new_coded_exception(self, class, code, message)
            .and_then(|exception| JNIEnv::throw(self, exception));
        if let Err(e) = thrown {
            tracing::warn!(class, code, error = %e, "could not throw coded exception, falling back");
            let _ = self.exception_clear();
            Boundary::throw(self, class, message);
        }
    }
}

/// An exception left pending on a [`MemoryBoundary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrownException {
    pub class: String,
    /// Set for exceptions thrown through [`Boundary::throw_coded`].
    pub code: Option<jint>,
    pub message: String,
}

/// A boundary backed by plain Rust values, for running trampolines without a JVM.
#[derive(Debug, Default)]
pub struct MemoryBoundary {
    pending: Option<ThrownException>,
}

impl MemoryBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exception_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Clear and return the pending exception.
    pub fn take_exception(&mut self) -> Option<ThrownException> {
        self.pending.take()
    }
}

impl Boundary for MemoryBoundary {
    type Str = Option<String>;
    type Bytes = Option<Vec<u8>>;

    fn null_string() -> Self::Str {
        None
    }

    fn null_bytes() -> Self::Bytes {
        None
    }

    fn read_string(&mut self, value: &Self::Str) -> Result<Option<String>> {
        Ok(value.clone())
    }

    fn alloc_string(&mut self, value: &str) -> Result<Self::Str> {
        Ok(Some(value.to_string()))
    }

    fn read_bytes(&mut self, value: &Self::Bytes) -> Result<Option<Vec<u8>>> {
        Ok(value.clone())
    }

    fn alloc_bytes(&mut self, value: &[u8]) -> Result<Self::Bytes> {
        Ok(Some(value.to_vec()))
    }

    fn throw(&mut self, class: &str, message: &str) {
        if self.pending.is_none() {
            self.pending = Some(ThrownException {
                class: class.to_string(),
                code: None,
                message: message.to_string(),
            });
        }
    }

    fn throw_coded(&mut self, class: &str, code: jint, message: &str) {
        if self.pending.is_none() {
            self.pending = Some(ThrownException {
                class: class.to_string(),
                code: Some(code),
                message: message.to_string(),
            });
        }
    }
}

/// A required string argument. Null is rejected.
pub fn string_from_jni<B: Boundary>(env: &mut B, value: &B::Str) -> Result<String> {
    env.read_string(value)?
        .ok_or_else(|| Error::InvalidArgument("string argument is null".to_string()))
}

pub fn nullable_string_from_jni<B: Boundary>(env: &mut B, value: &B::Str) -> Result<Option<String>> {
    env.read_string(value)
}

pub fn string_to_jni<B: Boundary>(env: &mut B, value: &str) -> Result<B::Str> {
    env.alloc_string(value)
}

pub fn nullable_string_to_jni<B: Boundary>(env: &mut B, value: Option<&str>) -> Result<B::Str> {
    match value {
        Some(value) => env.alloc_string(value),
        None => Ok(B::null_string()),
    }
}

/// A required byte array argument. Null is rejected.
pub fn bytes_from_jni<B: Boundary>(env: &mut B, value: &B::Bytes) -> Result<Vec<u8>> {
    env.read_bytes(value)?
        .ok_or_else(|| Error::InvalidArgument("byte array argument is null".to_string()))
}

pub fn nullable_bytes_from_jni<B: Boundary>(
    env: &mut B,
    value: &B::Bytes,
) -> Result<Option<Vec<u8>>> {
    env.read_bytes(value)
}

pub fn bytes_to_jni<B: Boundary>(env: &mut B, value: &[u8]) -> Result<B::Bytes> {
    env.alloc_bytes(value)
}

pub fn nullable_bytes_to_jni<B: Boundary>(env: &mut B, value: Option<&[u8]>) -> Result<B::Bytes> {
    match value {
        Some(value) => env.alloc_bytes(value),
        None => Ok(B::null_bytes()),
    }
}

pub fn bool_from_jni(value: jboolean) -> bool {
    value != JNI_FALSE
}

pub fn bool_to_jni(value: bool) -> jboolean {
    if value { JNI_TRUE } else { JNI_FALSE }
}

pub fn result_code_from_jni(value: jint) -> ResultCode {
    ResultCode::new(value)
}

pub fn result_code_to_jni(value: ResultCode) -> jint {
    value.value()
}

pub fn column_type_from_jni(value: jint) -> ColumnType {
    ColumnType::from_raw(value)
}

pub fn column_type_to_jni(value: ColumnType) -> jint {
    value.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        let mut env = MemoryBoundary::new();
        let s = string_to_jni(&mut env, "héllo").unwrap();
        assert_eq!(string_from_jni(&mut env, &s).unwrap(), "héllo");
    }

    #[test]
    fn test_null_string() {
        let mut env = MemoryBoundary::new();
        let null = nullable_string_to_jni(&mut env, None).unwrap();
        assert_eq!(null, None);
        assert_eq!(nullable_string_from_jni(&mut env, &null).unwrap(), None);
        let err = string_from_jni(&mut env, &null).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut env = MemoryBoundary::new();
        let b = bytes_to_jni(&mut env, &[0, 1, 255]).unwrap();
        assert_eq!(bytes_from_jni(&mut env, &b).unwrap(), vec![0, 1, 255]);
        let null = nullable_bytes_to_jni(&mut env, None).unwrap();
        assert_eq!(nullable_bytes_from_jni(&mut env, &null).unwrap(), None);
        assert!(bytes_from_jni(&mut env, &null).is_err());
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(bool_to_jni(true), JNI_TRUE);
        assert!(!bool_from_jni(bool_to_jni(false)));
        assert_eq!(result_code_to_jni(ResultCode::ROW), 100);
        assert_eq!(result_code_from_jni(101), ResultCode::DONE);
        assert_eq!(column_type_to_jni(ColumnType::Null), 5);
        assert_eq!(column_type_from_jni(3), ColumnType::Text);
    }

    #[test]
    fn test_first_exception_wins() {
        let mut env = MemoryBoundary::new();
        env.throw("a/First", "one");
        env.throw_coded("a/Second", 1, "two");
        assert_eq!(
            env.take_exception(),
            Some(ThrownException {
                class: "a/First".to_string(),
                code: None,
                message: "one".to_string(),
            })
        );
        assert!(!env.exception_pending());
    }
}
