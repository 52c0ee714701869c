//! Authorizer callbacks.
//!
//! SQLite consults the authorizer while compiling each statement. The
//! callback is boxed, owned by the connection's [`DbRef`](crate::DbRef), and
//! handed to SQLite as an opaque user-data pointer.

use crate::ffi;
use crate::types::owned_string;
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};

/// The decision returned by an authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthResult {
    /// Allow the action
    Ok,
    /// Abort compilation of the statement with an error
    Deny,
    /// Allow the statement but treat the column as NULL / skip the action
    Ignore,
}

impl AuthResult {
    pub const fn value(self) -> c_int {
        match self {
            AuthResult::Ok => ffi::SQLITE_OK,
            AuthResult::Deny => ffi::SQLITE_DENY,
            AuthResult::Ignore => ffi::SQLITE_IGNORE,
        }
    }
}

/// The arguments SQLite passes to the authorizer.
///
/// The meaning of the four parameters depends on `action_code`
/// (e.g. for `SQLITE_READ` they are table, column, database, trigger/view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationParams {
    pub action_code: i32,
    pub param1: Option<String>,
    pub param2: Option<String>,
    pub param3: Option<String>,
    pub param4: Option<String>,
}

/// A user-supplied authorizer.
pub type AuthCallback = dyn Fn(&AuthorizationParams) -> AuthResult + Send + Sync;

/// The thin-pointer box handed to SQLite as user data.
pub(crate) type AuthHolder = Box<Box<AuthCallback>>;

pub(crate) fn into_holder(callback: Box<AuthCallback>) -> AuthHolder {
    Box::new(callback)
}

pub(crate) fn holder_ptr(holder: &AuthHolder) -> *mut c_void {
    std::ptr::from_ref::<Box<AuthCallback>>(holder).cast_mut().cast()
}

/// The `extern "C"` entry point registered with `sqlite3_set_authorizer`.
///
/// A panicking callback denies the action instead of unwinding into SQLite.
pub(crate) unsafe extern "C" fn authorizer_trampoline(
    user_data: *mut c_void,
    action_code: c_int,
    param1: *const c_char,
    param2: *const c_char,
    param3: *const c_char,
    param4: *const c_char,
) -> c_int {
    // SAFETY: user_data is the pointer produced by holder_ptr, kept alive by
    // the owning DbRef until the authorizer is unregistered.
    let callback = unsafe { &*user_data.cast::<Box<AuthCallback>>() };
    let params = unsafe {
        AuthorizationParams {
            action_code,
            param1: owned_string(param1),
            param2: owned_string(param2),
            param3: owned_string(param3),
            param4: owned_string(param4),
        }
    };
    match panic::catch_unwind(AssertUnwindSafe(|| callback(&params))) {
        Ok(result) => result.value(),
        Err(_) => {
            tracing::warn!(action_code, "authorizer panicked, denying");
            ffi::SQLITE_DENY
        }
    }
}
