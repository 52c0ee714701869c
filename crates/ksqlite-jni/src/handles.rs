//! Token conversions for handle arguments and results.
//!
//! The JVM only ever sees a `jlong`. A token that was never issued, or was
//! disposed by close/finalize, is a use-after-free on the Java side and
//! panics; the trampoline turns the panic into an exception.

use jni::sys::jlong;
use ksqlite_core::handle::DISPOSED_MESSAGE;
use ksqlite_core::{Result, StableRef, Token};
use std::sync::Arc;

pub use ksqlite_sqlite::{DbRef, StmtRef};

/// Resolve a token passed in from the JVM.
///
/// # Panics
/// Panics if the token is zero, malformed or disposed.
pub fn handle_from_jni<T: StableRef>(token: jlong) -> Arc<T> {
    match Token::from_raw(token) {
        Some(token) => T::from_token(token),
        None => panic!("{} (raw token {})", DISPOSED_MESSAGE, token),
    }
}

/// The token to return to the JVM for `target`, created on first use.
pub fn handle_to_jni<T: StableRef>(target: &Arc<T>) -> Result<jlong> {
    T::to_token(target).map(Token::as_raw)
}
