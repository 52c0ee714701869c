//! JNI library for ksqlite.
//!
//! Builds as a `cdylib` loaded by the JVM. The entry points are generated at
//! build time by `ksqlite-jnigen` from the `SqliteApi` catalog; this crate
//! provides the runtime they call into:
//!
//! - [`marshal`]: the [`Boundary`](marshal::Boundary) abstraction and the
//!   string, byte array and scalar conversions
//! - [`handles`]: `DbRef`/`StmtRef` <-> `jlong` tokens
//! - [`exception`]: `Err`/panic to pending Java exception
//!
//! Each native method `nativeFoo` also has a generic body `native_foo` that can
//! be driven through [`marshal::MemoryBoundary`] without a JVM.

// Exported entry points and raw JNI references require unsafe code
#![allow(unsafe_code)]

pub mod exception;
pub mod handles;
pub mod marshal;

/// Generated trampolines.
#[allow(
    non_snake_case,
    unused_variables,
    clippy::all,
    clippy::pedantic,
    missing_docs
)]
pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/generated_jni.rs"));
}

pub use generated::{JNI_CLASS, NATIVE_METHODS};
