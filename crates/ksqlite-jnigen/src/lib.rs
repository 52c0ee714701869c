//! JNI binding generator for ksqlite.
//!
//! `ksqlite-jnigen` is the **build-time codegen layer**. It turns a declarative
//! list of logical operations into the JNI entry points exported by the
//! `ksqlite-jni` library.
//!
//! # Role In The Architecture
//!
//! - **Type registry** ([`TypeRegistry`]): every marshal-able type and the
//!   conversion code emitted for it in each direction.
//! - **Function pairs** ([`FunctionPair`]): a logical signature linked to its
//!   native method name and JNI descriptor.
//! - **Writer** ([`JniWriter`]): renders one trampoline per pair plus the
//!   `NATIVE_METHODS` registration table.
//!
//! The `ksqlite-jni` build script calls [`write_bindings`] and `include!`s the
//! result.

pub mod catalog;
pub mod config;
pub mod error;
pub mod registry;
pub mod signature;
pub mod writer;

pub use catalog::{ApiOperation, SQLITE_API, function_pairs};
pub use config::GeneratorConfig;
pub use error::GenError;
pub use registry::{
    BoundaryType, Conversion, ConversionContext, Direction, LogicalType, TypeDescriptor,
    TypeRegistry,
};
pub use signature::{FunctionPair, FunctionSignature, jni_symbol_name, mangle, method_descriptor};
pub use writer::JniWriter;

use std::path::Path;

/// Render the `SqliteApi` bindings for `config`.
pub fn generate(config: &GeneratorConfig) -> Result<String, GenError> {
    config.validate()?;
    let registry = TypeRegistry::standard();
    let pairs = function_pairs(SQLITE_API, config, &registry)?;
    JniWriter::new(config, &registry).write(&pairs)
}

/// Generate the bindings into `path`.
///
/// The file is left untouched when its content would not change. Returns
/// whether it was written.
pub fn write_bindings(path: &Path, config: &GeneratorConfig) -> Result<bool, GenError> {
    let source = generate(config)?;
    if std::fs::read_to_string(path).is_ok_and(|existing| existing == source) {
        tracing::debug!(path = %path.display(), "JNI bindings up to date");
        return Ok(false);
    }
    std::fs::write(path, source)?;
    tracing::debug!(path = %path.display(), "wrote JNI bindings");
    Ok(true)
}
