//! Function signatures and their JNI-facing derivations.

use crate::error::GenError;
use crate::registry::{BoundaryType, LogicalType, TypeRegistry};
use std::fmt::Write as _;

/// A function on one side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature<T> {
    pub name: String,
    pub params: Vec<T>,
    pub ret: T,
}

pub type LogicalSignature = FunctionSignature<LogicalType>;
pub type BoundarySignature = FunctionSignature<BoundaryType>;

impl<T> FunctionSignature<T> {
    pub fn new(name: impl Into<String>, params: Vec<T>, ret: T) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }
}

/// A logical operation linked to the native method that exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPair {
    pub logical: LogicalSignature,
    pub boundary: BoundarySignature,
    /// JNI method descriptor, e.g. `(JI)I`.
    pub descriptor: String,
    /// Whether the operation returns `Result` and is called with `?`.
    pub fallible: bool,
}

impl FunctionPair {
    /// Derive the boundary side of `logical` through `registry`.
    pub fn derive(
        logical: LogicalSignature,
        boundary_name: impl Into<String>,
        fallible: bool,
        registry: &TypeRegistry,
    ) -> Result<Self, GenError> {
        let map = |ty: LogicalType| {
            registry
                .descriptor(ty)
                .map(|d| d.boundary)
                .ok_or_else(|| GenError::UnregisteredType {
                    ty: ty.to_string(),
                    pair: logical.name.clone(),
                })
        };

        let params = logical
            .params
            .iter()
            .map(|&ty| map(ty))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = map(logical.ret)?;
        let descriptor = method_descriptor(&params, ret);
        let boundary = FunctionSignature::new(boundary_name, params, ret);

        Ok(Self {
            logical,
            boundary,
            descriptor,
            fallible,
        })
    }

    /// The exported symbol for this pair's native method on `class`.
    pub fn symbol_name(&self, class: &str) -> String {
        jni_symbol_name(class, &self.boundary.name)
    }
}

/// Build a JNI method descriptor: `(params)ret`.
pub fn method_descriptor(params: &[BoundaryType], ret: BoundaryType) -> String {
    let mut out = String::from("(");
    for param in params {
        out.push_str(param.descriptor());
    }
    out.push(')');
    out.push_str(ret.descriptor());
    out
}

/// Mangle a class or method name for a JNI symbol.
pub fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' | '.' => out.push('_'),
            '_' => out.push_str("_1"),
            ';' => out.push_str("_2"),
            '[' => out.push_str("_3"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "_0{:04x}", unit);
                }
            }
        }
    }
    out
}

/// `Java_<mangled class>_<mangled method>`.
pub fn jni_symbol_name(class: &str, method: &str) -> String {
    format!("Java_{}_{}", mangle(class), mangle(method))
}

/// `open_connection` with prefix `native` becomes `nativeOpenConnection`.
pub fn boundary_method_name(prefix: &str, logical_name: &str) -> String {
    let mut out = String::from(prefix);
    let mut upper = !prefix.is_empty();
    for c in logical_name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `nativeOpenConnection` becomes `native_open_connection`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
