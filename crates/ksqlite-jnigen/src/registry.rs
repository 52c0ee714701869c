//! Type descriptor registry.
//!
//! Every type that can appear in a generated trampoline has one
//! [`TypeDescriptor`]: its boundary representation and, per direction, the
//! conversion emitted around the call. A missing conversion means the two
//! representations are identical and the value is passed through.

use proc_macro2::{Ident, TokenStream};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical-side types understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Int,
    Long,
    Double,
    Boolean,
    String,
    NullableString,
    ByteArray,
    NullableByteArray,
    DbRef,
    StmtRef,
    ResultCode,
    ColumnType,
    Unit,
}

impl LogicalType {
    /// The Rust spelling of the type, for diagnostics.
    pub const fn rust_name(self) -> &'static str {
        match self {
            LogicalType::Int => "i32",
            LogicalType::Long => "i64",
            LogicalType::Double => "f64",
            LogicalType::Boolean => "bool",
            LogicalType::String => "String",
            LogicalType::NullableString => "Option<String>",
            LogicalType::ByteArray => "Vec<u8>",
            LogicalType::NullableByteArray => "Option<Vec<u8>>",
            LogicalType::DbRef => "DbRef",
            LogicalType::StmtRef => "StmtRef",
            LogicalType::ResultCode => "ResultCode",
            LogicalType::ColumnType => "ColumnType",
            LogicalType::Unit => "()",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name())
    }
}

/// Boundary-side (JNI) representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryType {
    Int,
    Long,
    Double,
    Boolean,
    String,
    ByteArray,
    Void,
}

impl BoundaryType {
    /// The JNI type descriptor.
    pub const fn descriptor(self) -> &'static str {
        match self {
            BoundaryType::Int => "I",
            BoundaryType::Long => "J",
            BoundaryType::Double => "D",
            BoundaryType::Boolean => "Z",
            BoundaryType::String => "Ljava/lang/String;",
            BoundaryType::ByteArray => "[B",
            BoundaryType::Void => "V",
        }
    }

    /// The `jni.h` type name.
    pub const fn jni_name(self) -> &'static str {
        match self {
            BoundaryType::Int => "jint",
            BoundaryType::Long => "jlong",
            BoundaryType::Double => "jdouble",
            BoundaryType::Boolean => "jboolean",
            BoundaryType::String => "jstring",
            BoundaryType::ByteArray => "jbyteArray",
            BoundaryType::Void => "void",
        }
    }

    pub const fn is_void(self) -> bool {
        matches!(self, BoundaryType::Void)
    }

    /// The type as seen by a body generic over `B: Boundary`.
    pub(crate) fn generic_tokens(self) -> TokenStream {
        match self {
            BoundaryType::String => quote::quote! { B::Str },
            BoundaryType::ByteArray => quote::quote! { B::Bytes },
            BoundaryType::Void => quote::quote! { () },
            other => other.extern_tokens(),
        }
    }

    /// The type in an exported `extern "system"` signature.
    pub(crate) fn extern_tokens(self) -> TokenStream {
        match self {
            BoundaryType::Int => quote::quote! { ::jni::sys::jint },
            BoundaryType::Long => quote::quote! { ::jni::sys::jlong },
            BoundaryType::Double => quote::quote! { ::jni::sys::jdouble },
            BoundaryType::Boolean => quote::quote! { ::jni::sys::jboolean },
            BoundaryType::String => quote::quote! { ::jni::sys::jstring },
            BoundaryType::ByteArray => quote::quote! { ::jni::sys::jbyteArray },
            BoundaryType::Void => quote::quote! { () },
        }
    }

    /// The value returned to the JVM when the call throws.
    pub(crate) fn default_value(self) -> TokenStream {
        match self {
            BoundaryType::Int | BoundaryType::Long => quote::quote! { 0 },
            BoundaryType::Double => quote::quote! { 0.0 },
            BoundaryType::Boolean => quote::quote! { ::jni::sys::JNI_FALSE },
            BoundaryType::String => quote::quote! { B::null_string() },
            BoundaryType::ByteArray => quote::quote! { B::null_bytes() },
            BoundaryType::Void => quote::quote! { () },
        }
    }
}

/// Direction of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// JVM argument to logical value
    FromBoundary,
    /// Logical result to JVM return value
    ToBoundary,
}

/// Names available to conversion code.
pub struct ConversionContext<'a> {
    /// The boundary environment binding.
    pub env: &'a Ident,
    /// Path of the runtime crate providing `marshal` and `handles`.
    pub runtime: &'a syn::Path,
}

/// Emits the expression converting `source`.
pub type ConvertFn = fn(&ConversionContext<'_>, &Ident) -> TokenStream;

/// One marshal-able type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    pub logical: LogicalType,
    pub boundary: BoundaryType,
    pub from_boundary: Option<ConvertFn>,
    pub to_boundary: Option<ConvertFn>,
    /// Whether the converted argument is passed to the operation as `&local`.
    pub pass_by_ref: bool,
}

impl TypeDescriptor {
    const fn plain(logical: LogicalType, boundary: BoundaryType) -> Self {
        Self {
            logical,
            boundary,
            from_boundary: None,
            to_boundary: None,
            pass_by_ref: false,
        }
    }

    pub fn conversion(&self, direction: Direction) -> Option<ConvertFn> {
        match direction {
            Direction::FromBoundary => self.from_boundary,
            Direction::ToBoundary => self.to_boundary,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("logical", &self.logical)
            .field("boundary", &self.boundary)
            .field("from_boundary", &self.from_boundary.is_some())
            .field("to_boundary", &self.to_boundary.is_some())
            .field("pass_by_ref", &self.pass_by_ref)
            .finish()
    }
}

/// Generated conversion code and the name it binds.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// A `let` statement, empty when the value passes through.
    pub code: TokenStream,
    /// The identifier holding the converted value.
    pub bound: Ident,
}

fn bool_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::bool_from_jni(#src) }
}

fn bool_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::bool_to_jni(#src) }
}

fn string_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::string_from_jni(#env, &#src)? }
}

fn string_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::string_to_jni(#env, &#src)? }
}

fn nullable_string_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::nullable_string_from_jni(#env, &#src)? }
}

fn nullable_string_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::nullable_string_to_jni(#env, #src.as_deref())? }
}

fn bytes_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::bytes_from_jni(#env, &#src)? }
}

fn bytes_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::bytes_to_jni(#env, &#src)? }
}

fn nullable_bytes_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::nullable_bytes_from_jni(#env, &#src)? }
}

fn nullable_bytes_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let (rt, env) = (cx.runtime, cx.env);
    quote::quote! { #rt::marshal::nullable_bytes_to_jni(#env, #src.as_deref())? }
}

fn db_ref_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::handles::handle_from_jni::<#rt::handles::DbRef>(#src) }
}

fn stmt_ref_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::handles::handle_from_jni::<#rt::handles::StmtRef>(#src) }
}

fn handle_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::handles::handle_to_jni(&#src)? }
}

fn result_code_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::result_code_from_jni(#src) }
}

fn result_code_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::result_code_to_jni(#src) }
}

fn column_type_from_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::column_type_from_jni(#src) }
}

fn column_type_to_jni(cx: &ConversionContext<'_>, src: &Ident) -> TokenStream {
    let rt = cx.runtime;
    quote::quote! { #rt::marshal::column_type_to_jni(#src) }
}

const STANDARD_TYPES: [TypeDescriptor; 13] = [
    TypeDescriptor::plain(LogicalType::Int, BoundaryType::Int),
    TypeDescriptor::plain(LogicalType::Long, BoundaryType::Long),
    TypeDescriptor::plain(LogicalType::Double, BoundaryType::Double),
    TypeDescriptor {
        logical: LogicalType::Boolean,
        boundary: BoundaryType::Boolean,
        from_boundary: Some(bool_from_jni),
        to_boundary: Some(bool_to_jni),
        pass_by_ref: false,
    },
    TypeDescriptor {
        logical: LogicalType::String,
        boundary: BoundaryType::String,
        from_boundary: Some(string_from_jni),
        to_boundary: Some(string_to_jni),
        pass_by_ref: true,
    },
    TypeDescriptor {
        logical: LogicalType::NullableString,
        boundary: BoundaryType::String,
        from_boundary: Some(nullable_string_from_jni),
        to_boundary: Some(nullable_string_to_jni),
        pass_by_ref: false,
    },
    TypeDescriptor {
        logical: LogicalType::ByteArray,
        boundary: BoundaryType::ByteArray,
        from_boundary: Some(bytes_from_jni),
        to_boundary: Some(bytes_to_jni),
        pass_by_ref: true,
    },
    TypeDescriptor {
        logical: LogicalType::NullableByteArray,
        boundary: BoundaryType::ByteArray,
        from_boundary: Some(nullable_bytes_from_jni),
        to_boundary: Some(nullable_bytes_to_jni),
        pass_by_ref: false,
    },
    TypeDescriptor {
        logical: LogicalType::DbRef,
        boundary: BoundaryType::Long,
        from_boundary: Some(db_ref_from_jni),
        to_boundary: Some(handle_to_jni),
        pass_by_ref: true,
    },
    TypeDescriptor {
        logical: LogicalType::StmtRef,
        boundary: BoundaryType::Long,
        from_boundary: Some(stmt_ref_from_jni),
        to_boundary: Some(handle_to_jni),
        pass_by_ref: true,
    },
    TypeDescriptor {
        logical: LogicalType::ResultCode,
        boundary: BoundaryType::Int,
        from_boundary: Some(result_code_from_jni),
        to_boundary: Some(result_code_to_jni),
        pass_by_ref: false,
    },
    TypeDescriptor {
        logical: LogicalType::ColumnType,
        boundary: BoundaryType::Int,
        from_boundary: Some(column_type_from_jni),
        to_boundary: Some(column_type_to_jni),
        pass_by_ref: false,
    },
    TypeDescriptor::plain(LogicalType::Unit, BoundaryType::Void),
];

/// The set of types a generation run may use.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    descriptors: Vec<TypeDescriptor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeRegistry {
    /// Every type the SQLite facade needs.
    pub fn standard() -> Self {
        Self {
            descriptors: STANDARD_TYPES.to_vec(),
        }
    }

    /// A registry with the given type removed.
    pub fn without(mut self, logical: LogicalType) -> Self {
        self.descriptors.retain(|d| d.logical != logical);
        self
    }

    pub fn descriptor(&self, logical: LogicalType) -> Option<&TypeDescriptor> {
        self.descriptors.iter().find(|d| d.logical == logical)
    }

    pub fn is_registered(&self, logical: LogicalType) -> bool {
        self.descriptor(logical).is_some()
    }

    pub fn has_conversion(&self, logical: LogicalType, direction: Direction) -> bool {
        self.descriptor(logical)
            .is_some_and(|d| d.conversion(direction).is_some())
    }

    /// Emit the conversion of `source` in `direction`.
    ///
    /// Returns `None` only for unregistered types. A pass-through type yields
    /// empty code bound to `source` itself.
    pub fn convert(
        &self,
        logical: LogicalType,
        direction: Direction,
        source: &Ident,
        cx: &ConversionContext<'_>,
    ) -> Option<Conversion> {
        let descriptor = self.descriptor(logical)?;
        let conversion = match descriptor.conversion(direction) {
            Some(convert) => {
                let bound = quote::format_ident!("local_{}", source);
                let expr = convert(cx, source);
                Conversion {
                    code: quote::quote! { let #bound = #expr; },
                    bound,
                }
            }
            None => Conversion {
                code: TokenStream::new(),
                bound: source.clone(),
            },
        };
        Some(conversion)
    }
}
