//! The trampoline writer.
//!
//! For every [`FunctionPair`] two items are emitted:
//!
//! - a body generic over `B: Boundary` that converts the arguments, calls the
//!   logical operation and converts the result, all inside
//!   `run_with_jni_exception_conversion`;
//! - the exported `extern "system"` entry point, which only forwards its
//!   `JNIEnv` and raw arguments to the body.
//!
//! Output is a pure function of the pairs, the registry and the configuration.

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::registry::{ConversionContext, Direction, LogicalType, TypeRegistry};
use crate::signature::{FunctionPair, snake_case};
use proc_macro2::TokenStream;

pub const GENERATED_MARKER: &str = "// Generated by JniWriter, do not edit!";

pub struct JniWriter<'a> {
    config: &'a GeneratorConfig,
    registry: &'a TypeRegistry,
}

impl<'a> JniWriter<'a> {
    pub fn new(config: &'a GeneratorConfig, registry: &'a TypeRegistry) -> Self {
        Self { config, registry }
    }

    /// Render the complete generated source file.
    pub fn write(&self, pairs: &[FunctionPair]) -> Result<String, GenError> {
        let api = self.config.api_path()?;
        let runtime = self.config.runtime_path()?;

        let mut items = Vec::with_capacity(pairs.len() + 1);
        items.push(self.registration_table(pairs));
        for pair in pairs {
            items.push(self.trampoline(pair, &api, &runtime)?);
        }

        let mut out = String::new();
        if let Some(copyright) = &self.config.copyright {
            for line in copyright.lines() {
                if line.is_empty() {
                    out.push_str("//\n");
                } else {
                    out.push_str("// ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        out.push_str(GENERATED_MARKER);
        out.push_str("\n\n");
        for item in items {
            out.push_str(&item.to_string());
            out.push_str("\n\n");
        }

        tracing::info!(
            pairs = pairs.len(),
            class = %self.config.jni_class,
            "generated JNI trampolines"
        );
        Ok(out)
    }

    fn registration_table(&self, pairs: &[FunctionPair]) -> TokenStream {
        let class = &self.config.jni_class;
        let entries = pairs.iter().map(|pair| {
            let name = &pair.boundary.name;
            let descriptor = &pair.descriptor;
            quote::quote! { (#name, #descriptor) }
        });
        quote::quote! {
            /// Binary name of the class declaring the native methods.
            pub const JNI_CLASS: &str = #class;

            /// `(name, descriptor)` of every generated native method.
            pub const NATIVE_METHODS: &[(&str, &str)] = &[#(#entries),*];
        }
    }

    fn trampoline(
        &self,
        pair: &FunctionPair,
        api: &syn::Path,
        rt: &syn::Path,
    ) -> Result<TokenStream, GenError> {
        let env = quote::format_ident!("env");
        let cx = ConversionContext {
            env: &env,
            runtime: rt,
        };
        let unregistered = |ty: LogicalType| GenError::UnregisteredType {
            ty: ty.to_string(),
            pair: pair.logical.name.clone(),
        };

        let mut conversions = Vec::new();
        let mut args = Vec::new();
        let mut generic_params = Vec::new();
        let mut extern_params = Vec::new();
        let mut forwarded = Vec::new();

        for (i, (&logical, &boundary)) in pair
            .logical
            .params
            .iter()
            .zip(&pair.boundary.params)
            .enumerate()
        {
            let param = quote::format_ident!("p{}", i);
            let descriptor = self
                .registry
                .descriptor(logical)
                .ok_or_else(|| unregistered(logical))?;
            let conversion = self
                .registry
                .convert(logical, Direction::FromBoundary, &param, &cx)
                .ok_or_else(|| unregistered(logical))?;

            conversions.push(conversion.code);
            let bound = conversion.bound;
            args.push(if descriptor.pass_by_ref {
                quote::quote! { &#bound }
            } else {
                quote::quote! { #bound }
            });

            let generic_ty = boundary.generic_tokens();
            let extern_ty = boundary.extern_tokens();
            generic_params.push(quote::quote! { #param: #generic_ty });
            extern_params.push(quote::quote! { #param: #extern_ty });
            forwarded.push(param);
        }

        let op = quote::format_ident!("{}", pair.logical.name);
        let call = if pair.fallible {
            quote::quote! { #api::#op(#(#args),*)? }
        } else {
            quote::quote! { #api::#op(#(#args),*) }
        };

        let ret = pair.boundary.ret;
        let body = if ret.is_void() {
            quote::quote! {
                #call;
                Ok(())
            }
        } else {
            let call_result = quote::format_ident!("call_result");
            let conversion = self
                .registry
                .convert(pair.logical.ret, Direction::ToBoundary, &call_result, &cx)
                .ok_or_else(|| unregistered(pair.logical.ret))?;
            let code = conversion.code;
            let bound = conversion.bound;
            quote::quote! {
                let #call_result = #call;
                #code
                Ok(#bound)
            }
        };

        let body_fn = quote::format_ident!("{}", snake_case(&pair.boundary.name));
        let symbol = quote::format_ident!("{}", pair.symbol_name(&self.config.jni_class));
        let default = ret.default_value();
        let (generic_ret, extern_ret) = if ret.is_void() {
            (TokenStream::new(), TokenStream::new())
        } else {
            let generic_ty = ret.generic_tokens();
            let extern_ty = ret.extern_tokens();
            (
                quote::quote! { -> #generic_ty },
                quote::quote! { -> #extern_ty },
            )
        };
        let body_doc = format!(
            " `{}` {}: delegates to `{}`.",
            pair.boundary.name, pair.descriptor, pair.logical.name
        );
        let symbol_doc = format!(" `{}`", pair.descriptor);

        Ok(quote::quote! {
            #[doc = #body_doc]
            pub fn #body_fn<B: #rt::marshal::Boundary>(env: &mut B, #(#generic_params),*) #generic_ret {
                #rt::exception::run_with_jni_exception_conversion(env, #default, |#env| {
                    #(#conversions)*
                    #body
                })
            }

            #[doc = #symbol_doc]
            #[unsafe(no_mangle)]
            pub extern "system" fn #symbol<'local>(
                mut env: ::jni::JNIEnv<'local>,
                _clazz: ::jni::objects::JClass<'local>,
                #(#extern_params),*
            ) #extern_ret {
                #body_fn(&mut env, #(#forwarded),*)
            }
        })
    }
}
