//! Procedural macros for arc-rs builtin functions.
//!
//! Provides the `#[builtin]` attribute macro for defining native operators
//! with a declared Lisp name, generating the glue that binds them into an
//! `Environment`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// Extract the one-line rustdoc summary (first `///` line) from a function's attributes.
fn extract_doc_summary(attrs: &[Attribute]) -> String {
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit_str),
                    ..
                }) = &nv.value
                {
                    let line = lit_str.value();
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }
    }
    String::new()
}

/// Parse the `name = "..."` argument out of the attribute token stream.
fn parse_builtin_name(attr_stream: TokenStream) -> String {
    let attr_str = attr_stream.to_string();
    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            return rest[..end].to_string();
        }
    }
    String::new()
}

/// Attribute macro for defining native Lisp operators.
///
/// Generates a `register_<fn>(env)` function that binds the decorated
/// function into an `Environment` under the declared Lisp name, carrying
/// its doc-comment summary along as the builtin's description.
///
/// ```ignore
/// #[builtin(name = "+")]
/// /// Sum of all arguments; 0 for no arguments.
/// pub fn builtin_add(args: &[Value]) -> Result<Value, ArcError> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn builtin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    let lisp_name = parse_builtin_name(attr);
    let fn_name = func.sig.ident.clone();
    let name_to_use = if lisp_name.is_empty() {
        fn_name.to_string()
    } else {
        lisp_name
    };
    let description = extract_doc_summary(&func.attrs);
    let register_fn_name = quote::format_ident!("register_{}", fn_name);

    let expanded = quote! {
        #func

        #[allow(dead_code)]
        pub fn #register_fn_name(env: &std::rc::Rc<crate::env::Environment>) {
            env.bind_builtin(#name_to_use, #fn_name, #description);
        }
    };

    TokenStream::from(expanded)
}
