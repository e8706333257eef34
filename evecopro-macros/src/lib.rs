extern crate proc_macro;
extern crate proc_macro2;

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;
use syn::LitStr;

mod parsers;

/// Prepare a string literal for use as the text of an EVE coprocessor
/// widget, rewriting the Latin-1 characters that the built-in fonts keep at
/// special code points.
///
/// EVE's coprocessor treats a null character as the end of the string, so
/// literals containing one are rejected.
#[proc_macro]
pub fn eve_text(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);

    let src = &lit.value().into_bytes()[..];
    let mut encoded: Vec<u8> = Vec::with_capacity(src.len());

    let mut remain = src;
    while remain.len() > 0 {
        use parsers::Token::*;
        let (token, next) = parsers::next_token(remain);
        remain = next;
        match token {
            Literal(bytes) => {
                encoded.extend(bytes);
            }
            Remapped(code) => {
                encoded.push(code);
            }
            Null(_) => {
                let err = syn::Error::new(
                    lit.span(),
                    "EVE strings cannot contain null characters",
                );
                return err.into_compile_error().into();
            }
        };
    }

    let bytes = byte_string_expr(&encoded, lit.span());
    quote!(
        ::evecopro::strings::Message::new_remapped(#bytes)
    )
    .into()
}

fn byte_string_expr(bytes: &[u8], span: proc_macro2::Span) -> syn::Expr {
    syn::Expr::Lit(syn::ExprLit {
        attrs: Vec::new(),
        lit: syn::LitByteStr::new(bytes, span).into(),
    })
}
