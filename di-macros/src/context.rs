//! `#[derive(Context)]`: one `FromRef` impl per field type.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::fields::named_fields;

pub fn derive_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut impls = Vec::new();
    for field in named_fields(input, "Context")? {
        let ident = &field.ident;
        let ty = &field.ty;
        impls.push(quote! {
            impl #impl_generics crate::FromRef<#name #ty_generics> for #ty #where_clause {
                fn from_ref(ctx: &#name #ty_generics) -> Self {
                    ::std::clone::Clone::clone(&ctx.#ident)
                }
            }
        });
    }

    Ok(quote! { #(#impls)* })
}
