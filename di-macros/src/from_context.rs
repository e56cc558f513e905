//! `#[derive(FromContext)]`: build a struct field by field from a context.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::fields::{has_flag, named_fields};

pub fn derive_from_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let context = context_type(input)?;

    let mut inits = Vec::new();
    for field in named_fields(input, "FromContext")? {
        let ident = &field.ident;
        let ty = &field.ty;
        let value = if has_flag(field, "from_context", "default")? {
            quote! { <#ty as ::std::default::Default>::default() }
        } else {
            quote! { <#ty as crate::FromRef<#context>>::from_ref(ctx) }
        };
        inits.push(quote! { #ident: #value });
    }

    Ok(quote! {
        impl #impl_generics crate::FromRef<#context> for #name #ty_generics #where_clause {
            fn from_ref(ctx: &#context) -> Self {
                Self { #(#inits),* }
            }
        }
    })
}

/// `#[from_context(Context = "TestContext")]` on the struct; `Context` otherwise.
fn context_type(input: &DeriveInput) -> syn::Result<syn::Type> {
    let mut context: Option<syn::Type> = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("from_context")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Context") {
                let value: syn::LitStr = meta.value()?.parse()?;
                context = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `Context = \"...\"`"))
            }
        })?;
    }
    Ok(context.unwrap_or_else(|| syn::parse_quote!(Context)))
}
