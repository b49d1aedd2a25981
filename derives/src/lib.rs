//! Derive macros for rinject
//!
//! These macros are the build-time tagging step: they give every
//! registrable type a stable name derived from its module path, so the
//! injector never has to fall back to intrinsic type names.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, ItemTrait, LitStr,
    PathArguments, Type,
};

/// Implements `Registrable` with a tag of `module_path!()::Name`.
///
/// Use `#[type_tag("custom::Name")]` to pick the tag explicitly.
#[proc_macro_derive(Registrable, attributes(type_tag))]
pub fn derive_registrable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_registrable(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_registrable(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic types share one tag for every instantiation; implement Registrable by hand",
        ));
    }

    let name = &input.ident;
    let mut tag = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("type_tag")) {
        tag = Some(attr.parse_args::<LitStr>()?);
    }

    let tag = tag_tokens(name, tag);
    Ok(quote! {
        impl ::rinject::Registrable for #name {
            const TYPE_TAG: ::std::option::Option<&'static str> = ::std::option::Option::Some(#tag);
        }
    })
}

/// Implements `Registrable` for `dyn Trait`.
///
/// ```ignore
/// #[registrable]
/// trait Mailer: Send + Sync {}
///
/// #[registrable(tag = "mail::Mailer")]
/// trait Sender: Send + Sync {}
/// ```
#[proc_macro_attribute]
pub fn registrable(attr: TokenStream, annotated: TokenStream) -> TokenStream {
    let mut tag: Option<LitStr> = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("tag") {
            tag = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported registrable property"))
        }
    });
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(annotated as ItemTrait);
    if !item.generics.params.is_empty() {
        return syn::Error::new_spanned(&item.generics, "generic traits cannot be registrable")
            .into_compile_error()
            .into();
    }

    let name = &item.ident;
    let tag = tag_tokens(name, tag);
    let expanded = quote! {
        #item

        impl ::rinject::Registrable for dyn #name {
            const TYPE_TAG: ::std::option::Option<&'static str> = ::std::option::Option::Some(#tag);
        }
    };
    expanded.into()
}

fn tag_tokens(name: &Ident, tag: Option<LitStr>) -> TokenStream2 {
    match tag {
        Some(tag) => quote!(#tag),
        None => quote!(::std::concat!(::std::module_path!(), "::", ::std::stringify!(#name))),
    }
}

/// Generates `Injectable` for a struct.
///
/// Fields marked `#[inject]` must be `Arc<T>` and are resolved from the
/// injector, in declaration order; all other fields use `Default`.
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_injectable(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_injectable(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Injectable can only be derived for structs",
            ))
        }
    };

    let mut dependency_types = Vec::new();
    let mut dependency_names = Vec::new();
    let mut field_inits = Vec::new();

    match fields {
        Fields::Named(named) => {
            for field in &named.named {
                let field_name = field.ident.as_ref().expect("named field");
                if field.attrs.iter().any(|a| a.path().is_ident("inject")) {
                    let inner = arc_inner(&field.ty).ok_or_else(|| {
                        syn::Error::new_spanned(&field.ty, "#[inject] fields must be Arc<T>")
                    })?;
                    dependency_types.push(inner);
                    dependency_names.push(field_name.clone());
                    field_inits.push(quote!(#field_name));
                } else {
                    field_inits.push(quote!(#field_name: ::std::default::Default::default()));
                }
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                fields,
                "Injectable needs named fields to know what to inject",
            ))
        }
    }

    if dependency_types.len() > 8 {
        return Err(syn::Error::new_spanned(
            name,
            "at most 8 #[inject] fields are supported",
        ));
    }

    let body = match fields {
        Fields::Unit => quote!(#name),
        _ => quote!(#name { #(#field_inits,)* }),
    };

    Ok(quote! {
        impl #impl_generics ::rinject::Injectable for #name #ty_generics #where_clause {
            type Dependencies = (#(::std::sync::Arc<#dependency_types>,)*);

            fn construct(
                dependencies: Self::Dependencies,
            ) -> ::std::result::Result<Self, ::rinject::ConstructError> {
                let (#(#dependency_names,)*) = dependencies;
                ::std::result::Result::Ok(#body)
            }
        }
    })
}

/// `T` out of `Arc<T>` / `std::sync::Arc<T>`.
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
