//! Proc-macro crate for `json_codec`.

extern crate proc_macro;
mod attrs;
#[cfg(test)]
mod tests;

use proc_macro::TokenStream;

use convert_case::{Case, Casing};
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::{
    Data, DataStruct, DeriveInput, Error, Fields, Ident, Path, Type, parse_macro_input,
    spanned::Spanned,
};

use crate::attrs::{
    ContainerAttrs, FieldAttrs, FieldDefault, parse_container_attrs, parse_field_attrs,
};

/// Derive macro that generates `json_codec::Record` and `json_codec::JsonCodec`.
///
/// The record name defaults to the struct name, and every named field becomes
/// a record field in declaration order. Field types are resolved by the last
/// segment of their path; anything outside the converter table is declared
/// `Opaque` and makes registration fail.
#[proc_macro_derive(JsonCodec, attributes(json_codec))]
pub fn derive_json_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_json_codec(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// A named field with its wire name and resolved attributes.
struct CodecField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    wire: String,
    opaque: Option<String>,
    attrs: FieldAttrs,
}

fn expand_json_codec(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "JsonCodec cannot be derived for generic types",
        ));
    }

    let container = parse_container_attrs(&input.attrs)?;
    let jc = &container.crate_path;

    let ds = match &input.data {
        Data::Struct(ds) => ds,
        Data::Enum(de) => {
            return Err(Error::new(
                de.enum_token.span(),
                "JsonCodec does not support enums",
            ));
        }
        Data::Union(u) => {
            return Err(Error::new(
                u.union_token.span(),
                "JsonCodec does not support unions",
            ));
        }
    };
    let fields = collect_fields(ds, container.rename_all)?;

    let record_impl = build_record_impl(ident, &fields, jc);
    let codec_impl = build_codec_impl(ident, &fields, &container);

    Ok(quote! {
        #record_impl
        #codec_impl
    })
}

fn collect_fields<'a>(
    ds: &'a DataStruct,
    rename_all: Option<Case<'static>>,
) -> syn::Result<Vec<CodecField<'a>>> {
    let named = match &ds.fields {
        Fields::Named(fields) => &fields.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(fields) => {
            return Err(Error::new(
                fields.span(),
                "JsonCodec requires named fields",
            ));
        }
    };

    let mut out = Vec::with_capacity(named.len());
    for f in named {
        let f_ident = f
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(f.span(), "missing field ident"))?;
        let attrs = parse_field_attrs(&f.attrs)?;

        let original = f_ident.to_string();
        let wire = match (&attrs.rename, rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => original.to_case(rule),
            (None, None) => original,
        };

        out.push(CodecField {
            ident: f_ident,
            ty: &f.ty,
            wire,
            opaque: opaque_type_name(&f.ty),
            attrs,
        });
    }
    Ok(out)
}

fn build_record_impl(ident: &Ident, fields: &[CodecField<'_>], jc: &Path) -> TokenStream2 {
    let arms = fields.iter().filter(|f| f.opaque.is_none()).map(|f| {
        let wire = &f.wire;
        let f_ident = f.ident;
        quote! {
            #wire => ::std::option::Option::Some(#jc::value::FieldType::to_value(&self.#f_ident)),
        }
    });

    quote! {
        impl #jc::Record for #ident {
            fn field(&self, name: &str) -> ::std::option::Option<#jc::value::FieldValue> {
                match name {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    }
}

fn build_codec_impl(ident: &Ident, fields: &[CodecField<'_>], container: &ContainerAttrs) -> TokenStream2 {
    let jc = &container.crate_path;
    let name = container
        .name
        .clone()
        .unwrap_or_else(|| ident.to_string());

    let field_defs = fields.iter().map(|f| field_def(f, jc));

    let extends = container.extends.as_ref().map(|base| {
        quote! {
            .extends(#jc::descriptor::BaseRef::of::<#base>(
                <#base as #jc::JsonCodec>::definition().name,
            ))
        }
    });

    let configuration = container.discriminator.as_ref().map(|field| {
        quote! {
            fn configuration() -> #jc::Configuration {
                #jc::Configuration::default().with_discriminator(#field)
            }
        }
    });

    let register_dependencies = container.extends.as_ref().map(|base| {
        quote! {
            fn register_dependencies(
                registry: &mut #jc::registry::RegistryContext<'_>,
            ) -> ::std::result::Result<(), #jc::error::GenerationError> {
                registry.register::<#base>()
            }
        }
    });

    let construct_body = construct_body(fields);
    let args = if fields.is_empty() {
        quote! { _args }
    } else if fields.iter().any(|f| f.opaque.is_some()) {
        quote! { args }
    } else {
        quote! { mut args }
    };

    quote! {
        impl #jc::JsonCodec for #ident {
            fn definition() -> #jc::descriptor::RecordDef {
                #jc::descriptor::RecordDef::new(#name)
                    #(.field(#field_defs))*
                    #extends
            }

            #configuration

            fn construct(
                #args: #jc::traits::Arguments,
            ) -> ::std::result::Result<Self, #jc::error::DecodeError> {
                #construct_body
            }

            #register_dependencies
        }
    }
}

fn field_def(f: &CodecField<'_>, jc: &Path) -> TokenStream2 {
    let wire = &f.wire;
    let ty = f.ty;
    let tag = match &f.opaque {
        Some(declared) => quote! { #jc::descriptor::TypeTag::Opaque(#declared) },
        None => quote! { <#ty as #jc::value::FieldType>::TAG },
    };

    let mut def = quote! { #jc::descriptor::FieldDef::new(#wire, #tag) };
    if f.attrs.default.is_some() {
        def = quote! { #def.with_default() };
    }

    let attrs = &f.attrs;
    let format = match (&attrs.format, &attrs.encode_format, &attrs.decode_format) {
        (Some(pattern), _, _) => Some(quote! { #jc::descriptor::DateTimeFormat::symmetric(#pattern) }),
        (None, None, None) => None,
        (None, encode, decode) => {
            let encode = pattern_or_iso(encode.as_deref(), jc);
            let decode = pattern_or_iso(decode.as_deref(), jc);
            Some(quote! { #jc::descriptor::DateTimeFormat::new(#encode, #decode) })
        }
    };
    if let Some(format) = format {
        def = quote! { #def.with_format(#format) };
    }
    def
}

fn pattern_or_iso(pattern: Option<&str>, jc: &Path) -> TokenStream2 {
    match pattern {
        Some(pattern) => quote! { #pattern },
        None => quote! { #jc::convert::ISO_DATETIME },
    }
}

fn construct_body(fields: &[CodecField<'_>]) -> TokenStream2 {
    // a record with an undecodable field cannot be rebuilt; registration
    // rejects it before this is ever reached
    if let Some(f) = fields.iter().find(|f| f.opaque.is_some()) {
        let wire = &f.wire;
        return quote! {
            ::std::result::Result::Err(args.unsupported(#wire))
        };
    }

    let inits = fields.iter().map(|f| {
        let f_ident = f.ident;
        let wire = &f.wire;
        let ty = f.ty;
        let value = match &f.attrs.default {
            None => quote! { args.required::<#ty>(#wire)? },
            Some(FieldDefault::Trait) => quote! {
                args.optional::<#ty>(#wire)?.unwrap_or_default()
            },
            Some(FieldDefault::Path(path)) => quote! {
                args.optional::<#ty>(#wire)?.unwrap_or_else(#path)
            },
        };
        quote! { #f_ident: #value, }
    });

    quote! {
        ::std::result::Result::Ok(Self { #(#inits)* })
    }
}

/// The declared type name when `ty` has no converter, `None` otherwise.
fn opaque_type_name(ty: &Type) -> Option<String> {
    if let Type::Path(p) = ty {
        if p.qself.is_none() {
            let last = p
                .path
                .segments
                .last()
                .map(|s| s.ident.to_string())
                .unwrap_or_default();
            if is_supported_ident(&last) {
                return None;
            }
        }
    }
    Some(ty.to_token_stream().to_string().replace(' ', ""))
}

fn is_supported_ident(ident: &str) -> bool {
    matches!(
        ident,
        "i8" | "i16"
            | "i32"
            | "i64"
            | "u8"
            | "u16"
            | "u32"
            | "bool"
            | "String"
            | "f32"
            | "f64"
            | "Uuid"
            | "NaiveDateTime"
            | "DateTime"
            | "NaiveDate"
    )
}
