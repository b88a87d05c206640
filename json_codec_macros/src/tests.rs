use quote::quote;
use syn::{Data, DeriveInput};

use crate::{
    attrs::parse_container_attrs, collect_fields, construct_body, expand_json_codec, field_def,
};

fn check_expand(input: &str, expected: proc_macro2::TokenStream) {
    let input: DeriveInput = syn::parse_str(input).expect("parse input");
    let got = expand_json_codec(&input).expect("expand_json_codec");
    assert_eq!(got.to_string(), expected.to_string());
}

fn check_expand_error(input: &str, message: &str) {
    let input: DeriveInput = syn::parse_str(input).expect("parse input");
    let err = match expand_json_codec(&input) {
        Ok(ts) => panic!("expected an error, got {ts}"),
        Err(err) => err,
    };
    assert_eq!(err.to_string(), message);
}

fn check_field_defs(input: &str, expected: &[proc_macro2::TokenStream]) {
    let input: DeriveInput = syn::parse_str(input).expect("parse input");
    let container = parse_container_attrs(&input.attrs).expect("parse container attrs");
    let Data::Struct(ds) = &input.data else {
        panic!("expected struct");
    };
    let fields = collect_fields(ds, container.rename_all).expect("collect_fields");
    let got = fields
        .iter()
        .map(|f| field_def(f, &container.crate_path).to_string())
        .collect::<Vec<_>>();
    let expected = expected.iter().map(|ts| ts.to_string()).collect::<Vec<_>>();
    assert_eq!(got, expected);
}

fn check_construct_body(input: &str, expected: proc_macro2::TokenStream) {
    let input: DeriveInput = syn::parse_str(input).expect("parse input");
    let container = parse_container_attrs(&input.attrs).expect("parse container attrs");
    let Data::Struct(ds) = &input.data else {
        panic!("expected struct");
    };
    let fields = collect_fields(ds, container.rename_all).expect("collect_fields");
    assert_eq!(construct_body(&fields).to_string(), expected.to_string());
}

#[test]
fn test_plain_struct() {
    let input = r#"
        struct Point {
            x: i32,
            label: String,
        }
    "#;
    let expected = quote! {
        impl ::json_codec::Record for Point {
            fn field(&self, name: &str) -> ::std::option::Option<::json_codec::value::FieldValue> {
                match name {
                    "x" => ::std::option::Option::Some(::json_codec::value::FieldType::to_value(&self.x)),
                    "label" => ::std::option::Option::Some(::json_codec::value::FieldType::to_value(&self.label)),
                    _ => ::std::option::Option::None,
                }
            }
        }
        impl ::json_codec::JsonCodec for Point {
            fn definition() -> ::json_codec::descriptor::RecordDef {
                ::json_codec::descriptor::RecordDef::new("Point")
                    .field(::json_codec::descriptor::FieldDef::new("x", <i32 as ::json_codec::value::FieldType>::TAG))
                    .field(::json_codec::descriptor::FieldDef::new("label", <String as ::json_codec::value::FieldType>::TAG))
            }

            fn construct(
                mut args: ::json_codec::traits::Arguments,
            ) -> ::std::result::Result<Self, ::json_codec::error::DecodeError> {
                ::std::result::Result::Ok(Self {
                    x: args.required::<i32>("x")?,
                    label: args.required::<String>("label")?,
                })
            }
        }
    };
    check_expand(input, expected);
}

#[test]
fn test_specialization_with_discriminator() {
    let input = r#"
        #[json_codec(name = "Special", discriminator = "kind", extends = Base, crate = "jc")]
        struct Derived {
            id: u16,
        }
    "#;
    let expected = quote! {
        impl jc::Record for Derived {
            fn field(&self, name: &str) -> ::std::option::Option<jc::value::FieldValue> {
                match name {
                    "id" => ::std::option::Option::Some(jc::value::FieldType::to_value(&self.id)),
                    _ => ::std::option::Option::None,
                }
            }
        }
        impl jc::JsonCodec for Derived {
            fn definition() -> jc::descriptor::RecordDef {
                jc::descriptor::RecordDef::new("Special")
                    .field(jc::descriptor::FieldDef::new("id", <u16 as jc::value::FieldType>::TAG))
                    .extends(jc::descriptor::BaseRef::of::<Base>(
                        <Base as jc::JsonCodec>::definition().name,
                    ))
            }

            fn configuration() -> jc::Configuration {
                jc::Configuration::default().with_discriminator("kind")
            }

            fn construct(
                mut args: jc::traits::Arguments,
            ) -> ::std::result::Result<Self, jc::error::DecodeError> {
                ::std::result::Result::Ok(Self {
                    id: args.required::<u16>("id")?,
                })
            }

            fn register_dependencies(
                registry: &mut jc::registry::RegistryContext<'_>,
            ) -> ::std::result::Result<(), jc::error::GenerationError> {
                registry.register::<Base>()
            }
        }
    };
    check_expand(input, expected);
}

#[test]
fn test_unit_struct() {
    let expected = quote! {
        impl ::json_codec::Record for Marker {
            fn field(&self, name: &str) -> ::std::option::Option<::json_codec::value::FieldValue> {
                match name {
                    _ => ::std::option::Option::None,
                }
            }
        }
        impl ::json_codec::JsonCodec for Marker {
            fn definition() -> ::json_codec::descriptor::RecordDef {
                ::json_codec::descriptor::RecordDef::new("Marker")
            }

            fn construct(
                _args: ::json_codec::traits::Arguments,
            ) -> ::std::result::Result<Self, ::json_codec::error::DecodeError> {
                ::std::result::Result::Ok(Self {})
            }
        }
    };
    check_expand("struct Marker;", expected);
}

#[test]
fn test_field_names() {
    let input = r#"
        #[json_codec(rename_all = "camelCase")]
        struct S {
            created_at: NaiveDateTime,
            #[json_codec(rename = "ID")]
            record_id: i64,
        }
    "#;
    check_field_defs(
        input,
        &[
            quote! {
                ::json_codec::descriptor::FieldDef::new("createdAt", <NaiveDateTime as ::json_codec::value::FieldType>::TAG)
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("ID", <i64 as ::json_codec::value::FieldType>::TAG)
            },
        ],
    );
}

#[test]
fn test_type_resolution() {
    let input = r#"
        struct S {
            a: chrono::NaiveDate,
            b: uuid::Uuid,
            c: DateTime<Utc>,
            d: Vec<u8>,
            e: Option<String>,
            f: u64,
        }
    "#;
    check_field_defs(
        input,
        &[
            quote! {
                ::json_codec::descriptor::FieldDef::new("a", <chrono::NaiveDate as ::json_codec::value::FieldType>::TAG)
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("b", <uuid::Uuid as ::json_codec::value::FieldType>::TAG)
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("c", <DateTime<Utc> as ::json_codec::value::FieldType>::TAG)
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("d", ::json_codec::descriptor::TypeTag::Opaque("Vec<u8>"))
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("e", ::json_codec::descriptor::TypeTag::Opaque("Option<String>"))
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("f", ::json_codec::descriptor::TypeTag::Opaque("u64"))
            },
        ],
    );
}

#[test]
fn test_defaults_and_formats() {
    let input = r#"
        struct S {
            #[json_codec(default)]
            count: i32,
            #[json_codec(format = "%d/%m/%Y %H:%M")]
            at: NaiveDateTime,
            #[json_codec(encode_format = "%s", default = "epoch")]
            since: NaiveDateTime,
        }
    "#;
    check_field_defs(
        input,
        &[
            quote! {
                ::json_codec::descriptor::FieldDef::new("count", <i32 as ::json_codec::value::FieldType>::TAG)
                    .with_default()
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("at", <NaiveDateTime as ::json_codec::value::FieldType>::TAG)
                    .with_format(::json_codec::descriptor::DateTimeFormat::symmetric("%d/%m/%Y %H:%M"))
            },
            quote! {
                ::json_codec::descriptor::FieldDef::new("since", <NaiveDateTime as ::json_codec::value::FieldType>::TAG)
                    .with_default()
                    .with_format(::json_codec::descriptor::DateTimeFormat::new("%s", ::json_codec::convert::ISO_DATETIME))
            },
        ],
    );

    check_construct_body(
        input,
        quote! {
            ::std::result::Result::Ok(Self {
                count: args.optional::<i32>("count")?.unwrap_or_default(),
                at: args.required::<NaiveDateTime>("at")?,
                since: args.optional::<NaiveDateTime>("since")?.unwrap_or_else(epoch),
            })
        },
    );
}

#[test]
fn test_opaque_field_construct() {
    let input = r#"
        struct S {
            size: i64,
            data: Vec<u8>,
        }
    "#;
    check_construct_body(
        input,
        quote! {
            ::std::result::Result::Err(args.unsupported("data"))
        },
    );
}

#[test]
fn test_rejected_inputs() {
    check_expand_error("enum E { A }", "JsonCodec does not support enums");
    check_expand_error("struct T(i32);", "JsonCodec requires named fields");
    check_expand_error(
        "struct G<T> { t: T }",
        "JsonCodec cannot be derived for generic types",
    );
    check_expand_error(
        r#"#[json_codec(tag = "t")] struct S { a: i32 }"#,
        "json_codec: unsupported container attribute",
    );
    check_expand_error(
        r#"struct S { #[json_codec(skip)] a: i32 }"#,
        "json_codec: unsupported field attribute",
    );
    check_expand_error(
        r#"#[json_codec(rename_all = "Title Case")] struct S { a: i32 }"#,
        "unsupported rename_all rule: Title Case",
    );
    check_expand_error(
        r#"#[json_codec(discriminator = "")] struct S { a: i32 }"#,
        "json_codec: the discriminator field name cannot be empty",
    );
    check_expand_error(
        r#"struct S { #[json_codec(format = "%Y", decode_format = "%Y")] a: NaiveDateTime }"#,
        "json_codec: `format` cannot be combined with `encode_format` or `decode_format`",
    );
}
