use convert_case::Case;
use syn::{Attribute, Error, LitStr, Path, spanned::Spanned};

#[derive(Clone)]
pub(crate) struct ContainerAttrs {
    pub(crate) crate_path: Path,
    pub(crate) name: Option<String>,
    pub(crate) rename_all: Option<Case<'static>>,
    pub(crate) discriminator: Option<String>,
    pub(crate) extends: Option<Path>,
}

impl Default for ContainerAttrs {
    fn default() -> Self {
        Self {
            crate_path: syn::parse_quote!(::json_codec),
            name: None,
            rename_all: None,
            discriminator: None,
            extends: None,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct FieldAttrs {
    pub(crate) rename: Option<String>,
    pub(crate) default: Option<FieldDefault>,
    pub(crate) format: Option<String>,
    pub(crate) encode_format: Option<String>,
    pub(crate) decode_format: Option<String>,
}

#[derive(Clone)]
pub(crate) enum FieldDefault {
    /// `#[json_codec(default)]`: `Default::default()`.
    Trait,
    /// `#[json_codec(default = "path")]`: a factory function.
    Path(Path),
}

fn parse_rename_all(s: &str) -> Option<Case<'static>> {
    Some(match s {
        "lowercase" => Case::Lower,
        "UPPERCASE" => Case::Upper,
        "snake_case" => Case::Snake,
        "kebab-case" => Case::Kebab,
        "camelCase" => Case::Camel,
        "PascalCase" => Case::Pascal,
        "SCREAMING_SNAKE_CASE" => Case::UpperSnake,
        "SCREAMING-KEBAB-CASE" => Case::UpperKebab,
        _ => return None,
    })
}

fn parse_path(v: &LitStr, what: &str) -> syn::Result<Path> {
    syn::parse_str::<Path>(&v.value()).map_err(|e| {
        Error::new(
            v.span(),
            format!("json_codec: invalid path for #[json_codec({what} = \"...\")]: {e}"),
        )
    })
}

pub(crate) fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("json_codec") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let v: LitStr = meta.value()?.parse()?;
                out.crate_path = parse_path(&v, "crate")?;
                return Ok(());
            }
            if meta.path.is_ident("name") {
                let v: LitStr = meta.value()?.parse()?;
                out.name = Some(v.value());
                return Ok(());
            }
            if meta.path.is_ident("rename_all") {
                let v: LitStr = meta.value()?.parse()?;
                out.rename_all = Some(parse_rename_all(&v.value()).ok_or_else(|| {
                    Error::new(
                        v.span(),
                        format!("unsupported rename_all rule: {}", v.value()),
                    )
                })?);
                return Ok(());
            }
            if meta.path.is_ident("discriminator") {
                let v: LitStr = meta.value()?.parse()?;
                if v.value().is_empty() {
                    return Err(Error::new(
                        v.span(),
                        "json_codec: the discriminator field name cannot be empty",
                    ));
                }
                out.discriminator = Some(v.value());
                return Ok(());
            }
            if meta.path.is_ident("extends") {
                out.extends = Some(meta.value()?.parse()?);
                return Ok(());
            }

            Err(Error::new(
                meta.path.span(),
                "json_codec: unsupported container attribute",
            ))
        })?;
    }

    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("json_codec") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let v: LitStr = meta.value()?.parse()?;
                out.rename = Some(v.value());
                return Ok(());
            }
            if meta.path.is_ident("default") {
                // Accept both `#[json_codec(default)]` and `#[json_codec(default = "path")]`.
                out.default = Some(if meta.input.peek(syn::token::Eq) {
                    let v: LitStr = meta.value()?.parse()?;
                    FieldDefault::Path(parse_path(&v, "default")?)
                } else {
                    FieldDefault::Trait
                });
                return Ok(());
            }
            if meta.path.is_ident("format") {
                let v: LitStr = meta.value()?.parse()?;
                out.format = Some(v.value());
                return Ok(());
            }
            if meta.path.is_ident("encode_format") {
                let v: LitStr = meta.value()?.parse()?;
                out.encode_format = Some(v.value());
                return Ok(());
            }
            if meta.path.is_ident("decode_format") {
                let v: LitStr = meta.value()?.parse()?;
                out.decode_format = Some(v.value());
                return Ok(());
            }

            Err(Error::new(
                meta.path.span(),
                "json_codec: unsupported field attribute",
            ))
        })?;

        if out.format.is_some() && (out.encode_format.is_some() || out.decode_format.is_some()) {
            return Err(Error::new(
                attr.span(),
                "json_codec: `format` cannot be combined with `encode_format` or `decode_format`",
            ));
        }
    }

    Ok(out)
}
