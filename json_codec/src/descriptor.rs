//! Record and field descriptors.
//!
//! A [`RecordDef`] is the declared shape of a record type, as produced by
//! `#[derive(JsonCodec)]` or written by hand. Registration resolves every
//! [`FieldDef`] against the converter table and freezes the result into a
//! [`RecordDescriptor`], which drives `schema`, `encode` and `decode`.

use std::{any::TypeId, collections::HashSet, fmt};

use crate::{config::Configuration, convert::Converter, error::GenerationError};

/// The declared wire type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    Boolean,
    String,
    Float,
    Uuid,
    DateTime,
    Date,
    /// Any type the converter table does not recognize. Carries the
    /// declared Rust type for error reporting.
    Opaque(&'static str),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("Integer"),
            Self::Boolean => f.write_str("Boolean"),
            Self::String => f.write_str("String"),
            Self::Float => f.write_str("Float"),
            Self::Uuid => f.write_str("UUID"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Date => f.write_str("Date"),
            Self::Opaque(ty) => f.write_str(ty),
        }
    }
}

/// strftime-style patterns overriding the ISO-8601 form of a `DateTime` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTimeFormat {
    pub encode: &'static str,
    pub decode: &'static str,
}

impl DateTimeFormat {
    /// Uses the same pattern in both directions.
    pub const fn symmetric(pattern: &'static str) -> Self {
        Self {
            encode: pattern,
            decode: pattern,
        }
    }

    pub const fn new(encode: &'static str, decode: &'static str) -> Self {
        Self { encode, decode }
    }
}

/// A declared record member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: &'static str,
    pub type_tag: TypeTag,
    /// `true` when the record type supplies a default value or factory.
    pub has_default: bool,
    pub format: Option<DateTimeFormat>,
}

impl FieldDef {
    pub const fn new(name: &'static str, type_tag: TypeTag) -> Self {
        Self {
            name,
            type_tag,
            has_default: false,
            format: None,
        }
    }

    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: DateTimeFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Reference from a specialization to its direct base record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseRef {
    pub type_id: TypeId,
    pub name: &'static str,
}

impl BaseRef {
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name,
        }
    }
}

/// The declared shape of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    /// The record name, also used as its discriminator value.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    pub base: Option<BaseRef>,
}

impl RecordDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            base: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn extends(mut self, base: BaseRef) -> Self {
        self.base = Some(base);
        self
    }
}

/// A field whose type has been resolved against the converter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub type_tag: TypeTag,
    pub required: bool,
    pub format_override: Option<DateTimeFormat>,
    pub(crate) converter: Converter,
}

impl FieldDescriptor {
    pub fn converter(&self) -> Converter {
        self.converter
    }
}

/// The frozen, generation-time view of a registered record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    pub discriminator_field: Option<String>,
    pub base: Option<BaseRef>,
}

impl RecordDescriptor {
    /// Resolves every field of `definition` against the converter table.
    ///
    /// `base` is the descriptor of the direct base type, which must already
    /// be registered when `definition` names one.
    pub fn generate(
        definition: RecordDef,
        config: Configuration,
        base: Option<&RecordDescriptor>,
    ) -> Result<Self, GenerationError> {
        let record = definition.name;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(definition.fields.len());
        for field in &definition.fields {
            if !seen.insert(field.name) {
                return Err(GenerationError::DuplicateField {
                    record,
                    field: field.name,
                });
            }
            fields.push(FieldDescriptor {
                name: field.name,
                type_tag: field.type_tag,
                required: !field.has_default,
                format_override: field.format,
                converter: Converter::resolve(record, field)?,
            });
        }

        if let Some(discriminator) = config.discriminator() {
            if seen.contains(discriminator) {
                return Err(GenerationError::DiscriminatorCollision {
                    record,
                    field: discriminator.to_string(),
                });
            }
        }

        // a specialization extends the field set of its base
        if let Some(base) = base {
            for inherited in &base.fields {
                let declared = fields.iter().find(|f| f.name == inherited.name);
                if declared.is_none_or(|f| f.type_tag != inherited.type_tag) {
                    return Err(GenerationError::NotAnExtension {
                        record,
                        base: base.name,
                        field: inherited.name,
                        type_tag: inherited.type_tag,
                    });
                }
            }

            // the base's decode can only dispatch on its own discriminator
            if config.discriminator() != base.discriminator_field.as_deref() {
                return Err(GenerationError::DiscriminatorMismatch {
                    record,
                    base: base.name,
                    expected: base.discriminator_field.clone(),
                    found: config.discriminator_field,
                });
            }
        }

        Ok(Self {
            name: record,
            fields,
            discriminator_field: config.discriminator_field,
            base: definition.base,
        })
    }

    /// Looks up a field by its wire name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the fields without a default, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }
}
