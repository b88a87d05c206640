use thiserror::Error as ThisError;

use crate::descriptor::TypeTag;

///
/// GenerationError
/// raised while registering a record type; the type gets no codec
///

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum GenerationError {
    #[error("field `{field}` of `{record}` has unknown type: {type_tag}")]
    UnsupportedType {
        record: &'static str,
        field: &'static str,
        type_tag: TypeTag,
    },

    #[error("field `{field}` of `{record}` is {type_tag}; a format override needs a DateTime")]
    FormatNotApplicable {
        record: &'static str,
        field: &'static str,
        type_tag: TypeTag,
    },

    #[error("field `{field}` of `{record}` has an invalid format pattern `{pattern}`")]
    InvalidFormat {
        record: &'static str,
        field: &'static str,
        pattern: &'static str,
    },

    #[error("field `{field}` is declared more than once in `{record}`")]
    DuplicateField {
        record: &'static str,
        field: &'static str,
    },

    #[error("discriminator `{field}` of `{record}` collides with a declared field")]
    DiscriminatorCollision { record: &'static str, field: String },

    #[error(
        "`{record}` extends `{base}` but uses discriminator {found:?} instead of {expected:?}"
    )]
    DiscriminatorMismatch {
        record: &'static str,
        base: &'static str,
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("`{record}` extends `{base}`, which is not registered")]
    BaseNotRegistered {
        record: &'static str,
        base: &'static str,
    },

    #[error("`{record}` extends `{base}` but does not declare its field `{field}` as {type_tag}")]
    NotAnExtension {
        record: &'static str,
        base: &'static str,
        field: &'static str,
        type_tag: TypeTag,
    },

    #[error("a different record named `{name}` is already registered")]
    DuplicateRecordName { name: &'static str },

    #[error("`{record}` is its own ancestor")]
    InheritanceCycle { record: &'static str },
}

///
/// SchemaValidationError
///

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("`{record}` rejected the input: {}", violations.join("; "))]
pub struct SchemaValidationError {
    pub record: &'static str,
    pub violations: Vec<String>,
}

///
/// ConvertError
/// a single converter failing on a single value
///

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConvertError {
    #[error("expected {expected}, found `{found}`")]
    UnexpectedJson {
        expected: &'static str,
        found: String,
    },

    #[error("`{value}` does not fit in {target}")]
    OutOfRange {
        value: String,
        target: &'static str,
    },

    #[error("{0} cannot be represented in JSON")]
    NonFiniteFloat(String),

    #[error("`{value}` is not a UUID: {reason}")]
    InvalidUuid { value: String, reason: String },

    #[error("`{value}` does not match `{pattern}`: {reason}")]
    InvalidDateTime {
        value: String,
        pattern: String,
        reason: String,
    },

    #[error("`{value}` is not a calendar date: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("value carried as {found} where {expected} was declared")]
    TagMismatch { expected: TypeTag, found: TypeTag },
}

///
/// DecodeError
///

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum DecodeError {
    #[error("field `{field}` of `{record}`: {reason}")]
    Field {
        record: &'static str,
        field: &'static str,
        reason: ConvertError,
    },

    #[error("field `{field}` of `{record}` is missing")]
    Missing {
        record: &'static str,
        field: &'static str,
    },

    #[error("`{record}` cannot be constructed: field `{field}` has no converter")]
    Unsupported {
        record: &'static str,
        field: &'static str,
    },
}

///
/// EncodeError
/// non-finite floats, and hand-written `Record` impls that disagree with
/// their own definition
///

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum EncodeError {
    #[error("`{record}` does not expose field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("field `{field}` of `{record}`: {reason}")]
    Field {
        record: &'static str,
        field: &'static str,
        reason: ConvertError,
    },
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("`{type_name}` is not registered")]
    NotRegistered { type_name: &'static str },

    #[error("cannot encode `{instance}` with the codec of `{codec}`")]
    UnrelatedType {
        codec: &'static str,
        instance: &'static str,
    },

    #[error("decoded `{found}`, expected `{expected}`")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
