use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{descriptor::TypeTag, error::ConvertError};

/// A decoded field value, one variant per supported [`TypeTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Boolean(bool),
    String(String),
    Float(f64),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl FieldValue {
    /// The tag this value is carried under.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Integer(_) => TypeTag::Integer,
            Self::Boolean(_) => TypeTag::Boolean,
            Self::String(_) => TypeTag::String,
            Self::Float(_) => TypeTag::Float,
            Self::Uuid(_) => TypeTag::Uuid,
            Self::DateTime(_) => TypeTag::DateTime,
            Self::Date(_) => TypeTag::Date,
        }
    }
}

/// Rust types that can sit in a record field.
///
/// Each implementation binds a Rust type to exactly one [`TypeTag`] and
/// converts between the field and its [`FieldValue`].
pub trait FieldType: Sized {
    const TAG: TypeTag;

    fn to_value(&self) -> FieldValue;

    fn from_value(value: FieldValue) -> Result<Self, ConvertError>;
}

fn mismatch(expected: TypeTag, found: &FieldValue) -> ConvertError {
    ConvertError::TagMismatch {
        expected,
        found: found.type_tag(),
    }
}

macro_rules! impl_field_type_for_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FieldType for $ty {
                const TAG: TypeTag = TypeTag::Integer;

                fn to_value(&self) -> FieldValue {
                    FieldValue::Integer(i64::from(*self))
                }

                fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
                    match value {
                        FieldValue::Integer(n) => <$ty>::try_from(n).map_err(|_| {
                            ConvertError::OutOfRange {
                                value: n.to_string(),
                                target: stringify!($ty),
                            }
                        }),
                        other => Err(mismatch(TypeTag::Integer, &other)),
                    }
                }
            }
        )+
    };
}

impl_field_type_for_integer!(i8, i16, i32, i64, u8, u16, u32);

impl FieldType for bool {
    const TAG: TypeTag = TypeTag::Boolean;

    fn to_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::Boolean(b) => Ok(b),
            other => Err(mismatch(TypeTag::Boolean, &other)),
        }
    }
}

impl FieldType for String {
    const TAG: TypeTag = TypeTag::String;

    fn to_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::String(s) => Ok(s),
            other => Err(mismatch(TypeTag::String, &other)),
        }
    }
}

impl FieldType for f64 {
    const TAG: TypeTag = TypeTag::Float;

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::Float(x) => Ok(x),
            other => Err(mismatch(TypeTag::Float, &other)),
        }
    }
}

impl FieldType for f32 {
    const TAG: TypeTag = TypeTag::Float;

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(f64::from(*self))
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::Float(x) => {
                let narrowed = x as f32;
                if x.is_finite() && narrowed.is_infinite() {
                    return Err(ConvertError::OutOfRange {
                        value: x.to_string(),
                        target: "f32",
                    });
                }
                Ok(narrowed)
            }
            other => Err(mismatch(TypeTag::Float, &other)),
        }
    }
}

impl FieldType for Uuid {
    const TAG: TypeTag = TypeTag::Uuid;

    fn to_value(&self) -> FieldValue {
        FieldValue::Uuid(*self)
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::Uuid(u) => Ok(u),
            other => Err(mismatch(TypeTag::Uuid, &other)),
        }
    }
}

impl FieldType for NaiveDateTime {
    const TAG: TypeTag = TypeTag::DateTime;

    fn to_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt),
            other => Err(mismatch(TypeTag::DateTime, &other)),
        }
    }
}

/// Carried as its UTC wall clock.
impl FieldType for DateTime<Utc> {
    const TAG: TypeTag = TypeTag::DateTime;

    fn to_value(&self) -> FieldValue {
        FieldValue::DateTime(self.naive_utc())
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt.and_utc()),
            other => Err(mismatch(TypeTag::DateTime, &other)),
        }
    }
}

impl FieldType for NaiveDate {
    const TAG: TypeTag = TypeTag::Date;

    fn to_value(&self) -> FieldValue {
        FieldValue::Date(*self)
    }

    fn from_value(value: FieldValue) -> Result<Self, ConvertError> {
        match value {
            FieldValue::Date(d) => Ok(d),
            other => Err(mismatch(TypeTag::Date, &other)),
        }
    }
}
