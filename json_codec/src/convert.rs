//! The type converter table.
//!
//! Every [`TypeTag`] a record may use maps to one [`Converter`], which knows
//! the tag's schema fragment and its encode and decode rules. `Opaque` has no
//! entry: resolving it fails at registration time.


use std::fmt::Write;

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime,
    format::{Item, ParseErrorKind, StrftimeItems},
};
use serde_json::{Number, Value, json};
use uuid::Uuid;

use crate::{
    descriptor::{DateTimeFormat, FieldDef, TypeTag},
    error::{ConvertError, GenerationError},
    value::FieldValue,
};

/// ISO-8601 date-time, with a fractional part only when one is present.
pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// ISO-8601 calendar date.
pub const ISO_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Integer,
    Boolean,
    String,
    Float,
    Uuid,
    DateTime(Option<DateTimeFormat>),
    Date,
}

impl Converter {
    /// Looks up the converter for a declared field.
    pub fn resolve(record: &'static str, field: &FieldDef) -> Result<Self, GenerationError> {
        if let Some(format) = field.format {
            if field.type_tag != TypeTag::DateTime {
                return Err(GenerationError::FormatNotApplicable {
                    record,
                    field: field.name,
                    type_tag: field.type_tag,
                });
            }
            for pattern in [format.encode, format.decode] {
                if !is_valid_pattern(pattern) {
                    return Err(GenerationError::InvalidFormat {
                        record,
                        field: field.name,
                        pattern,
                    });
                }
            }
        }

        Ok(match field.type_tag {
            TypeTag::Integer => Self::Integer,
            TypeTag::Boolean => Self::Boolean,
            TypeTag::String => Self::String,
            TypeTag::Float => Self::Float,
            TypeTag::Uuid => Self::Uuid,
            TypeTag::DateTime => Self::DateTime(field.format),
            TypeTag::Date => Self::Date,
            TypeTag::Opaque(_) => {
                return Err(GenerationError::UnsupportedType {
                    record,
                    field: field.name,
                    type_tag: field.type_tag,
                });
            }
        })
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Integer => TypeTag::Integer,
            Self::Boolean => TypeTag::Boolean,
            Self::String => TypeTag::String,
            Self::Float => TypeTag::Float,
            Self::Uuid => TypeTag::Uuid,
            Self::DateTime(_) => TypeTag::DateTime,
            Self::Date => TypeTag::Date,
        }
    }

    /// The JSON Schema fragment describing this field's wire form.
    pub fn schema(&self) -> Value {
        match self {
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::String => json!({"type": "string"}),
            Self::Float => json!({"type": "number"}),
            Self::Uuid => json!({"type": "string", "format": "uuid"}),
            Self::DateTime(_) => json!({"type": "string", "format": "date-time"}),
            Self::Date => json!({"type": "string", "format": "full-date"}),
        }
    }

    pub fn encode(&self, value: &FieldValue) -> Result<Value, ConvertError> {
        match (self, value) {
            (Self::Integer, FieldValue::Integer(n)) => Ok(Value::from(*n)),
            (Self::Boolean, FieldValue::Boolean(b)) => Ok(Value::Bool(*b)),
            (Self::String, FieldValue::String(s)) => Ok(Value::String(s.clone())),
            (Self::Float, FieldValue::Float(x)) => Number::from_f64(*x)
                .map(Value::Number)
                .ok_or_else(|| ConvertError::NonFiniteFloat(x.to_string())),
            (Self::Uuid, FieldValue::Uuid(u)) => Ok(Value::String(u.hyphenated().to_string())),
            (Self::DateTime(format), FieldValue::DateTime(dt)) => {
                let pattern = format.map_or(ISO_DATETIME, |f| f.encode);
                let mut out = String::new();
                write!(out, "{}", dt.format(pattern)).map_err(|_| {
                    ConvertError::InvalidDateTime {
                        value: dt.to_string(),
                        pattern: pattern.to_string(),
                        reason: "pattern cannot format a local date-time".to_string(),
                    }
                })?;
                Ok(Value::String(out))
            }
            (Self::Date, FieldValue::Date(d)) => Ok(Value::String(d.format(ISO_DATE).to_string())),
            (_, other) => Err(ConvertError::TagMismatch {
                expected: self.type_tag(),
                found: other.type_tag(),
            }),
        }
    }

    pub fn decode(&self, value: &Value) -> Result<FieldValue, ConvertError> {
        match self {
            Self::Integer => decode_integer(value).map(FieldValue::Integer),
            Self::Boolean => value
                .as_bool()
                .map(FieldValue::Boolean)
                .ok_or_else(|| unexpected("a boolean", value)),
            Self::String => expect_str(value).map(|s| FieldValue::String(s.to_string())),
            Self::Float => value
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| unexpected("a number", value)),
            Self::Uuid => {
                let s = expect_str(value)?;
                Uuid::parse_str(s)
                    .map(FieldValue::Uuid)
                    .map_err(|e| ConvertError::InvalidUuid {
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
            Self::DateTime(format) => {
                let s = expect_str(value)?;
                match format {
                    Some(format) => parse_datetime_with(s, format.decode),
                    None => parse_iso_datetime(s),
                }
                .map(FieldValue::DateTime)
            }
            Self::Date => {
                let s = expect_str(value)?;
                NaiveDate::parse_from_str(s, ISO_DATE)
                    .map(FieldValue::Date)
                    .map_err(|e| ConvertError::InvalidDate {
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }
}

fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn unexpected(expected: &'static str, found: &Value) -> ConvertError {
    ConvertError::UnexpectedJson {
        expected,
        found: found.to_string(),
    }
}

fn expect_str(value: &Value) -> Result<&str, ConvertError> {
    value.as_str().ok_or_else(|| unexpected("a string", value))
}

// JSON numbers such as `3.0` are integers as far as the schema is concerned.
fn decode_integer(value: &Value) -> Result<i64, ConvertError> {
    let Value::Number(n) = value else {
        return Err(unexpected("an integer", value));
    };
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(ConvertError::OutOfRange {
            value: n.to_string(),
            target: "i64",
        });
    }
    match n.as_f64() {
        Some(x) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
            Ok(x as i64)
        }
        _ => Err(unexpected("an integer", value)),
    }
}

fn parse_iso_datetime(s: &str) -> Result<NaiveDateTime, ConvertError> {
    NaiveDateTime::parse_from_str(s, ISO_DATETIME)
        .or_else(|naive_err| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .map_err(|_| naive_err)
        })
        .map_err(|e| ConvertError::InvalidDateTime {
            value: s.to_string(),
            pattern: ISO_DATETIME.to_string(),
            reason: e.to_string(),
        })
}

// Missing time components default to midnight.
fn parse_datetime_with(s: &str, pattern: &str) -> Result<NaiveDateTime, ConvertError> {
    NaiveDateTime::parse_from_str(s, pattern)
        .or_else(|e| match e.kind() {
            ParseErrorKind::NotEnough => NaiveDate::parse_from_str(s, pattern)
                .map(|d| d.and_time(NaiveTime::MIN))
                .map_err(|_| e),
            _ => Err(e),
        })
        .map_err(|e| ConvertError::InvalidDateTime {
            value: s.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
