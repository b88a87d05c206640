use std::{any::Any, collections::HashMap, fmt};

use crate::{
    config::Configuration,
    descriptor::RecordDef,
    error::{DecodeError, GenerationError},
    registry::RegistryContext,
    value::{FieldType, FieldValue},
};

/// Read access to the fields of a record instance.
///
/// This half of the contract is object safe, so polymorphic values travel as
/// `Box<dyn Record>`; the registry recovers the concrete record type from the
/// value's `TypeId`.
pub trait Record: Any + fmt::Debug {
    /// Returns the current value of the field with the given wire name.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// The Rust type name of the concrete record.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Record {
    pub fn is<T: Record>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<T>()
    }

    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }

    /// Recovers the concrete record, or hands the box back unchanged.
    pub fn downcast<T: Record>(self: Box<Self>) -> Result<Box<T>, Box<dyn Record>> {
        if !self.is::<T>() {
            return Err(self);
        }
        let any: Box<dyn Any> = self;
        match any.downcast::<T>() {
            Ok(record) => Ok(record),
            Err(_) => unreachable!("type checked above"),
        }
    }
}

/// A record type the codec can be generated for.
///
/// Usually implemented with `#[derive(JsonCodec)]`.
pub trait JsonCodec: Record + Sized {
    /// The declared shape: name, fields in declaration order, and base type.
    fn definition() -> RecordDef;

    /// The configuration used by [`CodecRegistry::register`](crate::registry::CodecRegistry::register).
    fn configuration() -> Configuration {
        Configuration::default()
    }

    /// Builds an instance from decoded field values.
    ///
    /// Fields absent from `args` take the type's own default.
    fn construct(args: Arguments) -> Result<Self, DecodeError>;

    /// Registers the types this one depends on, i.e. its base.
    ///
    /// The default implementation registers nothing.
    fn register_dependencies(registry: &mut RegistryContext<'_>) -> Result<(), GenerationError> {
        let _ = registry;
        Ok(())
    }
}

/// Decoded constructor arguments, keyed by wire name.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    record: &'static str,
    values: HashMap<&'static str, FieldValue>,
}

impl Arguments {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            values: HashMap::new(),
        }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn insert(&mut self, field: &'static str, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes a field that has no default.
    pub fn required<T: FieldType>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        self.optional(field)?.ok_or(DecodeError::Missing {
            record: self.record,
            field,
        })
    }

    /// Takes a field that may be left to its default.
    pub fn optional<T: FieldType>(&mut self, field: &'static str) -> Result<Option<T>, DecodeError> {
        let Some(value) = self.values.remove(field) else {
            return Ok(None);
        };
        T::from_value(value)
            .map(Some)
            .map_err(|reason| DecodeError::Field {
                record: self.record,
                field,
                reason,
            })
    }

    /// The error returned by types that declare a field without a converter.
    pub fn unsupported(&self, field: &'static str) -> DecodeError {
        DecodeError::Unsupported {
            record: self.record,
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{descriptor::TypeTag, error::ConvertError};

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
    }

    impl Record for Point {
        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "x" => Some(self.x.to_value()),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Other;

    impl Record for Other {
        fn field(&self, _name: &str) -> Option<FieldValue> {
            None
        }
    }

    #[test]
    fn test_downcast() {
        let boxed: Box<dyn Record> = Box::new(Point { x: 3 });
        assert!(boxed.is::<Point>());
        assert!(boxed.downcast_ref::<Other>().is_none());
        assert_eq!(boxed.type_name(), std::any::type_name::<Point>());

        let boxed = boxed.downcast::<Other>().unwrap_err();
        assert_eq!(*boxed.downcast::<Point>().unwrap(), Point { x: 3 });
    }

    #[test]
    fn test_arguments() {
        let mut args = Arguments::new("Point");
        args.insert("x", FieldValue::Integer(3));
        args.insert("y", FieldValue::String("three".into()));
        assert_eq!(args.len(), 2);

        assert_eq!(args.required::<i32>("x").unwrap(), 3);
        assert!(!args.contains("x"));
        assert_eq!(
            args.required::<i32>("x"),
            Err(DecodeError::Missing {
                record: "Point",
                field: "x"
            })
        );
        assert_eq!(args.optional::<i64>("z").unwrap(), None);
        assert_eq!(
            args.optional::<i64>("y"),
            Err(DecodeError::Field {
                record: "Point",
                field: "y",
                reason: ConvertError::TagMismatch {
                    expected: TypeTag::Integer,
                    found: TypeTag::String,
                },
            })
        );
    }
}
