//! The three operations generated for a registered record type.


use std::any::{Any, TypeId};

use log::trace;
use serde_json::{Map, Value, json};

use crate::{
    JsonCodec,
    descriptor::RecordDescriptor,
    error::{DecodeError, EncodeError, Error, SchemaValidationError},
    registry::{CodecRegistry, Entry},
    traits::{Arguments, Record},
};

/// `schema`, `encode` and `decode` bound to one record type of a [`CodecRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r CodecRegistry,
    type_id: TypeId,
    entry: &'r Entry,
}

impl<'r> Codec<'r> {
    pub(crate) fn new(registry: &'r CodecRegistry, type_id: TypeId, entry: &'r Entry) -> Self {
        Self {
            registry,
            type_id,
            entry,
        }
    }

    pub fn name(&self) -> &'static str {
        self.entry.descriptor.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn descriptor(&self) -> &'r RecordDescriptor {
        &self.entry.descriptor
    }

    /// Names of the direct specializations registered so far.
    pub fn subtypes(&self) -> Vec<&'static str> {
        self.registry.lookup(self.type_id)
    }

    /// The JSON Schema of this record type.
    ///
    /// The discriminator's `enum` is computed from the registry on every
    /// call, so it grows as specializations are registered.
    ///
    /// The `enum` lists this record's own name before its subtypes, so a
    /// base instance encoded here still passes its own schema.
    pub fn schema(&self) -> Value {
        let descriptor = self.descriptor();
        let mut properties = Map::new();

        if let Some(field) = &descriptor.discriminator_field {
            let mut property = Map::new();
            property.insert("type".to_string(), json!("string"));
            let subtypes = self.subtypes();
            if !subtypes.is_empty() {
                let names = std::iter::once(descriptor.name)
                    .chain(subtypes)
                    .map(Value::from)
                    .collect();
                property.insert("enum".to_string(), Value::Array(names));
            }
            properties.insert(field.clone(), Value::Object(property));
        }

        for field in &descriptor.fields {
            properties.insert(field.name.to_string(), field.converter.schema());
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": descriptor.required().collect::<Vec<_>>(),
        })
    }

    /// Encodes `instance` into a JSON value tree.
    ///
    /// The fields and discriminator come from the runtime type of `instance`,
    /// which must be this record type or one of its specializations.
    pub fn encode(&self, instance: &dyn Record) -> Result<Value, Error> {
        let any: &dyn Any = instance;
        let runtime = self
            .registry
            .codec_by_id(any.type_id())
            .ok_or(Error::NotRegistered {
                type_name: instance.type_name(),
            })?;
        if !self.registry.extends(runtime.type_id, self.type_id) {
            return Err(Error::UnrelatedType {
                codec: self.name(),
                instance: runtime.name(),
            });
        }

        Ok(encode_fields(runtime.descriptor(), instance)?)
    }

    /// Encodes `instance` to a JSON string.
    pub fn encode_string(&self, instance: &dyn Record) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.encode(instance)?)?)
    }

    /// Validates `value` against [`Codec::schema`] and rebuilds the record.
    ///
    /// When the discriminator names a direct specialization, that type's
    /// codec decodes the whole value instead.
    pub fn decode(&self, value: &Value) -> Result<Box<dyn Record>, Error> {
        let record = self.name();
        self.registry
            .validator()
            .validate(&self.schema(), value)
            .map_err(|violations| SchemaValidationError { record, violations })?;

        if let Some(subtype) = self.dispatch_target(value) {
            trace!("decoding `{record}` as `{}`", subtype.name());
            return subtype.decode(value);
        }

        let Some(object) = value.as_object() else {
            return Err(SchemaValidationError {
                record,
                violations: vec![format!("{value} is not of type \"object\"")],
            }
            .into());
        };

        let mut args = Arguments::new(record);
        for field in &self.descriptor().fields {
            match object.get(field.name) {
                Some(raw) => {
                    let decoded =
                        field
                            .converter
                            .decode(raw)
                            .map_err(|reason| DecodeError::Field {
                                record,
                                field: field.name,
                                reason,
                            })?;
                    args.insert(field.name, decoded);
                }
                None if field.required => {
                    return Err(DecodeError::Missing {
                        record,
                        field: field.name,
                    }
                    .into());
                }
                None => {}
            }
        }

        Ok((self.entry.construct)(args)?)
    }

    /// Parses `json` and decodes it.
    pub fn decode_str(&self, json: &str) -> Result<Box<dyn Record>, Error> {
        let value: Value = serde_json::from_str(json)?;
        self.decode(&value)
    }

    /// Decodes `value` and expects the result to be a `T`.
    pub fn decode_into<T: JsonCodec>(&self, value: &Value) -> Result<T, Error> {
        self.decode(value)?
            .downcast::<T>()
            .map(|record| *record)
            .map_err(|other| Error::UnexpectedType {
                expected: std::any::type_name::<T>(),
                found: other.type_name(),
            })
    }

    fn dispatch_target(&self, value: &Value) -> Option<Codec<'r>> {
        let field = self.descriptor().discriminator_field.as_deref()?;
        let name = value.get(field)?.as_str()?;
        self.registry.subtype_named(self.type_id, name)
    }
}

fn encode_fields(descriptor: &RecordDescriptor, instance: &dyn Record) -> Result<Value, EncodeError> {
    let record = descriptor.name;
    let mut tree = Map::new();

    if let Some(field) = &descriptor.discriminator_field {
        tree.insert(field.clone(), Value::from(record));
    }

    for field in &descriptor.fields {
        let value = instance
            .field(field.name)
            .ok_or(EncodeError::MissingField {
                record,
                field: field.name,
            })?;
        let encoded = field
            .converter
            .encode(&value)
            .map_err(|reason| EncodeError::Field {
                record,
                field: field.name,
                reason,
            })?;
        tree.insert(field.name.to_string(), encoded);
    }

    Ok(Value::Object(tree))
}
