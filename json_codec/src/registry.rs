use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
};

use log::debug;

use crate::{
    JsonCodec,
    codec::Codec,
    config::Configuration,
    descriptor::RecordDescriptor,
    error::{DecodeError, Error, GenerationError},
    traits::{Arguments, Record},
    validate::{JsonSchemaValidator, SchemaValidator},
};

pub(crate) type Construct = fn(Arguments) -> Result<Box<dyn Record>, DecodeError>;

/// Everything generated for one registered record type.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) descriptor: RecordDescriptor,
    pub(crate) construct: Construct,
}

fn construct_boxed<T: JsonCodec>(args: Arguments) -> Result<Box<dyn Record>, DecodeError> {
    T::construct(args).map(|record| Box::new(record) as Box<dyn Record>)
}

/// The `CodecRegistry` owns the descriptors of all registered record types
/// and, per base type, the direct specializations registered against it.
///
/// Registration happens up front and needs `&mut self`; afterwards the
/// registry is only read, so a shared reference can be used from any thread.
#[derive(Debug)]
pub struct CodecRegistry {
    records: HashMap<TypeId, Entry>,
    names: HashMap<&'static str, TypeId>,
    subtypes: HashMap<TypeId, Vec<TypeId>>,
    validator: Box<dyn SchemaValidator>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Creates a new, empty `CodecRegistry` validating with [`JsonSchemaValidator`].
    pub fn new() -> Self {
        Self::with_validator(JsonSchemaValidator::default())
    }

    /// Creates a new, empty `CodecRegistry` using `validator` before every decode.
    pub fn with_validator(validator: impl SchemaValidator + 'static) -> Self {
        Self {
            records: HashMap::new(),
            names: HashMap::new(),
            subtypes: HashMap::new(),
            validator: Box::new(validator),
        }
    }

    /// Registers `T` with its own [`JsonCodec::configuration`].
    ///
    /// Shorthand for `register_with::<T>(T::configuration())`.
    pub fn register<T>(&mut self) -> Result<(), GenerationError>
    where
        T: JsonCodec,
    {
        self.register_with::<T>(T::configuration())
    }

    /// Registers `T`, after its dependencies, using `config`.
    ///
    /// Registering an already registered type does nothing. On error `T` is
    /// left unregistered.
    pub fn register_with<T>(&mut self, config: Configuration) -> Result<(), GenerationError>
    where
        T: JsonCodec,
    {
        RegistryContext {
            registry: self,
            pending: HashSet::new(),
        }
        .register_with::<T>(config)
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.records.contains_key(&TypeId::of::<T>())
    }

    /// Returns the codec generated for `T`.
    pub fn codec<T: JsonCodec>(&self) -> Result<Codec<'_>, Error> {
        self.codec_by_id(TypeId::of::<T>())
            .ok_or(Error::NotRegistered {
                type_name: std::any::type_name::<T>(),
            })
    }

    pub fn codec_by_id(&self, type_id: TypeId) -> Option<Codec<'_>> {
        let entry = self.records.get(&type_id)?;
        Some(Codec::new(self, type_id, entry))
    }

    /// Returns the codec of the record registered under `name`.
    pub fn codec_named(&self, name: &str) -> Option<Codec<'_>> {
        self.codec_by_id(*self.names.get(name)?)
    }

    /// Returns the codec for the runtime type of `instance`.
    pub fn codec_of(&self, instance: &dyn Record) -> Option<Codec<'_>> {
        let any: &dyn Any = instance;
        self.codec_by_id(any.type_id())
    }

    pub fn descriptor(&self, type_id: TypeId) -> Option<&RecordDescriptor> {
        self.records.get(&type_id).map(|entry| &entry.descriptor)
    }

    /// Names of the direct specializations of `base`, in registration order.
    pub fn lookup(&self, base: TypeId) -> Vec<&'static str> {
        self.subtypes
            .get(&base)
            .into_iter()
            .flatten()
            .filter_map(|id| self.descriptor(*id))
            .map(|d| d.name)
            .collect()
    }

    /// Shorthand for `lookup(TypeId::of::<T>())`.
    pub fn subtypes<T: 'static>(&self) -> Vec<&'static str> {
        self.lookup(TypeId::of::<T>())
    }

    /// Returns an iterator over all registered `(TypeId, RecordDescriptor)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeId, &RecordDescriptor)> {
        self.records.iter().map(|(id, entry)| (id, &entry.descriptor))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn validator(&self) -> &dyn SchemaValidator {
        self.validator.as_ref()
    }

    /// The direct specialization of `base` registered under `name`.
    pub(crate) fn subtype_named(&self, base: TypeId, name: &str) -> Option<Codec<'_>> {
        let id = self
            .subtypes
            .get(&base)?
            .iter()
            .find(|id| self.descriptor(**id).is_some_and(|d| d.name == name))?;
        self.codec_by_id(*id)
    }

    /// Whether `type_id` is `ancestor` or specializes it through any number of levels.
    pub(crate) fn extends(&self, type_id: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(type_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self
                .descriptor(id)
                .and_then(|d| d.base)
                .map(|base| base.type_id);
        }
        false
    }

    fn try_register<T>(&mut self, config: Configuration) -> Result<(), GenerationError>
    where
        T: JsonCodec,
    {
        let type_id = TypeId::of::<T>();
        let definition = T::definition();

        if let Some(existing) = self.names.get(definition.name) {
            if *existing != type_id {
                return Err(GenerationError::DuplicateRecordName {
                    name: definition.name,
                });
            }
        }

        let base = match definition.base {
            Some(base) => Some(self.descriptor(base.type_id).ok_or(
                GenerationError::BaseNotRegistered {
                    record: definition.name,
                    base: base.name,
                },
            )?),
            None => None,
        };

        let descriptor = RecordDescriptor::generate(definition, config, base)?;

        debug!(
            "registered record `{}` ({} fields, discriminator: {:?})",
            descriptor.name,
            descriptor.fields.len(),
            descriptor.discriminator_field,
        );

        if let Some(base) = descriptor.base {
            self.subtypes.entry(base.type_id).or_default().push(type_id);
        }
        self.names.insert(descriptor.name, type_id);
        self.records.insert(
            type_id,
            Entry {
                descriptor,
                construct: construct_boxed::<T>,
            },
        );
        Ok(())
    }
}

/// `RegistryContext` provides contextual access to a `CodecRegistry`
/// and tracks currently pending type registrations to detect cycles.
pub struct RegistryContext<'a> {
    registry: &'a mut CodecRegistry,
    pending: HashSet<TypeId>,
}

impl RegistryContext<'_> {
    /// Returns whether `T` is currently being registered.
    pub fn is_pending<T: 'static>(&self) -> bool {
        self.pending.contains(&TypeId::of::<T>())
    }

    /// Marks `T` as pending (true) or clears it (false).
    pub fn set_pending<T: 'static>(&mut self, pending: bool) {
        let type_id = TypeId::of::<T>();
        if pending {
            self.pending.insert(type_id);
        } else {
            self.pending.remove(&type_id);
        }
    }

    /// Registers a dependency with its own configuration.
    pub fn register<T: JsonCodec>(&mut self) -> Result<(), GenerationError> {
        self.register_with::<T>(T::configuration())
    }

    pub fn register_with<T: JsonCodec>(
        &mut self,
        config: Configuration,
    ) -> Result<(), GenerationError> {
        if self.registry.is_registered::<T>() {
            debug!(
                "`{}` is already registered",
                std::any::type_name::<T>()
            );
            return Ok(());
        }
        if self.is_pending::<T>() {
            return Err(GenerationError::InheritanceCycle {
                record: T::definition().name,
            });
        }

        self.set_pending::<T>(true);
        let result = T::register_dependencies(self)
            .and_then(|()| self.registry.try_register::<T>(config));
        self.set_pending::<T>(false);
        result
    }
}
