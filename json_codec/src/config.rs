use serde::{Deserialize, Serialize};

/// Settings applied to a record type when it is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Name of the synthetic member that carries the record name on the wire.
    pub discriminator_field: Option<String>,
}

impl Configuration {
    /// Returns a copy with the discriminator set to `field_name`.
    #[must_use]
    pub fn with_discriminator(&self, field_name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.discriminator_field = Some(field_name.into());
        next
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator_field.as_deref()
    }
}
