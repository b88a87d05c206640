use std::fmt;

use jsonschema::Draft;
use serde_json::Value;

/// Checks a JSON value against a JSON Schema before it is decoded.
pub trait SchemaValidator: fmt::Debug + Send + Sync {
    /// Returns every violated constraint, or `Ok(())` when `instance` conforms.
    fn validate(&self, schema: &Value, instance: &Value) -> Result<(), Vec<String>>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate, using Draft 7.
///
/// Format assertions are off by default: malformed UUID and date strings are
/// then reported by the field's decode rule, which names the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator {
    validate_formats: bool,
}

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn validate_formats(mut self, yes: bool) -> Self {
        self.validate_formats = yes;
        self
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, instance: &Value) -> Result<(), Vec<String>> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .should_validate_formats(self.validate_formats)
            .build(schema)
            .map_err(|e| vec![format!("invalid schema: {e}")])?;

        let violations: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
