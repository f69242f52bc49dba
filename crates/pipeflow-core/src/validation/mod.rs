//! Capacidad de validación enchufable.
//!
//! El engine sólo conoce el par `is_valid` / `explain`; nunca interpreta el
//! diagnóstico, lo guarda y lo reenvía tal cual. El esquema declarado por un
//! step puede ser inline o una referencia por nombre que se resuelve contra
//! un `SchemaRegistry` en el momento de validar.

pub mod basic;
pub mod registry;

use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::value::Value;

pub use basic::BasicValidator;
pub use registry::SchemaRegistry;

/// Documento de esquema, opaco para el engine.
pub type Schema = serde_json::Value;

/// Resultado de `explain`, opaco para el engine.
pub type Diagnostic = serde_json::Value;

/// Esquema de salida declarado por un step.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", content = "schema", rename_all = "lowercase")]
pub enum OutputSchema {
    #[default]
    None,
    Inline(Schema),
    Named(String),
}

impl OutputSchema {
    pub fn is_declared(&self) -> bool {
        !matches!(self, OutputSchema::None)
    }

    /// Resuelve el esquema concreto. `Err(name)` si la referencia no existe.
    pub fn resolve<'a>(&'a self, registry: &'a SchemaRegistry) -> Result<Option<&'a Schema>, &'a str> {
        match self {
            OutputSchema::None => Ok(None),
            OutputSchema::Inline(schema) => Ok(Some(schema)),
            OutputSchema::Named(name) => registry.get(name).map(Some).ok_or(name.as_str()),
        }
    }
}

/// Argumento `context` que recibe el validador.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub step_name: &'a str,
    pub step_index: usize,
    pub registry: &'a SchemaRegistry,
}

/// Par validate/explain consultado por el engine tras cada step con esquema.
pub trait Validator: Send + Sync + Debug {
    fn is_valid(&self, ctx: &ValidationContext<'_>, schema: &Schema, value: &Value) -> bool;

    fn explain(&self, ctx: &ValidationContext<'_>, schema: &Schema, value: &Value) -> Diagnostic;
}

static DEFAULT_VALIDATOR: Lazy<Arc<dyn Validator>> = Lazy::new(|| Arc::new(BasicValidator));

/// Validador por defecto del proceso.
pub fn default_validator() -> Arc<dyn Validator> {
    Arc::clone(&DEFAULT_VALIDATOR)
}

/// Compara dos validadores por identidad.
pub(crate) fn same_validator(a: &Arc<dyn Validator>, b: &Arc<dyn Validator>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_schema_resolves_through_registry() {
        let mut registry = SchemaRegistry::new();
        let schema = OutputSchema::Named("age".into());
        assert_eq!(schema.resolve(&registry), Err("age"));

        registry.register("age", json!({"type": "integer"}));
        assert_eq!(schema.resolve(&registry), Ok(Some(&json!({"type": "integer"}))));
        assert_eq!(OutputSchema::None.resolve(&registry), Ok(None));
    }

    #[test]
    fn default_validator_is_shared() {
        assert!(same_validator(&default_validator(), &default_validator()));
    }
}
