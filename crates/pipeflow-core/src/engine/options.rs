use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::{Schema, SchemaRegistry};

/// Orden de precedencia al fusionar los bindings de un step en el estado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingPrecedence {
    /// Los bindings del step sobrescriben cualquier clave existente,
    /// incluidas las que vienen de los args.
    #[default]
    StepBindingsWin,
    /// Los bindings del step sólo rellenan claves ausentes en el estado.
    ArgsWin,
}

impl BindingPrecedence {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingPrecedence::StepBindingsWin => "step",
            BindingPrecedence::ArgsWin => "args",
        }
    }
}

impl fmt::Display for BindingPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingPrecedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "step" | "step-bindings-win" => Ok(BindingPrecedence::StepBindingsWin),
            "args" | "args-win" => Ok(BindingPrecedence::ArgsWin),
            other => Err(format!("unknown binding precedence '{other}' (expected 'step' or 'args')")),
        }
    }
}

/// Opciones de un run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Espera (sin timeout) los valores diferidos antes de pasarlos como args.
    pub allow_async_args: bool,
    pub precedence: BindingPrecedence,
    /// Esquemas con nombre referenciados por `Step::with_schema_ref`.
    pub schemas: SchemaRegistry,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_async_args(mut self, allow: bool) -> Self {
        self.allow_async_args = allow;
        self
    }

    pub fn with_precedence(mut self, precedence: BindingPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.schemas.register(name, schema);
        self
    }
}
