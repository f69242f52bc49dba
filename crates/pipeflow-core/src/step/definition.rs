use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::function::StepFn;
use super::run_result::{Failure, StepOutcome, StepRun};
use crate::errors::StepError;
use crate::path::Path;
use crate::validation::{default_validator, same_validator, OutputSchema, Schema, SchemaRegistry, ValidationContext,
                        Validator};
use crate::value::{Bindings, Value};

/// Tipo descriptivo del step; no cambia la forma de ejecutarlo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Action,
    Transformation,
}

/// Definición (y, tras un run, registro) de un step.
///
/// Los campos de ejecución (`index`, `run`) sólo los escriben el builder y
/// el engine; desde fuera el step es de sólo lectura.
#[derive(Debug, Clone)]
pub struct Step {
    pub(crate) name: String,
    pub(crate) kind: StepKind,
    pub(crate) function: StepFn,
    pub(crate) inputs: Vec<Path>,
    pub(crate) output: Option<Path>,
    pub(crate) schema: OutputSchema,
    pub(crate) bindings: Bindings,
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) index: Option<usize>,
    pub(crate) run: Option<StepRun>,
}

/// Atajo de `Step::action`.
pub fn action<I, P>(name: impl Into<String>, function: StepFn, inputs: I) -> Step
    where I: IntoIterator<Item = P>,
          P: Into<Path>
{
    Step::action(name, function, inputs)
}

/// Atajo de `Step::transformation`.
pub fn transformation<I, P>(name: impl Into<String>, function: StepFn, inputs: I) -> Step
    where I: IntoIterator<Item = P>,
          P: Into<Path>
{
    Step::transformation(name, function, inputs)
}

impl Step {
    pub fn new<I, P>(kind: StepKind, name: impl Into<String>, function: StepFn, inputs: I) -> Self
        where I: IntoIterator<Item = P>,
              P: Into<Path>
    {
        Self { name: name.into(),
               kind,
               function,
               inputs: inputs.into_iter().map(Into::into).collect(),
               output: None,
               schema: OutputSchema::None,
               bindings: Bindings::new(),
               validator: default_validator(),
               index: None,
               run: None }
    }

    pub fn action<I, P>(name: impl Into<String>, function: StepFn, inputs: I) -> Self
        where I: IntoIterator<Item = P>,
              P: Into<Path>
    {
        Self::new(StepKind::Action, name, function, inputs)
    }

    pub fn transformation<I, P>(name: impl Into<String>, function: StepFn, inputs: I) -> Self
        where I: IntoIterator<Item = P>,
              P: Into<Path>
    {
        Self::new(StepKind::Transformation, name, function, inputs)
    }

    /// Path del estado donde se escribe el resultado.
    pub fn with_output(mut self, output: impl Into<Path>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = OutputSchema::Inline(schema);
        self
    }

    /// Referencia a un esquema registrado; se resuelve al validar.
    pub fn with_schema_ref(mut self, name: impl Into<String>) -> Self {
        self.schema = OutputSchema::Named(name.into());
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn with_binding(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(key.into(), value.into());
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn function(&self) -> &StepFn {
        &self.function
    }

    pub fn inputs(&self) -> &[Path] {
        &self.inputs
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_ref()
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    /// Posición asignada por el builder; `None` para un step suelto.
    pub fn sequence_index(&self) -> Option<usize> {
        self.index
    }

    pub fn run(&self) -> Option<&StepRun> {
        self.run.as_ref()
    }

    /// Copia del step con el estado de ejecución descartado.
    pub(crate) fn reset(self) -> Self {
        Self { index: None,
               run: None,
               ..self }
    }

    /// Ejecuta la función con los argumentos ya resueltos y valida el
    /// resultado. No modifica `self`: el engine guarda el `StepRun`.
    ///
    /// `elapsed_ms` mide sólo la invocación. Un panic dentro de la función se
    /// registra como fallo `exception`.
    pub(crate) fn execute(&self, args: Vec<Value>, registry: &SchemaRegistry) -> StepRun {
        let started = Instant::now();
        let invoked = panic::catch_unwind(AssertUnwindSafe(|| self.function.call(&args)));
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match invoked {
            Err(payload) => StepOutcome::Failure(Failure::Exception { error: StepError::from_panic(payload) }),
            Ok(Err(error)) => StepOutcome::Failure(Failure::Exception { error }),
            Ok(Ok(value)) => self.check_output(value, registry),
        };

        StepRun { resolved_args: args,
                  elapsed_ms,
                  outcome }
    }

    fn check_output(&self, value: Value, registry: &SchemaRegistry) -> StepOutcome {
        let schema = match self.schema.resolve(registry) {
            Ok(Some(schema)) => schema,
            Ok(None) => return StepOutcome::Success(value),
            Err(name) => {
                let error = StepError::new(format!("unknown schema '{name}'"));
                return StepOutcome::Failure(Failure::Exception { error });
            }
        };
        let ctx = ValidationContext { step_name: &self.name,
                                      step_index: self.index.unwrap_or_default(),
                                      registry };
        if self.validator.is_valid(&ctx, schema, &value) {
            StepOutcome::Success(value)
        } else {
            let explanation = self.validator.explain(&ctx, schema, &value);
            StepOutcome::Failure(Failure::InvalidOutput { value, explanation })
        }
    }

    /// Forma del step sin la función ni el validador (para hashing/reportes).
    pub fn shape_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "kind": self.kind,
            "arity": self.function.arity(),
            "inputs": self.inputs,
            "output": self.output,
            "schema": self.schema,
            "bindings": self.bindings,
            "index": self.index,
        })
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
        && self.kind == other.kind
        && self.function == other.function
        && self.inputs == other.inputs
        && self.output == other.output
        && self.schema == other.schema
        && self.bindings == other.bindings
        && same_validator(&self.validator, &other.validator)
        && self.index == other.index
        && self.run == other.run
    }
}
