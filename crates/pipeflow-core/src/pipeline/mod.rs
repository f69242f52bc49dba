//! Pipeline: colección ordenada de steps más bindings a nivel pipeline.
//!
//! Un `Pipeline` recién construido es una plantilla inmutable. Cada run
//! produce una copia nueva completamente evaluada, de modo que la misma
//! plantilla puede ejecutarse muchas veces con args distintos.

pub mod builder;
pub mod summary;

use std::collections::HashMap;

use serde_json::json;

use crate::constants::ENGINE_VERSION;
use crate::errors::BuildError;
use crate::hashing::hash_value;
use crate::introspect::Inspect;
use crate::step::Step;
use crate::value::{Bindings, State};

pub use builder::{make, Item, PipelineBuilder};
pub use summary::RunSummary;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    pub(crate) steps: Vec<Step>,
    pub(crate) bindings: Bindings,
    pub(crate) args: Option<State>,
    pub(crate) summary: Option<RunSummary>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `true` si ningún step se ha ejecutado todavía.
    pub fn is_template(&self) -> bool {
        self.summary.is_none() && self.steps.iter().all(|s| s.run.is_none())
    }

    /// Comprueba los invariantes estructurales:
    /// - índices únicos y contiguos 0..n,
    /// - nombres no vacíos y únicos,
    /// - paths de entrada y salida no vacíos,
    /// - aridad de la función == número de input paths.
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(self.steps.len());
        for (position, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(BuildError::EmptyName { index: position });
            }
            if step.index != Some(position) {
                return Err(BuildError::NonContiguousIndex { name: step.name.clone(),
                                                            expected: position,
                                                            found: step.index });
            }
            if let Some(first) = seen.insert(step.name.as_str(), position) {
                return Err(BuildError::DuplicateName { name: step.name.clone(),
                                                       index: position,
                                                       first });
            }
            if let Some(input) = step.inputs.iter().position(|p| p.is_empty()) {
                return Err(BuildError::EmptyInputPath { name: step.name.clone(),
                                                        index: position,
                                                        position: input });
            }
            if step.output.as_ref().is_some_and(|p| p.is_empty()) {
                return Err(BuildError::EmptyOutputPath { name: step.name.clone(),
                                                         index: position });
            }
            if step.function.arity() != step.inputs.len() {
                return Err(BuildError::ArityMismatch { name: step.name.clone(),
                                                       index: position,
                                                       expected: step.function.arity(),
                                                       actual: step.inputs.len() });
            }
        }
        Ok(())
    }

    /// Hash de la forma del pipeline (nombres, tipos, paths, esquemas y
    /// bindings). No depende de cómo se compuso ni de los runs.
    pub fn definition_hash(&self) -> String {
        let shapes: Vec<serde_json::Value> = self.steps.iter().map(Step::shape_json).collect();
        hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "bindings": self.bindings,
            "steps": shapes,
        }))
    }

    /// Trace del run sin campos de tiempo ni identificadores.
    pub fn trace_json(&self) -> serde_json::Value {
        let steps: Vec<serde_json::Value> =
            self.steps
                .iter()
                .map(|s| {
                    json!({
                        "name": s.name,
                        "index": s.index,
                        "status": s.status(),
                        "resolved_args": s.run.as_ref().map(|r| r.resolved_args.clone()),
                        "outcome": s.run.as_ref().map(|r| r.outcome.to_json()),
                    })
                })
                .collect();
        json!({
            "definition_hash": self.definition_hash(),
            "args": self.args,
            "status": self.status(),
            "steps": steps,
        })
    }

    /// Fingerprint del trace: idéntico para runs deterministas repetidos.
    pub fn trace_fingerprint(&self) -> String {
        hash_value(&self.trace_json())
    }
}
