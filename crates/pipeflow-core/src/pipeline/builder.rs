//! Composición de pipelines.
//!
//! `make` aplana steps, listas de steps y pipelines anidados en un único
//! `Pipeline`:
//! - el orden final es el orden de aparición,
//! - cada step recibe `sequence_index` = su posición (0..n),
//! - se descarta cualquier resultado de un run previo,
//! - los bindings de cada step se fusionan con los del argumento (gana el
//!   step); los bindings de un pipeline anidado se ignoran.
//!
//! Ejemplo:
//!
//! ```ignore
//! let pipeline = Pipeline::builder()
//!     .binding("currency", "EUR")
//!     .step(fetch)
//!     .pipeline(conversion)
//!     .build()?;
//! ```

use log::debug;

use super::Pipeline;
use crate::errors::BuildError;
use crate::step::Step;
use crate::value::{Bindings, Value};

/// Elemento aceptado por `make`.
#[derive(Debug, Clone)]
pub enum Item {
    Step(Step),
    Steps(Vec<Step>),
    Pipeline(Pipeline),
}

impl From<Step> for Item {
    fn from(s: Step) -> Self {
        Item::Step(s)
    }
}

impl From<Vec<Step>> for Item {
    fn from(v: Vec<Step>) -> Self {
        Item::Steps(v)
    }
}

impl From<Pipeline> for Item {
    fn from(p: Pipeline) -> Self {
        Item::Pipeline(p)
    }
}

/// Construye un pipeline a partir de `items` y valida sus invariantes.
pub fn make<I>(bindings: Bindings, items: I) -> Result<Pipeline, BuildError>
    where I: IntoIterator,
          I::Item: Into<Item>
{
    let mut flat: Vec<Step> = Vec::new();
    for item in items {
        match item.into() {
            Item::Step(step) => flat.push(step),
            Item::Steps(steps) => flat.extend(steps),
            Item::Pipeline(pipeline) => flat.extend(pipeline.steps),
        }
    }

    let steps = flat.into_iter()
                    .enumerate()
                    .map(|(index, step)| {
                        let mut step = step.reset();
                        let mut merged = bindings.clone();
                        merged.extend(std::mem::take(&mut step.bindings));
                        Step { index: Some(index),
                               bindings: merged,
                               ..step }
                    })
                    .collect();

    let pipeline = Pipeline { steps,
                              bindings,
                              args: None,
                              summary: None };
    pipeline.validate()?;
    debug!("pipeline built: {} steps, definition {}", pipeline.len(), pipeline.definition_hash());
    Ok(pipeline)
}

/// Builder fluido sobre `make`.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    bindings: Bindings,
    items: Vec<Item>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(mut self, bindings: Bindings) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn binding(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(key.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.items.push(Item::Step(step));
        self
    }

    pub fn steps<I>(mut self, steps: I) -> Self
        where I: IntoIterator<Item = Step>
    {
        self.items.push(Item::Steps(steps.into_iter().collect()));
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.items.push(Item::Pipeline(pipeline));
        self
    }

    pub fn item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn build(self) -> Result<Pipeline, BuildError> {
        make(self.bindings, self.items)
    }
}
