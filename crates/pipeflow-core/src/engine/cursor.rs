//! Cursor de ejecución paso a paso.
//!
//! Proporciona una API ergonómica para avanzar un run step a step
//! (`next_step`) o hasta el final (`run_to_completion`). `run` está
//! construido sobre él.

use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use super::options::{BindingPrecedence, RunOptions};
use crate::errors::{BuildError, RunError, StepError};
use crate::introspect::Inspect;
use crate::path;
use crate::pipeline::{Pipeline, RunSummary};
use crate::step::{Failure, Step, StepOutcome, StepRun, StepStatus};
use crate::validation::OutputSchema;
use crate::value::{Bindings, State, Value};

/// Run en curso sobre una copia de la plantilla.
pub struct StepCursor<'a> {
    options: &'a RunOptions,
    pipeline: Pipeline,
    state: State,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl<'a> StepCursor<'a> {
    /// Valida la plantilla y prepara el estado inicial
    /// (`bindings del pipeline` + `args`, ganan los args).
    pub fn start(template: &Pipeline, args: State, options: &'a RunOptions) -> Result<Self, RunError> {
        template.validate()?;
        if let Some(step) = template.steps.iter().find(|s| s.run.is_some()) {
            return Err(BuildError::NotATemplate { name: step.name.clone(),
                                                  index: step.index.unwrap_or_default() }.into());
        }
        for step in &template.steps {
            if let OutputSchema::Named(name) = &step.schema {
                if !options.schemas.contains(name) {
                    return Err(RunError::UnknownSchema { step: step.name.clone(),
                                                         name: name.clone() });
                }
            }
        }

        let mut state = template.bindings.clone();
        state.extend(args.clone());

        let mut pipeline = template.clone();
        pipeline.args = Some(args);
        pipeline.summary = None;

        let run_id = Uuid::new_v4();
        info!("run {run_id} started: {} steps (async args: {}, precedence: {})",
              pipeline.len(),
              options.allow_async_args,
              options.precedence);

        Ok(Self { options,
                  pipeline,
                  state,
                  run_id,
                  started_at: Utc::now(),
                  clock: Instant::now() })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Estado compartido actual.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.next_position().is_none()
    }

    /// Índice del próximo step pendiente; `None` tras un fallo o al terminar.
    fn next_position(&self) -> Option<usize> {
        if self.pipeline.steps.iter().any(Inspect::is_failed) {
            return None;
        }
        self.pipeline.steps.iter().position(|s| s.run.is_none())
    }

    /// Ejecuta el siguiente step pendiente y devuelve su estado final.
    pub fn next_step(&mut self) -> Option<StepStatus> {
        let position = self.next_position()?;
        let step = &self.pipeline.steps[position];

        merge_bindings(&mut self.state, &step.bindings, self.options.precedence);
        debug!("step '{}' (#{position}) started", step.name);

        let mut run = match resolve_args(&self.state, step, self.options.allow_async_args) {
            Ok(args) => step.execute(args, &self.options.schemas),
            Err((resolved_args, error)) => {
                StepRun { resolved_args,
                          elapsed_ms: 0.0,
                          outcome: StepOutcome::Failure(Failure::Exception { error }) }
            }
        };

        let written = match (&run.outcome, &step.output) {
            (StepOutcome::Success(value), Some(output)) => Some(path::set(&self.state, output, value.clone())),
            _ => None,
        };
        match written {
            Some(Ok(next)) => self.state = next,
            Some(Err(e)) => run.outcome = StepOutcome::Failure(Failure::Exception { error: StepError::wrap(e) }),
            None => {}
        }

        match run.outcome.failure() {
            None => debug!("step '{}' (#{position}) finished in {:.3} ms", step.name, run.elapsed_ms),
            Some(failure) => warn!("step '{}' (#{position}) failed ({}): {}",
                                   step.name,
                                   failure.reason().as_str(),
                                   failure.message()),
        }

        let status = run.status();
        self.pipeline.steps[position].run = Some(run);
        Some(status)
    }

    /// Ejecuta steps hasta terminar o hasta el primer fallo.
    pub fn run_to_completion(&mut self) {
        while self.next_step().is_some() {}
    }

    /// Completa el run (si quedaba algo) y devuelve el pipeline terminado con
    /// su resumen.
    pub fn finish(mut self) -> Pipeline {
        self.run_to_completion();

        let last_step = self.pipeline.steps.iter().rposition(|s| s.run.is_some());
        let outcome = last_step.and_then(|i| self.pipeline.steps[i].run.as_ref())
                               .map(|r| r.outcome.clone());
        let status = if self.pipeline.steps.iter().any(Inspect::is_failed) {
            StepStatus::Failed
        } else {
            StepStatus::Successful
        };
        let elapsed_ms = self.clock.elapsed().as_secs_f64() * 1000.0;

        info!("run {} finished: {status} in {elapsed_ms:.3} ms", self.run_id);

        self.pipeline.summary = Some(RunSummary { run_id: self.run_id,
                                                  started_at: self.started_at,
                                                  elapsed_ms,
                                                  status,
                                                  last_step,
                                                  outcome,
                                                  final_state: self.state });
        self.pipeline
    }
}

fn merge_bindings(state: &mut State, bindings: &Bindings, precedence: BindingPrecedence) {
    match precedence {
        BindingPrecedence::StepBindingsWin => {
            for (k, v) in bindings {
                state.insert(k.clone(), v.clone());
            }
        }
        BindingPrecedence::ArgsWin => {
            for (k, v) in bindings {
                state.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
    }
}

/// Resuelve los input paths en orden. Un path ausente se pasa como null.
/// Si un diferido esperado falla, devuelve los args resueltos hasta ese punto.
fn resolve_args(state: &State, step: &Step, await_deferred: bool) -> Result<Vec<Value>, (Vec<Value>, StepError)> {
    let mut args = Vec::with_capacity(step.inputs.len());
    for input in &step.inputs {
        match path::get(state, input, await_deferred) {
            Ok(value) => args.push(value.unwrap_or_else(Value::null)),
            Err(error) => return Err((args, error)),
        }
    }
    Ok(args)
}
