//! API de introspección: consultas puras sobre `Step` y `Pipeline`.
//!
//! El estado de un pipeline es un agregado de sus steps:
//! - `Failed` si algún step falló,
//! - `Successful` si todos terminaron bien (un pipeline vacío, sólo tras
//!   ejecutarse),
//! - `NotStarted` en otro caso.

use std::fmt;

use crate::errors::IntrospectError;
use crate::step::{Failure, FailureReason, Step, StepRun, StepStatus};
use crate::pipeline::{Pipeline, RunSummary};
use crate::value::{Bindings, State, Value};

/// Consultas comunes a steps y pipelines.
pub trait Inspect {
    fn status(&self) -> StepStatus;

    fn is_not_started(&self) -> bool {
        self.status() == StepStatus::NotStarted
    }

    fn is_successful(&self) -> bool {
        self.status() == StepStatus::Successful
    }

    fn is_failed(&self) -> bool {
        self.status() == StepStatus::Failed
    }

    /// Resultado de un step/pipeline exitoso.
    fn result(&self) -> Result<&Value, IntrospectError>;

    fn bindings(&self) -> &Bindings;
}

impl Inspect for Step {
    fn status(&self) -> StepStatus {
        self.run.as_ref().map_or(StepStatus::NotStarted, StepRun::status)
    }

    fn result(&self) -> Result<&Value, IntrospectError> {
        self.run
            .as_ref()
            .and_then(|r| r.outcome.result())
            .ok_or_else(|| IntrospectError::NotSuccessful { entity: format!("step '{}'", self.name),
                                                            status: self.status() })
    }

    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl Step {
    pub fn failure(&self) -> Option<&Failure> {
        self.run.as_ref().and_then(|r| r.outcome.failure())
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure().map(Failure::reason)
    }

    pub fn failure_value(&self) -> Option<Value> {
        self.failure().map(Failure::value)
    }

    pub fn failure_message(&self) -> Option<String> {
        self.failure().map(Failure::message)
    }

    pub fn resolved_args(&self) -> Option<&[Value]> {
        self.run.as_ref().map(|r| r.resolved_args.as_slice())
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.run.as_ref().map(|r| r.elapsed_ms)
    }
}

/// Referencia a un step por nombre o por índice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRef {
    Name(String),
    Index(usize),
}

impl From<&str> for StepRef {
    fn from(name: &str) -> Self {
        StepRef::Name(name.to_string())
    }
}

impl From<String> for StepRef {
    fn from(name: String) -> Self {
        StepRef::Name(name)
    }
}

impl From<usize> for StepRef {
    fn from(index: usize) -> Self {
        StepRef::Index(index)
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRef::Name(name) => write!(f, "'{name}'"),
            StepRef::Index(i) => write!(f, "#{i}"),
        }
    }
}

impl Inspect for Pipeline {
    fn status(&self) -> StepStatus {
        if self.steps.iter().any(Inspect::is_failed) {
            StepStatus::Failed
        } else if self.steps.is_empty() {
            if self.summary.is_some() {
                StepStatus::Successful
            } else {
                StepStatus::NotStarted
            }
        } else if self.steps.iter().all(Inspect::is_successful) {
            StepStatus::Successful
        } else {
            StepStatus::NotStarted
        }
    }

    /// Resultado del último step de un pipeline exitoso.
    fn result(&self) -> Result<&Value, IntrospectError> {
        let status = self.status();
        if status != StepStatus::Successful {
            return Err(IntrospectError::NotSuccessful { entity: "pipeline".to_string(),
                                                        status });
        }
        self.steps.last().ok_or(IntrospectError::NoSteps)?.result()
    }

    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl Pipeline {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, which: impl Into<StepRef>) -> Option<&Step> {
        match which.into() {
            StepRef::Name(name) => self.steps.iter().find(|s| s.name == name),
            StepRef::Index(i) => self.steps.get(i),
        }
    }

    /// Steps fallidos; con la parada en el primer fallo hay como mucho uno.
    pub fn failed_steps(&self) -> Vec<&Step> {
        self.steps.iter().filter(|s| s.is_failed()).collect()
    }

    pub fn failed_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.is_failed())
    }

    /// Args del último run; `None` si nunca se ha ejecutado.
    pub fn args(&self) -> Option<&State> {
        self.args.as_ref()
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn final_state(&self) -> Option<&State> {
        self.summary.as_ref().map(|s| &s.final_state)
    }

    /// Último step ejecutado en el run.
    pub fn last_executed_step(&self) -> Option<&Step> {
        self.steps.iter().rev().find(|s| s.run.is_some())
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.summary.as_ref().and_then(RunSummary::failure).map(Failure::reason)
    }

    pub fn failure_value(&self) -> Option<Value> {
        self.summary.as_ref().and_then(RunSummary::failure).map(Failure::value)
    }

    pub fn failure_message(&self) -> Option<String> {
        self.summary.as_ref().and_then(RunSummary::failure).map(Failure::message)
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings;
    use crate::path::Path;
    use crate::pipeline::make;
    use crate::step::StepFn;

    fn template() -> Pipeline {
        let a = Step::action("a", StepFn::nullary(|| Ok(Value::from(1))), Vec::<Path>::new());
        let b = Step::action("b", StepFn::nullary(|| Ok(Value::from(2))), Vec::<Path>::new());
        make(bindings! { "k" => "v" }, vec![a, b]).unwrap()
    }

    #[test]
    fn template_is_not_started_and_has_no_result() {
        let p = template();
        assert!(p.is_not_started());
        assert!(!p.is_successful());
        assert!(p.args().is_none());
        assert!(p.failed_step().is_none());
        let err = p.result().unwrap_err();
        assert_eq!(err,
                   IntrospectError::NotSuccessful { entity: "pipeline".into(),
                                                    status: StepStatus::NotStarted });
    }

    #[test]
    fn step_lookup_by_name_and_index() {
        let p = template();
        assert_eq!(p.step("b").map(Step::name), Some("b"));
        assert_eq!(p.step(0).map(Step::name), Some("a"));
        assert!(p.step("zzz").is_none());
        assert!(p.step(7).is_none());
    }

    #[test]
    fn step_failure_fields_are_absent_unless_failed() {
        let p = template();
        let a = p.step("a").unwrap();
        assert!(a.failure_reason().is_none());
        assert!(a.failure_message().is_none());
        assert_eq!(a.bindings().get("k"), Some(&Value::from("v")));
        assert!(a.result().is_err());
    }

    #[test]
    fn empty_pipeline_status_depends_on_having_run() {
        let p = Pipeline::default();
        assert!(p.is_not_started());
        assert_eq!(p.result().unwrap_err(),
                   IntrospectError::NotSuccessful { entity: "pipeline".into(),
                                                    status: StepStatus::NotStarted });
    }
}
