use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::step::{Failure, StepOutcome, StepStatus};
use crate::value::{State, Value};

/// Resumen a nivel pipeline de un run terminado.
///
/// Refleja el último step ejecutado (el de mayor índice que no quedó en
/// `NotStarted`). La igualdad ignora `run_id`, `started_at` y `elapsed_ms`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Duración total del run, en milisegundos.
    pub elapsed_ms: f64,
    pub status: StepStatus,
    /// Índice del último step ejecutado.
    pub last_step: Option<usize>,
    pub outcome: Option<StepOutcome>,
    /// Estado compartido al terminar el run.
    pub final_state: State,
}

impl RunSummary {
    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().and_then(StepOutcome::result)
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.outcome.as_ref().and_then(StepOutcome::failure)
    }
}

impl PartialEq for RunSummary {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
        && self.last_step == other.last_step
        && self.outcome == other.outcome
        && self.final_state == other.final_state
    }
}
