use std::fmt;

use serde::{Deserialize, Serialize};

/// Estado de un Step (o agregado de un Pipeline).
///
/// Las transiciones válidas son:
/// - `NotStarted` -> `Successful`
/// - `NotStarted` -> `Failed`
///
/// Ambos estados finales son terminales: no hay reintentos ni reversión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Aún no se ha ejecutado en este run.
    NotStarted,
    /// La función devolvió un valor y, si había esquema, éste lo aceptó.
    Successful,
    /// La función falló o su resultado no pasó la validación.
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not-started",
            StepStatus::Successful => "successful",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::NotStarted)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
