use serde::{Deserialize, Serialize};
use serde_json::json;

use super::StepStatus;
use crate::errors::StepError;
use crate::validation::Diagnostic;
use crate::value::Value;

/// Motivo de fallo de un step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// La función devolvió un valor que el esquema rechazó.
    InvalidOutput,
    /// La función falló (devolvió `Err` o hizo panic).
    Exception,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidOutput => "invalid-output",
            FailureReason::Exception => "exception",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    InvalidOutput { value: Value, explanation: Diagnostic },
    Exception { error: StepError },
}

impl Failure {
    pub fn reason(&self) -> FailureReason {
        match self {
            Failure::InvalidOutput { .. } => FailureReason::InvalidOutput,
            Failure::Exception { .. } => FailureReason::Exception,
        }
    }

    /// Valor asociado al fallo: el resultado rechazado, o el error lanzado
    /// (`{"message": .., "data": ..}`).
    pub fn value(&self) -> Value {
        match self {
            Failure::InvalidOutput { value, .. } => value.clone(),
            Failure::Exception { error } => Value::Json(error.to_json()),
        }
    }

    /// Texto del fallo: el mensaje del error, o el diagnóstico de `explain`.
    pub fn message(&self) -> String {
        match self {
            Failure::InvalidOutput { explanation, .. } => match explanation {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            Failure::Exception { error } => error.message.clone(),
        }
    }

    pub fn explanation(&self) -> Option<&Diagnostic> {
        match self {
            Failure::InvalidOutput { explanation, .. } => Some(explanation),
            Failure::Exception { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            Failure::Exception { error } => Some(error),
            Failure::InvalidOutput { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "reason": self.reason().as_str(),
            "value": self.value().to_json(),
            "message": self.message(),
        })
    }
}

/// Resultado abstracto de ejecutar un step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Success(Value),
    Failure(Failure),
}

impl StepOutcome {
    pub fn status(&self) -> StepStatus {
        match self {
            StepOutcome::Success(_) => StepStatus::Successful,
            StepOutcome::Failure(_) => StepStatus::Failed,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            StepOutcome::Success(v) => Some(v),
            StepOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            StepOutcome::Failure(f) => Some(f),
            StepOutcome::Success(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            StepOutcome::Success(v) => json!({ "result": v.to_json() }),
            StepOutcome::Failure(f) => json!({ "failure": f.to_json() }),
        }
    }
}

/// Registro post-ejecución de un step.
///
/// `elapsed_ms` cubre sólo la invocación de la función y no participa en la
/// igualdad: dos runs deterministas producen registros iguales.
#[derive(Debug, Clone)]
pub struct StepRun {
    pub resolved_args: Vec<Value>,
    pub elapsed_ms: f64,
    pub outcome: StepOutcome,
}

impl PartialEq for StepRun {
    fn eq(&self, other: &Self) -> bool {
        self.resolved_args == other.resolved_args && self.outcome == other.outcome
    }
}

impl StepRun {
    pub fn status(&self) -> StepStatus {
        self.outcome.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_failure_carries_message_and_payload() {
        let f = Failure::Exception { error: StepError::new("Problem!").with_data(json!({"some": "problem"})) };
        assert_eq!(f.reason(), FailureReason::Exception);
        assert_eq!(f.message(), "Problem!");
        assert_eq!(f.value().to_json()["data"], json!({"some": "problem"}));
    }

    #[test]
    fn invalid_output_message_is_the_diagnostic() {
        let f = Failure::InvalidOutput { value: Value::from("oops"),
                                         explanation: json!({"errors": ["expected integer"]}) };
        assert_eq!(f.value(), Value::from("oops"));
        assert_eq!(f.message(), r#"{"errors":["expected integer"]}"#);
    }

    #[test]
    fn timing_does_not_affect_equality() {
        let a = StepRun { resolved_args: vec![Value::from(1)],
                          elapsed_ms: 0.4,
                          outcome: StepOutcome::Success(Value::from(2)) };
        let b = StepRun { elapsed_ms: 12.0,
                          ..a.clone() };
        assert_eq!(a, b);
    }
}
