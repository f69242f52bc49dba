//! Errores del core.
//!
//! Hay dos familias bien separadas:
//! - `StepError`: el error "lanzado" por la función de un step. Es un dato
//!   más del trace de ejecución; nunca escapa de `run`.
//! - `BuildError` / `RunError` / `PathError` / `IntrospectError`: violaciones
//!   de contrato que el caller recibe como `Err`.

use std::any::Any;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::step::StepStatus;

/// Error devuelto por la función opaca de un step.
///
/// `data` es un payload JSON arbitrario que viaja junto al mensaje y que el
/// engine conserva intacto en el `failure-value` del step.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct StepError {
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StepError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(),
               data: serde_json::Value::Null }
    }

    /// Adjunta un payload al error.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Envuelve cualquier error `Display` (io, parse, ...) conservando su texto.
    pub fn wrap<E: Display>(err: E) -> Self {
        Self::new(err.to_string())
    }

    /// Error usado cuando el productor de un valor diferido desaparece sin
    /// completarlo.
    pub fn abandoned() -> Self {
        Self::new("deferred value was abandoned before completion")
    }

    /// Convierte el payload de un `panic!` en un `StepError`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "step function panicked".to_string()
        };
        Self::new(message).with_data(json!({ "panic": true }))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({ "message": self.message, "data": self.data })
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Violaciones de forma detectadas al construir (o al entrar a `run`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("step #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("duplicate step name '{name}' at #{index} (already used by #{first})")]
    DuplicateName { name: String, index: usize, first: usize },
    #[error("step '{name}' (#{index}) declares an empty input path at position {position}")]
    EmptyInputPath { name: String, index: usize, position: usize },
    #[error("step '{name}' (#{index}) declares an empty output path")]
    EmptyOutputPath { name: String, index: usize },
    #[error("step '{name}' (#{index}) takes {expected} arguments but declares {actual} input paths")]
    ArityMismatch { name: String, index: usize, expected: usize, actual: usize },
    #[error("step '{name}' carries sequence index {found:?}, expected {expected}")]
    NonContiguousIndex { name: String, expected: usize, found: Option<usize> },
    #[error("step '{name}' (#{index}) already ran; pipelines must be run from a template")]
    NotATemplate { name: String, index: usize },
}

/// Errores fatales de `run`: el pipeline no llega a ejecutarse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("invalid pipeline: {0}")]
    Invalid(#[from] BuildError),
    #[error("step '{step}' references unknown schema '{name}'")]
    UnknownSchema { step: String, name: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must not be empty")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntrospectError {
    #[error("{entity} is not successful (status: {status})")]
    NotSuccessful { entity: String, status: StepStatus },
    #[error("pipeline has no steps, so it has no result")]
    NoSteps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_display_is_message() {
        let err = StepError::new("Problem!").with_data(json!({"some": "problem"}));
        assert_eq!(err.to_string(), "Problem!");
        assert_eq!(err.to_json()["data"], json!({"some": "problem"}));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let err = StepError::from_panic(Box::new("boom"));
        assert_eq!(err.message, "boom");
        let err = StepError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.message, "owned boom");
        let err = StepError::from_panic(Box::new(42_u8));
        assert_eq!(err.message, "step function panicked");
    }

    #[test]
    fn build_error_identifies_offending_step() {
        let err = BuildError::DuplicateName { name: "fetch".into(),
                                              index: 3,
                                              first: 1 };
        assert_eq!(err.to_string(), "duplicate step name 'fetch' at #3 (already used by #1)");
        let run: RunError = err.into();
        assert!(run.to_string().starts_with("invalid pipeline:"));
    }
}
