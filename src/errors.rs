//! Errores de la capa de aplicación.

use pipeflow_core::{BuildError, RunError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pipeline inválido: {0}")]
    Build(#[from] BuildError),
    #[error("Run rechazado: {0}")]
    Run(#[from] RunError),
    #[error("Error de serialización: {0}")]
    Serde(#[from] serde_json::Error),
}
