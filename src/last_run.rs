//! Registro opcional del último pipeline ejecutado.
//!
//! El engine nunca lo consulta: es el llamador quien decide guardar (o no)
//! cada resultado. Útil en sesiones interactivas para inspeccionar el
//! último run sin tener que retener el valor a mano.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use pipeflow_core::{run, Pipeline, RunError, RunOptions, State};

/// Registro compartible (clonar comparte el mismo contenido).
#[derive(Debug, Clone, Default)]
pub struct LastRun {
    inner: Arc<Mutex<Option<Pipeline>>>,
}

impl LastRun {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Pipeline>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Guarda `pipeline` sustituyendo el anterior.
    pub fn record(&self, pipeline: Pipeline) {
        *self.slot() = Some(pipeline);
    }

    /// Copia del último pipeline registrado.
    pub fn get(&self) -> Option<Pipeline> {
        self.slot().clone()
    }

    pub fn take(&self) -> Option<Pipeline> {
        self.slot().take()
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }
}

/// Ejecuta el pipeline y registra el resultado en `register`.
///
/// Un run rechazado (`Err`) no modifica el registro.
pub fn run_recorded(register: &LastRun, pipeline: &Pipeline, args: State, options: &RunOptions)
                    -> Result<Pipeline, RunError> {
    let finished = run(pipeline, args, options)?;
    register.record(finished.clone());
    debug!("last run recorded ({} steps)", finished.len());
    Ok(finished)
}
