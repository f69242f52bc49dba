//! Valores diferidos: handles cuyo resultado estará disponible más tarde.
//!
//! Un step puede devolver un `Deferred` como resultado; si la ejecución se
//! lanza con `allow_async_args`, el resolver de paths espera (bloqueando el
//! hilo del engine) a que se complete antes de pasarlo al step dependiente.
//!
//! La espera no tiene timeout ni cancelación: un diferido que nunca se
//! completa bloquea el run indefinidamente. Si el `Resolver` se destruye sin
//! completar, la espera termina con `StepError::abandoned()`.
//!
//! Dentro de un runtime de tokio la espera se hace en un hilo auxiliar sin
//! contexto de runtime; el hilo que llama sigue bloqueado igualmente.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::constants::{DEFERRED_FAILED, DEFERRED_PENDING, DEFERRED_READY};
use crate::errors::StepError;
use crate::value::Value;

type Outcome = Result<Value, StepError>;

enum Slot {
    Pending(oneshot::Receiver<Outcome>),
    Ready(Outcome),
}

/// Handle compartido (barato de clonar) hacia un resultado futuro.
///
/// Todas las copias ven el mismo resultado: el primero que espera consume el
/// canal y memoriza el `Outcome`.
#[derive(Clone)]
pub struct Deferred {
    inner: Arc<Mutex<Slot>>,
}

/// Extremo productor de un `Deferred`.
#[derive(Debug)]
pub struct Resolver {
    tx: oneshot::Sender<Outcome>,
}

impl Resolver {
    pub fn resolve(self, value: impl Into<Value>) {
        self.complete(Ok(value.into()));
    }

    pub fn fail(self, error: StepError) {
        self.complete(Err(error));
    }

    pub fn complete(self, outcome: Outcome) {
        // Si todas las copias del Deferred se descartaron nadie espera el valor.
        let _ = self.tx.send(outcome);
    }
}

impl Deferred {
    /// Crea un par productor/consumidor.
    pub fn channel() -> (Resolver, Deferred) {
        let (tx, rx) = oneshot::channel();
        (Resolver { tx }, Deferred { inner: Arc::new(Mutex::new(Slot::Pending(rx))) })
    }

    /// Diferido ya resuelto.
    pub fn ready(value: impl Into<Value>) -> Self {
        Deferred { inner: Arc::new(Mutex::new(Slot::Ready(Ok(value.into())))) }
    }

    /// Ejecuta `f` en un hilo del sistema y devuelve el handle de su resultado.
    pub fn spawn<F>(f: F) -> Self
        where F: FnOnce() -> Outcome + Send + 'static
    {
        let (resolver, deferred) = Self::channel();
        std::thread::spawn(move || resolver.complete(f()));
        deferred
    }

    /// Espera (sin límite) el resultado. Bloquea el hilo actual.
    pub fn wait(&self) -> Outcome {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *slot, Slot::Ready(Err(StepError::abandoned())));
        let outcome = match previous {
            Slot::Ready(outcome) => outcome,
            Slot::Pending(rx) => receive(rx),
        };
        *slot = Slot::Ready(outcome.clone());
        outcome
    }

    /// Consulta sin bloquear; `None` mientras siga pendiente.
    pub fn peek(&self) -> Option<Outcome> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let polled = match &mut *slot {
            Slot::Ready(outcome) => return Some(outcome.clone()),
            Slot::Pending(rx) => rx.try_recv(),
        };
        let outcome = match polled {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(StepError::abandoned()),
        };
        *slot = Slot::Ready(outcome.clone());
        Some(outcome)
    }

    pub fn is_ready(&self) -> bool {
        self.peek().is_some()
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Estado actual del diferido como JSON, sin bloquear. Depende de cuándo
    /// se consulte: sólo para reportes y depuración.
    pub fn snapshot(&self) -> serde_json::Value {
        match self.peek() {
            None => json!({ "deferred": DEFERRED_PENDING }),
            Some(Ok(value)) => json!({ "deferred": DEFERRED_READY, "value": value.to_snapshot_json() }),
            Some(Err(error)) => json!({ "deferred": DEFERRED_FAILED, "error": error.to_json() }),
        }
    }
}

/// `blocking_recv` hace panic en un hilo con contexto de tokio; en ese caso
/// se recibe desde un hilo auxiliar.
fn receive(rx: oneshot::Receiver<Outcome>) -> Outcome {
    let received = if Handle::try_current().is_ok() {
        thread::scope(|scope| scope.spawn(move || rx.blocking_recv()).join()).ok()
                                                                              .and_then(Result::ok)
    } else {
        rx.blocking_recv().ok()
    };
    received.unwrap_or_else(|| Err(StepError::abandoned()))
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            None => f.write_str("Deferred(pending)"),
            Some(Ok(value)) => write!(f, "Deferred(ready: {value:?})"),
            Some(Err(error)) => write!(f, "Deferred(failed: {error})"),
        }
    }
}
