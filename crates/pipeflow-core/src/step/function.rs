//! Tipo funcional estrecho para las funciones de los steps.
//!
//! Todas las funciones reciben los argumentos resueltos como slice, en el
//! orden de los input paths, y declaran su aridad. La aridad se comprueba al
//! construir el pipeline y otra vez al invocar.

use std::fmt;
use std::sync::Arc;

use crate::errors::StepError;
use crate::value::Value;

pub type StepResult = Result<Value, StepError>;

type DynStepFn = dyn Fn(&[Value]) -> StepResult + Send + Sync;

#[derive(Clone)]
pub struct StepFn {
    arity: usize,
    func: Arc<DynStepFn>,
}

impl StepFn {
    pub fn new<F>(arity: usize, f: F) -> Self
        where F: Fn(&[Value]) -> StepResult + Send + Sync + 'static
    {
        Self { arity,
               func: Arc::new(f) }
    }

    pub fn nullary<F>(f: F) -> Self
        where F: Fn() -> StepResult + Send + Sync + 'static
    {
        Self::new(0, move |_| f())
    }

    pub fn unary<F>(f: F) -> Self
        where F: Fn(&Value) -> StepResult + Send + Sync + 'static
    {
        Self::new(1, move |args| f(&args[0]))
    }

    pub fn binary<F>(f: F) -> Self
        where F: Fn(&Value, &Value) -> StepResult + Send + Sync + 'static
    {
        Self::new(2, move |args| f(&args[0], &args[1]))
    }

    pub fn ternary<F>(f: F) -> Self
        where F: Fn(&Value, &Value, &Value) -> StepResult + Send + Sync + 'static
    {
        Self::new(3, move |args| f(&args[0], &args[1], &args[2]))
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoca la función. Un número de argumentos distinto de la aridad se
    /// reporta como `StepError` sin llegar a llamarla.
    pub fn call(&self, args: &[Value]) -> StepResult {
        if args.len() != self.arity {
            return Err(StepError::new(format!("arity mismatch: expected {} arguments, got {}",
                                              self.arity,
                                              args.len())));
        }
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &StepFn) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.func) as *const (), Arc::as_ptr(&other.func) as *const ())
    }
}

impl PartialEq for StepFn {
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity && self.ptr_eq(other)
    }
}

impl fmt::Debug for StepFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepFn(arity={})", self.arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_checks_arity_before_invoking() {
        let add = StepFn::binary(|a, b| Ok(Value::from(a.try_i64()? + b.try_i64()?)));
        assert_eq!(add.call(&[Value::from(2), Value::from(3)]), Ok(Value::from(5)));
        let err = add.call(&[Value::from(2)]).unwrap_err();
        assert_eq!(err.message, "arity mismatch: expected 2 arguments, got 1");
    }

    #[test]
    fn clones_share_identity() {
        let f = StepFn::nullary(|| Ok(Value::null()));
        let g = StepFn::nullary(|| Ok(Value::null()));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }
}
