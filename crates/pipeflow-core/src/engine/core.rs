//! Implementación del run completo.

use super::cursor::StepCursor;
use super::options::RunOptions;
use crate::errors::RunError;
use crate::pipeline::Pipeline;
use crate::value::State;

/// Ejecuta `pipeline` contra `args` y devuelve una copia terminada.
///
/// Sólo devuelve `Err` ante violaciones de contrato (pipeline inválido,
/// esquema con nombre inexistente). Los fallos de los steps quedan
/// registrados en el pipeline devuelto.
///
/// Con `allow_async_args`, esperar un `Deferred` bloquea el hilo que llama.
/// Dentro de un runtime de tokio la espera se hace en un hilo auxiliar, así
/// que el run no hace panic, pero sí ocupa el worker hasta que el valor llega.
pub fn run(pipeline: &Pipeline, args: State, options: &RunOptions) -> Result<Pipeline, RunError> {
    Ok(StepCursor::start(pipeline, args, options)?.finish())
}

/// Engine con opciones fijas, reutilizable entre runs.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: RunOptions,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn run(&self, pipeline: &Pipeline, args: State) -> Result<Pipeline, RunError> {
        run(pipeline, args, &self.options)
    }

    /// Cursor para avanzar el run paso a paso.
    pub fn cursor(&self, pipeline: &Pipeline, args: State) -> Result<StepCursor<'_>, RunError> {
        StepCursor::start(pipeline, args, &self.options)
    }
}

impl Pipeline {
    /// Atajo de `engine::run`.
    pub fn run(&self, args: State, options: &RunOptions) -> Result<Pipeline, RunError> {
        run(self, args, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::Deferred;
    use crate::engine::BindingPrecedence;
    use crate::errors::{BuildError, StepError};
    use crate::introspect::Inspect;
    use crate::path::Path;
    use crate::pipeline::make;
    use crate::step::{FailureReason, Step, StepFn, StepStatus};
    use crate::value::Value;
    use crate::bindings;
    use serde_json::json;

    fn echo(name: &str, input: &str, output: &str) -> Step {
        Step::transformation(name, StepFn::unary(|v| Ok(v.clone())), [input]).with_output(output)
    }

    #[test]
    fn cursor_advances_one_step_at_a_time() {
        let p = make(bindings! {}, vec![echo("a", "x", "y"), echo("b", "y", "z")]).unwrap();
        let engine = Engine::new();
        let mut cursor = engine.cursor(&p, bindings! { "x" => 1 }).unwrap();

        assert_eq!(cursor.next_step(), Some(StepStatus::Successful));
        assert_eq!(cursor.state().get("y"), Some(&Value::from(1)));
        assert!(cursor.state().get("z").is_none());
        assert!(!cursor.is_finished());

        assert_eq!(cursor.next_step(), Some(StepStatus::Successful));
        assert!(cursor.is_finished());
        assert_eq!(cursor.next_step(), None);

        let finished = cursor.finish();
        assert!(finished.is_successful());
        assert_eq!(finished.result(), Ok(&Value::from(1)));
    }

    #[test]
    fn template_is_left_untouched() {
        let p = make(bindings! {}, vec![echo("a", "x", "y")]).unwrap();
        let before = p.clone();
        let done = p.run(bindings! { "x" => 1 }, &RunOptions::new()).unwrap();
        assert_eq!(p, before);
        assert!(p.is_not_started());
        assert!(done.is_successful());
    }

    #[test]
    fn running_a_finished_pipeline_is_rejected() {
        let p = make(bindings! {}, vec![echo("a", "x", "y")]).unwrap();
        let done = run(&p, bindings! {}, &RunOptions::new()).unwrap();
        let err = run(&done, bindings! {}, &RunOptions::new()).unwrap_err();
        assert_eq!(err,
                   RunError::Invalid(BuildError::NotATemplate { name: "a".into(),
                                                                index: 0 }));
    }

    #[test]
    fn missing_named_schema_is_fatal_before_any_step_runs() {
        let s = echo("a", "x", "y").with_schema_ref("later");
        let p = make(bindings! {}, [s]).unwrap();
        let err = run(&p, bindings! {}, &RunOptions::new()).unwrap_err();
        assert_eq!(err,
                   RunError::UnknownSchema { step: "a".into(),
                                             name: "later".into() });

        let opts = RunOptions::new().with_schema("later", json!("integer"));
        let done = run(&p, bindings! { "x" => 3 }, &opts).unwrap();
        assert!(done.is_successful());
    }

    #[test]
    fn args_win_precedence_only_fills_missing_keys() {
        let s = Step::action("read", StepFn::unary(|v| Ok(v.clone())), ["url"]).with_binding("url", "B");
        let p = make(bindings! {}, [s]).unwrap();

        let opts = RunOptions::new().with_precedence(BindingPrecedence::ArgsWin);
        let done = run(&p, bindings! { "url" => "C" }, &opts).unwrap();
        assert_eq!(done.step("read").unwrap().resolved_args(), Some(&[Value::from("C")][..]));

        let done = run(&p, bindings! {}, &opts).unwrap();
        assert_eq!(done.step("read").unwrap().resolved_args(), Some(&[Value::from("B")][..]));
    }

    #[test]
    fn missing_inputs_resolve_to_null() {
        let s = Step::action("read", StepFn::unary(|v| Ok(Value::from(v.is_null()))), [Path::from("absent")]);
        let p = make(bindings! {}, [s]).unwrap();
        let done = run(&p, bindings! {}, &RunOptions::new()).unwrap();
        assert_eq!(done.result(), Ok(&Value::from(true)));
    }

    #[test]
    fn failed_deferred_argument_fails_the_dependent_step() {
        let producer = Step::action("produce",
                                    StepFn::nullary(|| Ok(Value::from(Deferred::spawn(|| Err(StepError::new("upstream down")))))),
                                    Vec::<Path>::new()).with_output("d");
        let consumer = echo("consume", "d", "out");
        let p = make(bindings! {}, vec![producer, consumer]).unwrap();
        let done = run(&p, bindings! {}, &RunOptions::new().with_async_args(true)).unwrap();

        let failed = done.failed_step().unwrap();
        assert_eq!(failed.name(), "consume");
        assert_eq!(failed.failure_reason(), Some(FailureReason::Exception));
        assert_eq!(failed.failure_message().as_deref(), Some("upstream down"));
        assert_eq!(done.failure_message().as_deref(), Some("upstream down"));
    }

    #[test]
    fn empty_pipeline_runs_successfully() {
        let p = make(bindings! {}, Vec::<Step>::new()).unwrap();
        let done = run(&p, bindings! { "x" => 1 }, &RunOptions::new()).unwrap();
        assert!(done.is_successful());
        assert_eq!(done.summary().and_then(|s| s.last_step), None);
        assert_eq!(done.final_state().and_then(|s| s.get("x")), Some(&Value::from(1)));
    }
}
