//! pipeflow-core: ejecutor secuencial y declarativo de pipelines.
//!
//! Un pipeline es una lista ordenada de steps con nombre. Cada step lee sus
//! argumentos del estado compartido mediante paths, ejecuta una función
//! opaca, valida opcionalmente el resultado contra un esquema y lo escribe
//! de vuelta en el estado. El run se detiene en el primer fallo.
//!
//! ```
//! use pipeflow_core::{bindings, make, run, Inspect, RunOptions, Step, StepFn, Value};
//!
//! let copy = Step::action("copy", StepFn::unary(|x| Ok(x.clone())), ["x"]).with_output("y");
//! let inc = Step::transformation("inc", StepFn::unary(|y| Ok(Value::from(y.try_i64()? + 1))), ["y"])
//!     .with_output("z");
//!
//! let pipeline = make(bindings! {}, vec![copy, inc]).unwrap();
//! let done = run(&pipeline, bindings! { "x" => 5 }, &RunOptions::default()).unwrap();
//!
//! assert!(done.is_successful());
//! assert_eq!(done.result(), Ok(&Value::from(6)));
//! ```

pub mod constants;
pub mod deferred;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod introspect;
pub mod macros;
pub mod path;
pub mod pipeline;
pub mod step;
pub mod validation;
pub mod value;

pub use deferred::{Deferred, Resolver};
pub use engine::{run, BindingPrecedence, Engine, RunOptions, StepCursor};
pub use errors::{BuildError, IntrospectError, PathError, RunError, StepError};
pub use introspect::{Inspect, StepRef};
pub use path::{Path, Segment};
pub use pipeline::{make, Item, Pipeline, PipelineBuilder, RunSummary};
pub use step::{action, transformation, Failure, FailureReason, Step, StepFn, StepKind, StepOutcome, StepResult,
               StepRun, StepStatus};
pub use validation::{default_validator, BasicValidator, Diagnostic, OutputSchema, Schema, SchemaRegistry,
                     ValidationContext, Validator};
pub use value::{Bindings, Map, State, Value};
