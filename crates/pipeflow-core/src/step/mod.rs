//! Step: unidad atómica con nombre, función, paths de entrada/salida,
//! esquema opcional, bindings y resultado de ejecución.

pub mod definition;
pub mod function;
pub mod run_result;
pub mod status;

pub use definition::{action, transformation, Step, StepKind};
pub use function::{StepFn, StepResult};
pub use run_result::{Failure, FailureReason, StepOutcome, StepRun};
pub use status::StepStatus;
