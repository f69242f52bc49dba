//! Ejecución secuencial de pipelines.
//!
//! Contiene el bucle de run (`run` / `Engine`), el cursor paso a paso y las
//! opciones del run.

pub mod core;
pub mod cursor;
pub mod options;

pub use self::core::{run, Engine};
pub use cursor::StepCursor;
pub use options::{BindingPrecedence, RunOptions};
