//! pipeflow
//!
//! Capa de aplicación sobre `pipeflow-core`:
//! - `config`: configuración desde el entorno (`.env`) y `RunOptions` derivadas.
//! - `errors`: errores de la aplicación.
//! - `last_run`: registro opcional del último pipeline ejecutado.
//! - `report`: reportes en texto y JSON.

pub mod config;
pub mod errors;
pub mod last_run;
pub mod report;

pub use config::{AppConfig, ReportFormat, CONFIG};
pub use errors::AppError;
pub use last_run::{run_recorded, LastRun};
