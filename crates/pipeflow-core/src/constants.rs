//! Constantes del motor core.
//!
//! `ENGINE_VERSION` participa en el cálculo de `definition_hash` y
//! `trace_fingerprint`: un cambio de versión invalida los hashes previos
//! aunque la definición y los datos no cambien.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en la semántica de ejecución.
pub const ENGINE_VERSION: &str = "P1.0";

/// Marcador de un `Deferred` en la vista JSON de un `Value`. Es el mismo
/// esté o no completado, de modo que validación, igualdad y fingerprints no
/// dependen del hilo productor.
pub const DEFERRED_HANDLE: &str = "handle";

/// Estados de un `Deferred` en su snapshot (reportes y depuración).
pub const DEFERRED_PENDING: &str = "pending";
pub const DEFERRED_READY: &str = "ready";
pub const DEFERRED_FAILED: &str = "failed";
