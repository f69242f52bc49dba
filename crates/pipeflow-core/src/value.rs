//! Valores heterogéneos que circulan por el estado compartido de un pipeline.
//!
//! El estado es un mapa ordenado (`IndexMap`) de claves a `Value`. Los datos
//! "planos" se guardan como `serde_json::Value`; los contenedores que crea el
//! resolver de paths son `Map`/`Seq`, y los handles asíncronos `Deferred`.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::constants::DEFERRED_HANDLE;
use crate::deferred::Deferred;
use crate::errors::StepError;

/// Mapa ordenado de claves a valores (estado, bindings, args).
pub type Map = IndexMap<String, Value>;

/// Estado compartido que fluye entre steps.
pub type State = Map;

/// Valores por defecto que se fusionan en el estado antes de un step.
pub type Bindings = Map;

#[derive(Debug, Clone)]
pub enum Value {
    Json(serde_json::Value),
    Map(Map),
    Seq(Vec<Value>),
    Deferred(Deferred),
}

impl Value {
    pub fn null() -> Self {
        Value::Json(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Json(serde_json::Value::Null))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Value::Deferred(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(serde_json::Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(serde_json::Value::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(serde_json::Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(serde_json::Value::as_bool)
    }

    /// Nombre corto del tipo, usado en mensajes de error.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Json(serde_json::Value::Null) => "null",
            Value::Json(serde_json::Value::Bool(_)) => "boolean",
            Value::Json(serde_json::Value::Number(n)) if n.is_f64() => "number",
            Value::Json(serde_json::Value::Number(_)) => "integer",
            Value::Json(serde_json::Value::String(_)) => "string",
            Value::Json(serde_json::Value::Array(_)) | Value::Seq(_) => "array",
            Value::Json(serde_json::Value::Object(_)) | Value::Map(_) => "object",
            Value::Deferred(_) => "deferred",
        }
    }

    pub fn try_i64(&self) -> Result<i64, StepError> {
        self.as_i64().ok_or_else(|| self.unexpected("integer"))
    }

    pub fn try_f64(&self) -> Result<f64, StepError> {
        self.as_f64().ok_or_else(|| self.unexpected("number"))
    }

    pub fn try_str(&self) -> Result<&str, StepError> {
        self.as_str().ok_or_else(|| self.unexpected("string"))
    }

    pub fn try_bool(&self) -> Result<bool, StepError> {
        self.as_bool().ok_or_else(|| self.unexpected("boolean"))
    }

    fn unexpected(&self, expected: &str) -> StepError {
        StepError::new(format!("expected {expected}, got {}", self.type_name()))
            .with_data(serde_json::json!({ "value": self.to_json() }))
    }

    /// Representación JSON del valor.
    ///
    /// Un `Deferred` se representa siempre como `{"deferred": "handle"}`,
    /// esté o no completado. Es la vista que usan validación, igualdad y
    /// hashing.
    pub fn to_json(&self) -> serde_json::Value {
        self.render(|_| serde_json::json!({ "deferred": DEFERRED_HANDLE }))
    }

    /// Como `to_json`, pero con el estado actual de cada diferido
    /// (`Deferred::snapshot`). Para reportes.
    pub fn to_snapshot_json(&self) -> serde_json::Value {
        self.render(Deferred::snapshot)
    }

    fn render(&self, deferred: fn(&Deferred) -> serde_json::Value) -> serde_json::Value {
        match self {
            Value::Json(v) => v.clone(),
            Value::Map(m) => serde_json::Value::Object(m.iter().map(|(k, v)| (k.clone(), v.render(deferred))).collect()),
            Value::Seq(items) => serde_json::Value::Array(items.iter().map(|v| v.render(deferred)).collect()),
            Value::Deferred(d) => deferred(d),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            (Value::Deferred(_), _) | (_, Value::Deferred(_)) => false,
            // Un Map creado por el resolver y un objeto JSON con el mismo
            // contenido son el mismo dato.
            (a, b) => a.to_json() == b.to_json(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Json(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Json(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Json(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Json(serde_json::Number::from_f64(v).map(serde_json::Value::Number)
                                                    .unwrap_or(serde_json::Value::Null))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Json(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Json(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Json(v.into())
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<Deferred> for Value {
    fn from(v: Deferred) -> Self {
        Value::Deferred(v)
    }
}
