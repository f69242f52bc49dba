//! Resolución de paths sobre el estado compartido.
//!
//! Un `Path` es una secuencia de claves/índices. `get` desciende por mapas y
//! secuencias; `set` devuelve un estado nuevo (copy-on-write) sin tocar el
//! del caller, creando contenedores intermedios cuando faltan.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PathError, StepError};
use crate::value::{Map, State, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Clave con la que el segmento direcciona el mapa raíz del estado.
    fn root_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(k: &str) -> Self {
        Segment::Key(k.to_string())
    }
}

impl From<String> for Segment {
    fn from(k: String) -> Self {
        Segment::Key(k)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for Path {
    fn from(k: &str) -> Self {
        Self(vec![k.into()])
    }
}

impl From<String> for Path {
    fn from(k: String) -> Self {
        Self(vec![k.into()])
    }
}

impl From<usize> for Path {
    fn from(i: usize) -> Self {
        Self(vec![i.into()])
    }
}

impl From<Segment> for Path {
    fn from(s: Segment) -> Self {
        Self(vec![s])
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl From<Vec<&str>> for Path {
    fn from(keys: Vec<&str>) -> Self {
        Self(keys.into_iter().map(Segment::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.into_iter().map(Segment::from).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Key(k) if i > 0 => write!(f, ".{k}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

/// Lee el valor en `path`.
///
/// Con `await_deferred` activo, cualquier `Deferred` encontrado (intermedio
/// o final) se espera y el descenso continúa con su resultado; el único
/// `Err` posible es el de un diferido que falló. Sin la opción, un diferido
/// final se devuelve tal cual y uno intermedio corta el descenso.
///
/// Un path vacío devuelve el estado completo.
pub fn get(state: &State, path: &Path, await_deferred: bool) -> Result<Option<Value>, StepError> {
    let Some((first, rest)) = path.segments().split_first() else {
        return Ok(Some(Value::Map(state.clone())));
    };
    let Some(mut current) = state.get(&first.root_key()).cloned() else {
        return Ok(None);
    };
    for segment in rest {
        current = settle(current, await_deferred)?;
        match child(&current, segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    settle(current, await_deferred).map(Some)
}

/// Escribe `value` en `path` y devuelve el estado resultante.
pub fn set(state: &State, path: &Path, value: Value) -> Result<State, PathError> {
    let (first, rest) = path.segments().split_first().ok_or(PathError::Empty)?;
    let key = first.root_key();
    let updated = assoc_in(state.get(&key), rest, value);
    let mut next = state.clone();
    next.insert(key, updated);
    Ok(next)
}

fn settle(mut value: Value, await_deferred: bool) -> Result<Value, StepError> {
    if !await_deferred {
        return Ok(value);
    }
    while let Value::Deferred(d) = value {
        value = d.wait()?;
    }
    Ok(value)
}

fn child(value: &Value, segment: &Segment) -> Option<Value> {
    match (value, segment) {
        (Value::Map(m), Segment::Key(k)) => m.get(k).cloned(),
        (Value::Json(serde_json::Value::Object(o)), Segment::Key(k)) => o.get(k).cloned().map(Value::Json),
        (Value::Seq(items), Segment::Index(i)) => items.get(*i).cloned(),
        (Value::Json(serde_json::Value::Array(a)), Segment::Index(i)) => a.get(*i).cloned().map(Value::Json),
        _ => None,
    }
}

fn assoc_in(current: Option<&Value>, rest: &[Segment], value: Value) -> Value {
    let Some((segment, rest)) = rest.split_first() else {
        return value;
    };
    match segment {
        Segment::Key(k) => {
            let mut map = current.and_then(as_map).unwrap_or_default();
            let child = assoc_in(map.get(k), rest, value);
            map.insert(k.clone(), child);
            Value::Map(map)
        }
        Segment::Index(i) => {
            let mut items = current.and_then(as_seq).unwrap_or_default();
            if items.len() <= *i {
                items.resize(i + 1, Value::null());
            }
            let child = assoc_in(items.get(*i), rest, value);
            items[*i] = child;
            Value::Seq(items)
        }
    }
}

fn as_map(value: &Value) -> Option<Map> {
    match value {
        Value::Map(m) => Some(m.clone()),
        Value::Json(serde_json::Value::Object(o)) => {
            Some(o.iter().map(|(k, v)| (k.clone(), Value::Json(v.clone()))).collect())
        }
        _ => None,
    }
}

fn as_seq(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Seq(items) => Some(items.clone()),
        Value::Json(serde_json::Value::Array(a)) => Some(a.iter().cloned().map(Value::Json).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::Deferred;
    use crate::{bindings, path};
    use serde_json::json;

    #[test]
    fn get_descends_into_json_and_containers() {
        let state = bindings! { "user" => json!({"tags": ["a", "b"], "name": "ana"}) };
        assert_eq!(get(&state, &path!["user", "tags", 1], false).unwrap(), Some(Value::from("b")));
        assert_eq!(get(&state, &path!["user", "name"], false).unwrap(), Some(Value::from("ana")));
        assert_eq!(get(&state, &path!["user", "missing"], false).unwrap(), None);
        assert_eq!(get(&state, &path!["user", "name", "deeper"], false).unwrap(), None);
        assert_eq!(get(&state, &Path::from("nope"), false).unwrap(), None);
    }

    #[test]
    fn set_is_copy_on_write() {
        let state = bindings! { "x" => 1 };
        let next = set(&state, &path!["a", "b"], Value::from(2)).unwrap();
        assert_eq!(state.len(), 1);
        assert!(state.get("a").is_none());
        assert_eq!(get(&next, &path!["a", "b"], false).unwrap(), Some(Value::from(2)));
        assert_eq!(next.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn set_creates_sequences_for_index_segments_and_pads() {
        let next = set(&State::new(), &path!["items", 2], Value::from("c")).unwrap();
        assert_eq!(next["items"].to_json(), json!([null, null, "c"]));
    }

    #[test]
    fn set_updates_inside_existing_json_object() {
        let state = bindings! { "cfg" => json!({"keep": 1, "url": "a"}) };
        let next = set(&state, &path!["cfg", "url"], Value::from("b")).unwrap();
        assert_eq!(next["cfg"].to_json(), json!({"keep": 1, "url": "b"}));
    }

    #[test]
    fn set_rejects_empty_path() {
        assert_eq!(set(&State::new(), &Path::default(), Value::null()), Err(PathError::Empty));
    }

    #[test]
    fn deferred_values_pass_through_unless_awaited() {
        let d = Deferred::ready(json!({"rate": 1.5}));
        let state = bindings! { "fx" => d.clone() };

        assert_eq!(get(&state, &Path::from("fx"), false).unwrap(), Some(Value::Deferred(d.clone())));
        assert_eq!(get(&state, &path!["fx", "rate"], false).unwrap(), None);

        assert_eq!(get(&state, &Path::from("fx"), true).unwrap(), Some(Value::from(json!({"rate": 1.5}))));
        assert_eq!(get(&state, &path!["fx", "rate"], true).unwrap(), Some(Value::from(1.5)));
    }

    #[test]
    fn awaiting_a_failed_deferred_is_an_error() {
        let d = Deferred::spawn(|| Err(StepError::new("nope")));
        let state = bindings! { "d" => d };
        assert_eq!(get(&state, &Path::from("d"), true).unwrap_err().message, "nope");
    }

    #[test]
    fn display_renders_dotted_path() {
        assert_eq!(path!["a", 0, "b"].to_string(), "a[0].b");
    }
}
