//! Macros utilitarias para declarar paths y mapas de valores.
//!
//! Exportadas en la raíz del crate:
//!   use pipeflow_core::{bindings, path};

/// Construye un `Path` a partir de claves (`&str`/`String`) e índices (`usize`).
///
/// ```
/// use pipeflow_core::path;
/// let p = path!["user", "emails", 0];
/// assert_eq!(p.to_string(), "user.emails[0]");
/// ```
#[macro_export]
macro_rules! path {
    ($($seg:expr),* $(,)?) => {
        $crate::path::Path::new(vec![$($crate::path::Segment::from($seg)),*])
    };
}

/// Construye un `Map` (bindings, args o estado) con `clave => valor`.
///
/// ```
/// use pipeflow_core::bindings;
/// let b = bindings! { "url" => "https://example.org", "retries" => 3 };
/// assert_eq!(b.len(), 2);
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::value::Map::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Map::new();
        $( map.insert(::std::string::String::from($key), $crate::value::Value::from($value)); )+
        map
    }};
}
