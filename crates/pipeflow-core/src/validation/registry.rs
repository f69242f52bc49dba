use indexmap::IndexMap;

use super::Schema;

/// Registro explícito de esquemas con nombre.
///
/// Se consulta al validar, de modo que un esquema puede registrarse después
/// de declarar el step que lo referencia.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> &mut Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Variante encadenable de `register`.
    pub fn with(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.register(name, schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}
