//! Validador por defecto: un subconjunto pequeño de JSON Schema.
//!
//! Soporta:
//! - un string como atajo de tipo (`"integer"`),
//! - `{"type": ..}` con `integer|number|string|boolean|null|array|object|any`,
//! - `enum`, `required`, `properties` e `items`,
//! - `true` (acepta cualquier valor).
//!
//! Un esquema con forma desconocida nunca valida. Un `Deferred` sólo pasa
//! `true` o `"any"`, esté o no completado.

use serde_json::{json, Value as Json};

use super::{Diagnostic, Schema, ValidationContext, Validator};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicValidator;

impl BasicValidator {
    fn errors(&self, schema: &Schema, value: &Value) -> Vec<Json> {
        let mut errors = Vec::new();
        if value.is_deferred() {
            if !accepts_anything(schema) {
                errors.push(error("$", &format!("expected {}, got deferred", describe(schema))));
            }
            return errors;
        }
        check(schema, &value.to_json(), "$", &mut errors);
        errors
    }
}

impl Validator for BasicValidator {
    fn is_valid(&self, _ctx: &ValidationContext<'_>, schema: &Schema, value: &Value) -> bool {
        self.errors(schema, value).is_empty()
    }

    fn explain(&self, ctx: &ValidationContext<'_>, schema: &Schema, value: &Value) -> Diagnostic {
        json!({
            "step": ctx.step_name,
            "schema": schema,
            "value": value.to_json(),
            "errors": self.errors(schema, value),
        })
    }
}

fn accepts_anything(schema: &Schema) -> bool {
    matches!(schema, Json::Bool(true)) || describe(schema) == "any"
}

/// Tipo que pide el esquema, para los mensajes.
fn describe(schema: &Schema) -> &str {
    match schema {
        Json::String(ty) => ty.as_str(),
        Json::Object(keywords) => keywords.get("type").and_then(Json::as_str).unwrap_or("a concrete value"),
        _ => "a concrete value",
    }
}

fn check(schema: &Schema, value: &Json, at: &str, errors: &mut Vec<Json>) {
    match schema {
        Json::Bool(true) => {}
        Json::String(ty) => check_type(ty, value, at, errors),
        Json::Object(keywords) => {
            if let Some(ty) = keywords.get("type") {
                match ty.as_str() {
                    Some(ty) => check_type(ty, value, at, errors),
                    None => errors.push(error(at, "schema 'type' must be a string")),
                }
            }
            if let Some(options) = keywords.get("enum").and_then(Json::as_array) {
                if !options.contains(value) {
                    errors.push(error(at, &format!("expected one of {}", Json::Array(options.clone()))));
                }
            }
            if let (Some(required), Some(obj)) = (keywords.get("required").and_then(Json::as_array), value.as_object()) {
                for key in required.iter().filter_map(Json::as_str) {
                    if !obj.contains_key(key) {
                        errors.push(error(at, &format!("missing required key '{key}'")));
                    }
                }
            }
            if let (Some(props), Some(obj)) = (keywords.get("properties").and_then(Json::as_object), value.as_object()) {
                for (key, sub) in props {
                    if let Some(v) = obj.get(key) {
                        check(sub, v, &format!("{at}.{key}"), errors);
                    }
                }
            }
            if let (Some(items), Some(arr)) = (keywords.get("items"), value.as_array()) {
                for (i, v) in arr.iter().enumerate() {
                    check(items, v, &format!("{at}[{i}]"), errors);
                }
            }
        }
        other => errors.push(error(at, &format!("unsupported schema {other}"))),
    }
}

fn check_type(ty: &str, value: &Json, at: &str, errors: &mut Vec<Json>) {
    let ok = match ty {
        "any" => true,
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        unknown => {
            errors.push(error(at, &format!("unknown type '{unknown}'")));
            return;
        }
    };
    if !ok {
        errors.push(error(at, &format!("expected {ty}, got {}", json_type(value))));
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "number",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn error(at: &str, message: &str) -> Json {
    json!({ "path": at, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::Deferred;
    use crate::validation::SchemaRegistry;

    fn ctx(registry: &SchemaRegistry) -> ValidationContext<'_> {
        ValidationContext { step_name: "s",
                            step_index: 0,
                            registry }
    }

    #[test]
    fn type_shorthand_and_object_form() {
        let reg = SchemaRegistry::new();
        let v = BasicValidator;
        assert!(v.is_valid(&ctx(&reg), &json!("integer"), &Value::from(3)));
        assert!(!v.is_valid(&ctx(&reg), &json!({"type": "integer"}), &Value::from("oops")));
        assert!(!v.is_valid(&ctx(&reg), &json!("integer"), &Value::from(1.5)));
        assert!(v.is_valid(&ctx(&reg), &json!({"type": "number"}), &Value::from(1.5)));
        assert!(v.is_valid(&ctx(&reg), &json!(true), &Value::from("anything")));
    }

    #[test]
    fn nested_properties_and_items() {
        let reg = SchemaRegistry::new();
        let schema = json!({
            "type": "object",
            "required": ["id", "tags"],
            "properties": {"id": "integer", "tags": {"type": "array", "items": "string"}}
        });
        let v = BasicValidator;
        assert!(v.is_valid(&ctx(&reg), &schema, &Value::from(json!({"id": 1, "tags": ["a"]}))));
        assert!(!v.is_valid(&ctx(&reg), &schema, &Value::from(json!({"id": 1, "tags": [1]}))));
        assert!(!v.is_valid(&ctx(&reg), &schema, &Value::from(json!({"tags": []}))));
    }

    #[test]
    fn explain_lists_errors_with_location() {
        let reg = SchemaRegistry::new();
        let d = BasicValidator.explain(&ctx(&reg), &json!({"type": "integer"}), &Value::from("oops"));
        assert_eq!(d["value"], json!("oops"));
        assert_eq!(d["errors"][0]["path"], json!("$"));
        assert_eq!(d["errors"][0]["message"], json!("expected integer, got string"));
    }

    #[test]
    fn completed_deferred_is_never_a_concrete_value() {
        let reg = SchemaRegistry::new();
        let done = Value::from(Deferred::ready(7));
        assert!(!BasicValidator.is_valid(&ctx(&reg), &json!("integer"), &done));
        assert!(!BasicValidator.is_valid(&ctx(&reg), &json!({"type": "object"}), &done));
        assert!(BasicValidator.is_valid(&ctx(&reg), &json!("any"), &done));
        assert!(BasicValidator.is_valid(&ctx(&reg), &json!(true), &done));

        let d = BasicValidator.explain(&ctx(&reg), &json!("integer"), &done);
        assert_eq!(d["value"], json!({"deferred": "handle"}));
        assert_eq!(d["errors"][0]["message"], json!("expected integer, got deferred"));
    }

    #[test]
    fn unknown_schema_shapes_never_validate() {
        let reg = SchemaRegistry::new();
        assert!(!BasicValidator.is_valid(&ctx(&reg), &json!(42), &Value::from(42)));
        assert!(!BasicValidator.is_valid(&ctx(&reg), &json!("decimal"), &Value::from(42)));
    }
}
