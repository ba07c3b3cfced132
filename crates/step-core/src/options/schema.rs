//! `OptionsSchema`: documento JSON Schema que describe la configuración de un
//! Step. El mismo documento sirve para renderizar un formulario y para
//! validar lo que llega a `set_options`.
use jsonschema::JSONSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{StepError, ValidationError, Violation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionsSchema(Value);

impl OptionsSchema {
    pub fn from_value(schema: Value) -> Self {
        Self(schema)
    }

    /// Deriva el schema de un tipo de opciones (`#[derive(JsonSchema)]`).
    pub fn for_type<T: JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        Self(serde_json::to_value(root).unwrap_or_default())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert("title".into(), Value::String(title.to_string()));
        }
        self
    }

    /// Campos requeridos a nivel raíz.
    pub fn required_fields(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Marca `field` como requerido (idempotente).
    pub fn require(mut self, field: &str) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            let required = obj.entry("required").or_insert_with(|| Value::Array(vec![]));
            if let Some(arr) = required.as_array_mut() {
                if !arr.iter().any(|v| v.as_str() == Some(field)) {
                    arr.push(Value::String(field.to_string()));
                }
            }
        }
        self
    }

    /// Elimina la lista de requeridos a nivel raíz (modo borrador).
    pub fn without_required(mut self) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            obj.remove("required");
        }
        self
    }

    /// Agrega una restricción (`minItems`, `minimum`, ...) a la propiedad
    /// `field`. No hace nada si la propiedad no existe.
    pub fn constrain(mut self, field: &str, keyword: &str, value: Value) -> Self {
        if let Some(Value::Object(prop)) = self.0.get_mut("properties").and_then(|p| p.get_mut(field)) {
            prop.insert(keyword.to_string(), value);
        }
        self
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .map(|props: &Map<String, Value>| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn compile(&self) -> Result<JSONSchema, StepError> {
        JSONSchema::compile(&self.0).map_err(|e| StepError::InvalidSchema(e.to_string()))
    }

    /// Valida `instance`; devuelve todas las violaciones encontradas.
    pub fn validate(&self, instance: &Value) -> Result<(), StepError> {
        let compiled = self.compile()?;
        let violations: Vec<Violation> = match compiled.validate(instance) {
            Ok(()) => return Ok(()),
            Err(errors) => errors.map(|e| Violation { path: e.instance_path.to_string(),
                                                      message: e.to_string() })
                                 .collect(),
        };
        Err(ValidationError::new(violations).into())
    }
}

impl From<Value> for OptionsSchema {
    fn from(schema: Value) -> Self {
        Self(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(JsonSchema, Serialize, Deserialize)]
    #[allow(dead_code)]
    struct Sample {
        x: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn manual() -> OptionsSchema {
        OptionsSchema::from_value(json!({
            "type": "object",
            "properties": { "x": { "type": "string" }, "n": { "type": "integer" } },
            "required": ["x"]
        }))
    }

    #[test]
    fn derived_schema_lists_required_fields() {
        let schema = OptionsSchema::for_type::<Sample>();
        assert_eq!(schema.required_fields(), vec!["x"]);
        assert!(schema.property_names().contains(&"tags"));
        assert_eq!(schema.title(), Some("Sample"));
    }

    #[test]
    fn validate_reports_missing_and_mistyped_fields() {
        let err = manual().validate(&json!({ "n": "three" })).unwrap_err();
        let validation = err.validation().expect("validation error");
        assert_eq!(validation.violations.len(), 2);
        assert!(validation.touches("/n"));
        assert!(manual().validate(&json!({ "x": "ok", "n": 3 })).is_ok());
    }

    #[test]
    fn require_and_without_required() {
        let schema = manual().require("n").require("n");
        assert_eq!(schema.required_fields(), vec!["x", "n"]);
        let draft = schema.without_required();
        assert!(draft.required_fields().is_empty());
        assert!(draft.validate(&json!({})).is_ok());
    }

    #[test]
    fn constrain_adds_keyword_to_property() {
        let schema = manual().constrain("n", "minimum", json!(1));
        assert!(schema.validate(&json!({ "x": "a", "n": 0 })).is_err());
        assert!(schema.validate(&json!({ "x": "a", "n": 1 })).is_ok());
    }

    #[test]
    fn broken_schema_is_reported() {
        let schema = OptionsSchema::from_value(json!({ "type": 12 }));
        assert!(matches!(schema.validate(&json!({})), Err(StepError::InvalidSchema(_))));
    }
}
