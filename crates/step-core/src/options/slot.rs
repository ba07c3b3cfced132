use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::OptionsSchema;
use crate::errors::StepError;
use crate::hashing::hash_value;

/// Opciones tipadas de un Step concreto.
#[derive(Debug, Clone)]
pub struct OptionsSlot<O> {
    current: Option<O>,
}

impl<O> Default for OptionsSlot<O> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<O> OptionsSlot<O> where O: Serialize + DeserializeOwned
{
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(options: O) -> Self {
        Self { current: Some(options) }
    }

    pub fn get(&self) -> Option<&O> {
        self.current.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    /// Valida `raw` contra `schema`, lo decodifica a `O` y recién entonces
    /// reemplaza el valor actual. Ante cualquier error el valor previo queda
    /// intacto.
    pub fn apply(&mut self, raw: Value, schema: &OptionsSchema) -> Result<&O, StepError> {
        schema.validate(&raw)?;
        let parsed: O = serde_json::from_value(raw)?;
        Ok(&*self.current.insert(parsed))
    }

    pub fn to_value(&self) -> Option<Value> {
        self.current.as_ref().and_then(|o| serde_json::to_value(o).ok())
    }

    pub fn fingerprint(&self) -> Option<String> {
        self.to_value().map(|v| hash_value(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Opts {
        x: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn apply_sets_value_when_valid() {
        let schema = OptionsSchema::for_type::<Opts>();
        let mut slot = OptionsSlot::<Opts>::empty();
        assert!(!slot.is_set());
        slot.apply(json!({"x": "a"}), &schema).expect("valid");
        assert_eq!(slot.get(), Some(&Opts { x: "a".into(), count: 0 }));
        assert_eq!(slot.to_value(), Some(json!({"x": "a", "count": 0})));
    }

    #[test]
    fn invalid_options_keep_previous_value() {
        let schema = OptionsSchema::for_type::<Opts>();
        let mut slot = OptionsSlot::with(Opts { x: "keep".into(), count: 2 });
        let before = slot.fingerprint();

        let err = slot.apply(json!({"count": 3}), &schema).unwrap_err();
        assert!(err.is_validation());
        let err = slot.apply(json!({"x": 5}), &schema).unwrap_err();
        assert!(err.is_validation());

        assert_eq!(slot.get().map(|o| o.x.as_str()), Some("keep"));
        assert_eq!(slot.fingerprint(), before);
    }
}
