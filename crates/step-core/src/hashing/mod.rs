//! Canonicalización JSON + hash, usados para el fingerprint de opciones.

pub mod canonical_json;

pub use canonical_json::to_canonical_json;

use serde_json::Value;

/// Hashea un string (blake3) y devuelve hex.
pub fn hash_str(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Hash estable de un `Value`: no depende del orden de inserción de claves.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"items": ["a", "b"], "max_attempts": 2});
        let b = json!({"max_attempts": 2, "items": ["a", "b"]});
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_eq!(hash_value(&a).len(), 64);
    }

    #[test]
    fn hash_detects_value_change() {
        assert_ne!(hash_value(&json!({"items": ["a"]})), hash_value(&json!({"items": ["b"]})));
    }
}
