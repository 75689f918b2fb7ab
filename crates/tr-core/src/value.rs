//! Runtime values assembled before literal synthesis.
//!
//! `Value` is a closed tagged variant: every shape the literal synthesizer
//! can meet is listed here, including the ones it must refuse
//! (`Function`, `Symbol`).

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde_json::Value as JsonValue;

/// Keyed structure preserving insertion order.
pub type ValueMap = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    BigInt(BigInt),
    Bool(bool),
    Text(String),
    Null,
    Structure(ValueMap),
    Sequence(Vec<Value>),
    /// A callable value, identified by name for error reporting.
    Function(String),
    /// An opaque symbol, identified by its description.
    Symbol(String),
    Undefined,
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn structure<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Structure(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "string",
            Value::Null => "null",
            Value::Structure(_) => "object",
            Value::Sequence(_) => "array",
            Value::Function(_) => "function",
            Value::Symbol(_) => "symbol",
            Value::Undefined => "undefined",
        }
    }

    pub fn as_structure(&self) -> Option<&ValueMap> {
        match self {
            Value::Structure(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_structure().and_then(|map| map.get(key))
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Undefined),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Structure(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_objects_keep_their_key_order() {
        let value = Value::from(json!({
            "type": "object",
            "properties": { "zeta": { "type": "string" }, "alpha": { "type": "number" } },
            "additionalProperties": false
        }));
        let keys: Vec<&str> = value
            .as_structure()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["type", "properties", "additionalProperties"]);

        let properties: Vec<&str> = value
            .get("properties")
            .and_then(Value::as_structure)
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(properties, vec!["zeta", "alpha"]);
    }

    #[test]
    fn arrays_become_sequences() {
        let value = Value::from(json!(["a", 1, null, true]));
        assert_eq!(
            value,
            Value::Sequence(vec![
                Value::text("a"),
                Value::Number(1.0),
                Value::Null,
                Value::Bool(true)
            ])
        );
    }
}
