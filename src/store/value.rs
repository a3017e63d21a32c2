// Tagged value model for store state
//
// The representable set is exactly what the store accepts: strings, finite
// numbers, objects, and arrays. Null and booleans are unrepresentable by
// construction; NaN/infinity can still arrive inside an f64 and are caught
// by `validate` at the set_state boundary.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A value storable under a state key
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Str(String),
    Num(f64),
    Object(BTreeMap<String, StateValue>),
    Array(Vec<StateValue>),
}

impl StateValue {
    /// String payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload, if this is a number value
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Object members, if this is an object value
    pub fn as_object(&self) -> Option<&BTreeMap<String, StateValue>> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Array elements, if this is an array value
    pub fn as_array(&self) -> Option<&[StateValue]> {
        match self {
            Self::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Check the value is serializable: every number in it must be finite.
    /// JSON has no NaN/infinity, so these are rejected up front rather than
    /// silently degraded in the persisted snapshot.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Str(_) => Ok(()),
            Self::Num(n) if n.is_finite() => Ok(()),
            Self::Num(n) => Err(format!("{} is not a valid value for state", n)),
            Self::Object(members) => members.values().try_for_each(StateValue::validate),
            Self::Array(elements) => elements.iter().try_for_each(StateValue::validate),
        }
    }

    /// Convert from parsed JSON. Fails on null and boolean members, which
    /// are outside the representable set; a persisted snapshot containing
    /// them is treated as malformed.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Err("null is not a valid state value".to_string()),
            serde_json::Value::Bool(b) => {
                Err(format!("boolean {} is not a valid state value", b))
            }
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Num)
                .ok_or_else(|| format!("number {} is not representable", n)),
            serde_json::Value::String(s) => Ok(Self::Str(s.clone())),
            serde_json::Value::Array(elements) => elements
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            serde_json::Value::Object(members) => members
                .iter()
                .map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Object),
        }
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Num(n) => serializer.serialize_f64(*n),
            Self::Array(elements) => {
                let mut seq = serializer.serialize_seq(Some(elements.len()))?;
                for element in elements {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Self::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (key, value) in members {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Num(n) => write!(f, "{}", n),
            Self::Object(members) => write!(f, "object({} members)", members.len()),
            Self::Array(elements) => write!(f, "array({} elements)", elements.len()),
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<i64> for StateValue {
    fn from(n: i64) -> Self {
        Self::Num(n as f64)
    }
}

impl From<Vec<StateValue>> for StateValue {
    fn from(elements: Vec<StateValue>) -> Self {
        Self::Array(elements)
    }
}

impl From<BTreeMap<String, StateValue>> for StateValue {
    fn from(members: BTreeMap<String, StateValue>) -> Self {
        Self::Object(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_rejects_null_and_bool() {
        assert!(StateValue::from_json(&serde_json::json!(null)).is_err());
        assert!(StateValue::from_json(&serde_json::json!(true)).is_err());
        assert!(StateValue::from_json(&serde_json::json!({"ok": null})).is_err());
    }

    #[test]
    fn test_from_json_accepts_nested_structure() {
        let value =
            StateValue::from_json(&serde_json::json!({"notes": [{"title": "First"}], "count": 1}))
                .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.get("count").and_then(StateValue::as_num), Some(1.0));
        assert_eq!(object.get("notes").and_then(StateValue::as_array).unwrap().len(), 1);
    }

    #[test]
    fn test_validate_rejects_nested_nan() {
        let value = StateValue::Array(vec![StateValue::Num(1.0), StateValue::Num(f64::NAN)]);
        assert!(value.validate().is_err());
        assert!(StateValue::Num(f64::INFINITY).validate().is_err());
        assert!(StateValue::Num(1.5).validate().is_ok());
    }

    #[test]
    fn test_serializes_to_plain_json() {
        let mut members = BTreeMap::new();
        members.insert("title".to_string(), StateValue::from("First"));
        let json = serde_json::to_string(&StateValue::Object(members)).unwrap();
        assert_eq!(json, r#"{"title":"First"}"#);
    }
}
