use crate::error::{CodecError, CodecResult};
use std::collections::HashMap;

/// A structured runtime value passed into encode and produced by decode.
///
/// The codec never works on language-native dynamic objects; every payload is
/// a tree of these tagged values. A field's `name` attribute is a key into a
/// `Value::Map`.
///
/// Wire integers are unsigned and at most 8 bytes wide, so `Int` carries a
/// `u64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned integer scalar (also carries decoded BCD digits).
    Int(u64),
    /// Text scalar, UTF-8.
    Str(String),
    /// String-keyed mapping, the decode result of a named combination.
    Map(HashMap<String, Value>),
    /// Sequence of values, the decode result of an array field.
    Seq(Vec<Value>),
}

impl Value {
    /// Short tag for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
            Value::Seq(_) => "sequence",
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Map entry lookup; `None` for non-maps and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Convert a JSON document into a codec value.
    ///
    /// Accepts non-negative integers, strings, objects and arrays. Floats,
    /// negative numbers, booleans and nulls have no wire representation here
    /// and are rejected.
    pub fn from_json(json: &serde_json::Value) -> CodecResult<Value> {
        match json {
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(Value::Int)
                .ok_or_else(|| CodecError::UnexpectedType(format!("non-u64 number: {n}"))),
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Object(o) => {
                let mut map = HashMap::with_capacity(o.len());
                for (k, v) in o {
                    map.insert(k.clone(), Value::from_json(v)?);
                }
                Ok(Value::Map(map))
            }
            serde_json::Value::Array(a) => {
                let mut seq = Vec::with_capacity(a.len());
                for v in a {
                    seq.push(Value::from_json(v)?);
                }
                Ok(Value::Seq(seq))
            }
            other => Err(CodecError::UnexpectedType(format!(
                "JSON {other} has no codec value representation"
            ))),
        }
    }

    /// Convert this value into a JSON document for host applications.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::Number((*v).into()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Seq(s) => serde_json::Value::Array(s.iter().map(Value::to_json).collect()),
        }
    }
}

/// Scalar-oriented display used in error messages; structured values render
/// as their type tag.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::Map(_) | Value::Seq(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(seq: Vec<Value>) -> Self {
        Value::Seq(seq)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
