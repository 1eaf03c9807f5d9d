//! Property values as the server stores them.
//!
//! A property is a scalar (boolean, integer, float, string) or a homogeneous
//! list of scalars. `Null` only ever travels on the wire: it is the absence
//! marker and is never stored on an entity.

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{GraphError, Result};

/// Serialized as a plain JSON scalar or array. Deserialization applies the
/// same checks as [`PropertyValue::list`] and the `serde_json::Value`
/// conversion; non-finite floats refuse to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

/// Scalar kind, used to check list homogeneity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
        }
    }
}

impl PropertyValue {
    /// Builds a list value, rejecting nulls, nested lists and mixed kinds.
    pub fn list(items: Vec<PropertyValue>) -> Result<Self> {
        let mut expected: Option<ValueKind> = None;
        for (i, item) in items.iter().enumerate() {
            let kind = item.scalar_kind().ok_or_else(|| {
                GraphError::invalid(format!("list element {} is not a scalar: {}", i, item))
            })?;
            match expected {
                None => expected = Some(kind),
                Some(k) if k != kind => {
                    return Err(GraphError::invalid(format!(
                        "list mixes {} and {} values",
                        k.as_str(),
                        kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(PropertyValue::List(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn scalar_kind(&self) -> Option<ValueKind> {
        match self {
            PropertyValue::Boolean(_) => Some(ValueKind::Boolean),
            PropertyValue::Integer(_) => Some(ValueKind::Integer),
            PropertyValue::Float(_) => Some(ValueKind::Float),
            PropertyValue::String(_) => Some(ValueKind::String),
            PropertyValue::Null | PropertyValue::List(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Fails on NaN or infinite floats, which JSON cannot carry.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            PropertyValue::Null => Ok(serde_json::Value::Null),
            PropertyValue::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
            PropertyValue::Integer(i) => Ok(serde_json::Value::from(*i)),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| non_finite(*f)),
            PropertyValue::String(s) => Ok(serde_json::Value::String(s.clone())),
            PropertyValue::List(items) => items
                .iter()
                .map(PropertyValue::to_json)
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
        }
    }
}

fn non_finite(f: f64) -> GraphError {
    GraphError::invalid(format!("non-finite float {} has no JSON form", f))
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Null => serializer.serialize_unit(),
            PropertyValue::Boolean(b) => serializer.serialize_bool(*b),
            PropertyValue::Integer(i) => serializer.serialize_i64(*i),
            PropertyValue::Float(f) if !f.is_finite() => {
                Err(ser::Error::custom(non_finite(*f)))
            }
            PropertyValue::Float(f) => serializer.serialize_f64(*f),
            PropertyValue::String(s) => serializer.serialize_str(s),
            PropertyValue::List(items) => serializer.collect_seq(items),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        PropertyValue::try_from(value).map_err(de::Error::custom)
    }
}

impl TryFrom<serde_json::Value> for PropertyValue {
    type Error = GraphError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(PropertyValue::Null),
            serde_json::Value::Bool(b) => Ok(PropertyValue::Boolean(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(PropertyValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(PropertyValue::Float(f))
                } else {
                    Err(GraphError::invalid(format!("number out of range: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(PropertyValue::String(s)),
            serde_json::Value::Array(items) => {
                let items = items
                    .into_iter()
                    .map(PropertyValue::try_from)
                    .collect::<Result<Vec<_>>>()?;
                PropertyValue::list(items)
            }
            serde_json::Value::Object(_) => Err(GraphError::invalid(
                "maps are not supported as property values",
            )),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<u32> for PropertyValue {
    fn from(i: u32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        PropertyValue::Float(f as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Null, Into::into)
    }
}

// Lists are only built from a single scalar element type, so they are
// homogeneous by construction.
macro_rules! impl_from_scalar_vec {
    ($($t:ty),*) => {
        $(
            impl From<Vec<$t>> for PropertyValue {
                fn from(items: Vec<$t>) -> Self {
                    PropertyValue::List(items.into_iter().map(PropertyValue::from).collect())
                }
            }
        )*
    };
}

impl_from_scalar_vec!(bool, i64, i32, f64, &str, String);

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{:?}", x),
            PropertyValue::String(s) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_homogeneity() {
        assert!(PropertyValue::list(vec![1i64.into(), 2i64.into()]).is_ok());
        assert!(PropertyValue::list(vec![]).is_ok());

        let mixed = PropertyValue::list(vec![1i64.into(), "x".into()]);
        assert!(matches!(mixed, Err(GraphError::InvalidArgument(_))));

        let nested = PropertyValue::list(vec![PropertyValue::from(vec![1i64])]);
        assert!(nested.is_err());

        let with_null = PropertyValue::list(vec![PropertyValue::Null]);
        assert!(with_null.is_err());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(PropertyValue::try_from(json!(3)).unwrap(), PropertyValue::Integer(3));
        assert_eq!(PropertyValue::try_from(json!(2.5)).unwrap(), PropertyValue::Float(2.5));
        assert_eq!(PropertyValue::try_from(json!(null)).unwrap(), PropertyValue::Null);
        assert_eq!(
            PropertyValue::try_from(json!(["a", "b"])).unwrap(),
            PropertyValue::from(vec!["a", "b"])
        );
        assert!(PropertyValue::try_from(json!({"a": 1})).is_err());
        assert!(PropertyValue::try_from(json!([1, "a"])).is_err());
    }

    #[test]
    fn test_serde_untagged() {
        let value: PropertyValue = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(value, PropertyValue::from(vec![1i64, 2, 3]));

        let json = serde_json::to_string(&PropertyValue::from("Alice")).unwrap();
        assert_eq!(json, "\"Alice\"");
    }

    #[test]
    fn test_deserialize_validates_lists() {
        assert!(serde_json::from_str::<PropertyValue>("[1, \"x\"]").is_err());
        assert!(serde_json::from_str::<PropertyValue>("[[1]]").is_err());
        assert!(serde_json::from_str::<PropertyValue>("[1, null]").is_err());
        assert!(serde_json::from_str::<PropertyValue>("{\"a\": 1}").is_err());
        assert_eq!(
            serde_json::from_str::<PropertyValue>("null").unwrap(),
            PropertyValue::Null
        );
    }

    #[test]
    fn test_non_finite_floats_are_not_exported() {
        let nan = PropertyValue::from(f64::NAN);
        assert!(matches!(nan.to_json(), Err(GraphError::InvalidArgument(_))));
        assert!(serde_json::to_value(&nan).is_err());

        let inside = PropertyValue::from(vec![1.0f64, f64::INFINITY]);
        assert!(inside.to_json().is_err());
        assert_eq!(PropertyValue::from(2.5f64).to_json().unwrap(), json!(2.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::from("it's").to_string(), "'it\\'s'");
        assert_eq!(PropertyValue::from(1.0f64).to_string(), "1.0");
        assert_eq!(PropertyValue::from(vec![true, false]).to_string(), "[true, false]");
        assert_eq!(PropertyValue::from(None::<i64>).to_string(), "null");
    }
}
