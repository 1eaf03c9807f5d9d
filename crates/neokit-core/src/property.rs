use neokit_common::{GraphError, PropertyValue, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Property storage for nodes and relationships.
///
/// `Null` is the absence marker: it is never stored, and assigning it removes
/// the key. Comparing against a plain map ignores `Null` entries on the
/// right-hand side, so `{a: 1}` equals `{a: 1, b: null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, PropertyValue>", into = "BTreeMap<String, PropertyValue>")]
pub struct PropertyDict {
    inner: BTreeMap<String, PropertyValue>,
}

impl PropertyDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.inner.get(key)
    }

    /// Stores `value`, or removes `key` when `value` is `Null`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.inner.remove(&key);
        } else {
            self.inner.insert(key, value);
        }
    }

    /// Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Applies entries left to right with `set` semantics: later entries win
    /// and `Null` deletes.
    pub fn update<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Accepts a JSON object or an array of `[key, value]` pairs. Nothing is
    /// applied unless every entry converts.
    pub fn update_from_json(&mut self, source: &serde_json::Value) -> Result<()> {
        let entries = json_entries(source)?;
        self.update(entries);
        Ok(())
    }

    /// Fails if any value has no JSON form (a non-finite float).
    pub fn to_json(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        self.inner
            .iter()
            .map(|(k, v)| -> Result<(String, serde_json::Value)> {
                Ok((k.clone(), v.to_json()?))
            })
            .collect()
    }

    fn eq_filtered<'a, I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = (&'a String, &'a PropertyValue)>,
    {
        let mut matched = 0;
        for (key, value) in other {
            if value.is_null() {
                continue;
            }
            if self.inner.get(key) != Some(value) {
                return false;
            }
            matched += 1;
        }
        matched == self.inner.len()
    }
}

fn json_entries(source: &serde_json::Value) -> Result<Vec<(String, PropertyValue)>> {
    match source {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| -> Result<(String, PropertyValue)> {
                Ok((k.clone(), PropertyValue::try_from(v.clone())?))
            })
            .collect(),
        serde_json::Value::Array(pairs) => pairs
            .iter()
            .map(|pair| -> Result<(String, PropertyValue)> {
                match pair.as_array().map(Vec::as_slice) {
                    Some([serde_json::Value::String(k), v]) => {
                        Ok((k.clone(), PropertyValue::try_from(v.clone())?))
                    }
                    _ => Err(GraphError::invalid(format!(
                        "expected a [key, value] pair, got {}",
                        pair
                    ))),
                }
            })
            .collect(),
        other => Err(GraphError::invalid(format!(
            "cannot update properties from {}",
            other
        ))),
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyDict {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        map.into_iter().collect()
    }
}

impl From<PropertyDict> for BTreeMap<String, PropertyValue> {
    fn from(dict: PropertyDict) -> Self {
        dict.inner
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = PropertyDict::new();
        dict.update(iter);
        dict
    }
}

impl<'a> IntoIterator for &'a PropertyDict {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl PartialEq<BTreeMap<String, PropertyValue>> for PropertyDict {
    fn eq(&self, other: &BTreeMap<String, PropertyValue>) -> bool {
        self.eq_filtered(other)
    }
}

impl PartialEq<HashMap<String, PropertyValue>> for PropertyDict {
    fn eq(&self, other: &HashMap<String, PropertyValue>) -> bool {
        self.eq_filtered(other)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl fmt::Display for PropertyDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.inner.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if is_identifier(key) {
                write!(f, "{}: {}", key, value)?;
            } else {
                write!(f, "`{}`: {}", key.replace('`', "``"), value)?;
            }
        }
        write!(f, "}}")
    }
}
