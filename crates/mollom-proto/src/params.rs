//! Call arguments.
//!
//! Arguments are a flat name to value map. Optional arguments that are unset
//! never enter the map, so they can never reach the wire.

use std::collections::BTreeMap;

use crate::xmlrpc::Value;

/// Named call arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    /// Empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder form of [`Params::insert_opt`].
    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Set an argument, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set an argument if present. `None` leaves the map untouched.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Look up an argument.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no argument is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate arguments in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert into an XML-RPC struct.
    pub fn into_value(self) -> Value {
        Value::Struct(self.0)
    }

    /// Flatten into form pairs for the REST transport.
    ///
    /// Arrays repeat their key once per element; struct members become
    /// `key[member]`.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            flatten(key, value, &mut pairs);
        }
        pairs
    }
}

fn flatten(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(key, item, pairs);
            }
        },
        Value::Struct(members) => {
            for (member, value) in members {
                flatten(&format!("{key}[{member}]"), value, pairs);
            }
        },
        Value::Nil => {},
        scalar => pairs.push((key.to_string(), scalar.to_form_string())),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
