//! Transport variable bag and its capability traits.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Errors raised when mutating a transport variable bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariablesError {
    /// The bag is currently read-only.
    #[error("transport variables are read-only, cannot modify '{0}'")]
    ReadOnly(String),
}

/// Indexed access to a request's transport variables.
///
/// Names are matched ASCII case-insensitively.
pub trait VariableBag {
    /// Returns the value stored under `name`.
    fn get(&self, name: &str) -> Option<&str>;

    /// Stores `value` under `name`, replacing any existing value.
    fn set(&mut self, name: &str, value: &str) -> Result<(), VariablesError>;

    /// Removes `name`, returning the value it held.
    fn remove(&mut self, name: &str) -> Result<Option<String>, VariablesError>;
}

/// Control over a bag's read-only flag.
pub trait ReadOnlyToggle {
    fn is_read_only(&self) -> bool;
    fn set_read_only(&mut self, read_only: bool);
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    value: String,
}

/// Ordered, case-insensitive map of transport variables for one request.
#[derive(Debug, Clone, Default)]
pub struct TransportVariables {
    /// Keyed by the ASCII-lowercased name.
    entries: IndexMap<String, Entry>,
    read_only: bool,
}

impl TransportVariables {
    /// Create an empty, writable bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }

    /// Appends `value` to an existing entry using `separator`, or creates it.
    pub fn append(&mut self, name: &str, value: &str, separator: &str) -> Result<(), VariablesError> {
        self.ensure_writable(name)?;
        match self.entries.get_mut(&key(name)) {
            Some(entry) => {
                entry.value.push_str(separator);
                entry.value.push_str(value);
                Ok(())
            }
            None => self.set(name, value),
        }
    }

    fn ensure_writable(&self, name: &str) -> Result<(), VariablesError> {
        if self.read_only {
            Err(VariablesError::ReadOnly(name.to_string()))
        } else {
            Ok(())
        }
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl VariableBag for TransportVariables {
    fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&key(name)).map(|entry| entry.value.as_str())
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), VariablesError> {
        self.ensure_writable(name)?;
        self.entries
            .entry(key(name))
            .and_modify(|entry| entry.value = value.to_string())
            .or_insert_with(|| Entry {
                name: name.to_string(),
                value: value.to_string(),
            });
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Option<String>, VariablesError> {
        self.ensure_writable(name)?;
        Ok(self.entries.shift_remove(&key(name)).map(|entry| entry.value))
    }
}

impl ReadOnlyToggle for TransportVariables {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl Serialize for TransportVariables {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
