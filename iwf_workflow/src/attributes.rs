//! Query attributes, search attributes and state locals.
//!
//! State code reads and writes these through typed accessors. Every write is
//! remembered so the worker can send back only what changed.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use iwf_core::{DynValue, EncodedObject, EncodingError, ObjectEncoder, TypeDescriptor};
use iwf_proto::shared as wire;
use serde::{de::DeserializeOwned, Serialize};

use crate::definition::{SearchAttributeType, SearchAttributeValue};
use crate::error::AttributeError;

/// Query and search attributes visible to a state
///
/// `start` receives a shared reference and can only read; `decide` receives
/// a mutable one and may upsert.
#[derive(Debug, Default)]
pub struct Attributes {
    pub query: QueryAttributes,
    pub search: SearchAttributes,
}

impl Attributes {
    pub fn new(query: QueryAttributes, search: SearchAttributes) -> Self {
        Self { query, search }
    }
}

/// Typed query attributes of one workflow run
#[derive(Debug, Default)]
pub struct QueryAttributes {
    types: HashMap<String, TypeDescriptor>,
    values: HashMap<String, DynValue>,
    upserted: BTreeSet<String>,
}

impl QueryAttributes {
    /// Empty store accepting the declared keys
    pub fn new(types: HashMap<String, TypeDescriptor>) -> Self {
        Self {
            types,
            values: HashMap::new(),
            upserted: BTreeSet::new(),
        }
    }

    /// Load values sent by the server, decoding each with its key's type.
    /// Entries without a value are skipped.
    pub fn from_wire(
        types: HashMap<String, TypeDescriptor>,
        attributes: &[wire::KeyValue],
        encoder: &dyn ObjectEncoder,
    ) -> Result<Self, EncodingError> {
        let mut values = HashMap::new();
        for attribute in attributes {
            let Some(encoded) = &attribute.value else {
                continue;
            };
            let value_type = types.get(&attribute.key).ok_or_else(|| {
                EncodingError::UnknownType(format!("query attribute {}", attribute.key))
            })?;
            values.insert(attribute.key.clone(), value_type.decode(encoder, encoded)?);
        }

        Ok(Self {
            types,
            values,
            upserted: BTreeSet::new(),
        })
    }

    /// Current value of `key`, `None` if it was never set
    pub fn get<T: Any>(&self, key: &str) -> Result<Option<&T>, AttributeError> {
        let value_type = self
            .types
            .get(key)
            .ok_or_else(|| AttributeError::unknown_query(key))?;
        if !value_type.is_instance_of::<T>() {
            return Err(AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: value_type.type_name(),
                actual: std::any::type_name::<T>(),
            });
        }
        Ok(self.values.get(key).and_then(|value| value.downcast_ref::<T>()))
    }

    pub fn set<T>(&mut self, key: &str, value: T) -> Result<(), AttributeError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let value_type = self
            .types
            .get(key)
            .ok_or_else(|| AttributeError::unknown_query(key))?;
        if !value_type.is_instance_of::<T>() {
            return Err(AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: value_type.type_name(),
                actual: std::any::type_name::<T>(),
            });
        }
        self.values.insert(key.to_string(), DynValue::new(value));
        self.upserted.insert(key.to_string());
        Ok(())
    }

    /// Encode every attribute written since loading
    pub fn upserts_to_wire(
        &self,
        encoder: &dyn ObjectEncoder,
    ) -> Result<Vec<wire::KeyValue>, EncodingError> {
        self.upserted
            .iter()
            .filter_map(|key| self.values.get(key).map(|value| (key, value)))
            .map(|(key, value)| Ok(wire::KeyValue::new(key.clone(), Some(value.encode(encoder)?))))
            .collect()
    }
}

/// Search attributes of one workflow run, checked against their declared types
#[derive(Debug, Default)]
pub struct SearchAttributes {
    types: HashMap<String, SearchAttributeType>,
    values: HashMap<String, SearchAttributeValue>,
    upserted: BTreeSet<String>,
}

impl SearchAttributes {
    pub fn new(types: HashMap<String, SearchAttributeType>) -> Self {
        Self {
            types,
            values: HashMap::new(),
            upserted: BTreeSet::new(),
        }
    }

    /// Load values sent by the server; undeclared keys are ignored
    pub fn from_wire(
        types: HashMap<String, SearchAttributeType>,
        attributes: &[wire::SearchAttribute],
    ) -> Self {
        let values = attributes
            .iter()
            .filter_map(|attribute| {
                let declared = types.get(&attribute.key)?;
                SearchAttributeValue::from_wire(attribute, *declared)
                    .map(|value| (attribute.key.clone(), value))
            })
            .collect();

        Self {
            types,
            values,
            upserted: BTreeSet::new(),
        }
    }

    pub fn get_int64(&self, key: &str) -> Result<Option<i64>, AttributeError> {
        self.check(key, SearchAttributeType::Int64)?;
        Ok(match self.values.get(key) {
            Some(SearchAttributeValue::Int(value)) => Some(*value),
            _ => None,
        })
    }

    pub fn get_keyword(&self, key: &str) -> Result<Option<&str>, AttributeError> {
        self.check(key, SearchAttributeType::Keyword)?;
        Ok(match self.values.get(key) {
            Some(SearchAttributeValue::Keyword(value)) => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn get_text(&self, key: &str) -> Result<Option<&str>, AttributeError> {
        self.check(key, SearchAttributeType::Text)?;
        Ok(match self.values.get(key) {
            Some(SearchAttributeValue::Text(value)) => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn set_int64(&mut self, key: &str, value: i64) -> Result<(), AttributeError> {
        self.upsert(key, SearchAttributeValue::Int(value))
    }

    pub fn set_keyword(&mut self, key: &str, value: impl Into<String>) -> Result<(), AttributeError> {
        self.upsert(key, SearchAttributeValue::Keyword(value.into()))
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) -> Result<(), AttributeError> {
        self.upsert(key, SearchAttributeValue::Text(value.into()))
    }

    pub fn upserts_to_wire(&self) -> Vec<wire::SearchAttribute> {
        self.upserted
            .iter()
            .filter_map(|key| self.values.get(key).map(|value| value.to_wire(key.clone())))
            .collect()
    }

    fn upsert(&mut self, key: &str, value: SearchAttributeValue) -> Result<(), AttributeError> {
        self.check(key, value.value_type())?;
        self.values.insert(key.to_string(), value);
        self.upserted.insert(key.to_string());
        Ok(())
    }

    fn check(&self, key: &str, requested: SearchAttributeType) -> Result<(), AttributeError> {
        let declared = self
            .types
            .get(key)
            .ok_or_else(|| AttributeError::unknown_search(key))?;
        if *declared != requested {
            return Err(AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: search_type_name(*declared),
                actual: search_type_name(requested),
            });
        }
        Ok(())
    }
}

fn search_type_name(value_type: SearchAttributeType) -> &'static str {
    match value_type {
        SearchAttributeType::Text => "TEXT",
        SearchAttributeType::Keyword => "KEYWORD",
        SearchAttributeType::Int64 => "INT64",
    }
}

/// Values scoped to a single state execution, plus recorded events.
///
/// Locals written during `start` are handed back to the same state's
/// `decide`. Callers must read a local with the type it was written with.
pub struct StateLocals {
    encoder: Arc<dyn ObjectEncoder>,
    values: HashMap<String, EncodedObject>,
    upserted: BTreeSet<String>,
    events: Vec<wire::KeyValue>,
}

impl StateLocals {
    pub fn new(encoder: Arc<dyn ObjectEncoder>) -> Self {
        Self {
            encoder,
            values: HashMap::new(),
            upserted: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn from_wire(encoder: Arc<dyn ObjectEncoder>, locals: Vec<wire::KeyValue>) -> Self {
        let mut state_locals = Self::new(encoder);
        state_locals.values = locals
            .into_iter()
            .filter_map(|local| local.value.map(|value| (local.key, value)))
            .collect();
        state_locals
    }

    pub fn set_local_attribute<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), AttributeError> {
        let encoded = self.encoder.encode(value)?;
        self.values.insert(key.to_string(), encoded);
        self.upserted.insert(key.to_string());
        Ok(())
    }

    pub fn get_local_attribute<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AttributeError> {
        match self.values.get(key) {
            Some(encoded) => Ok(Some(self.encoder.decode(encoded)?)),
            None => Ok(None),
        }
    }

    /// Record an event for debugging; each key may be recorded once per call
    pub fn record_event<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        data: &T,
    ) -> Result<(), AttributeError> {
        if self.events.iter().any(|event| event.key == key) {
            return Err(AttributeError::DuplicateEvent(key.to_string()));
        }
        let encoded = self.encoder.encode(data)?;
        self.events.push(wire::KeyValue::new(key, Some(encoded)));
        Ok(())
    }

    /// Locals written since loading
    pub fn upserts(&self) -> Vec<wire::KeyValue> {
        self.upserted
            .iter()
            .filter_map(|key| {
                self.values
                    .get(key)
                    .map(|value| wire::KeyValue::new(key.clone(), Some(value.clone())))
            })
            .collect()
    }

    pub fn recorded_events(&self) -> &[wire::KeyValue] {
        &self.events
    }
}

impl std::fmt::Debug for StateLocals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateLocals")
            .field("encoder", &self.encoder.encoding())
            .field("values", &self.values)
            .field("upserted", &self.upserted)
            .field("events", &self.events)
            .finish()
    }
}
