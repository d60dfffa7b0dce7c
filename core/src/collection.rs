//! Lazy record collection over one API response.
//!
//! # Design
//! List endpoints return JSON arrays whose elements are only converted to
//! typed records when something actually looks at them. Each position holds a
//! single tagged slot, either the raw JSON object as received or the typed
//! record it materialized into, so raw and materialized state can never
//! drift apart. Derived views (the plain-value projection, the natural-key
//! index, numeric aggregates) are built lazily and cleared by every mutation
//! before it returns.
//!
//! Materialization is pure and deterministic, so memoizing it is invisible to
//! callers: `get(i)` twice yields records with identical field values whether
//! the second call hit the memo or re-converted. A conversion failure is
//! returned to the caller and NOT cached: the slot stays raw and the next
//! access re-attempts it.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, MaterializationError};

/// One decoded API record as received, prior to any typed conversion.
pub type RawRecord = serde_json::Map<String, Value>;

/// A typed API record that can be materialized from a [`RawRecord`].
///
/// The default `materialize` goes through serde, which makes the conversion
/// pure and total over well-formed input and rejects records with missing
/// required fields.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Field used as the natural key for [`LazyCollection::find_by_key`].
    const KEY_FIELD: &'static str;

    /// Convert one raw record into its typed form. Must depend on nothing
    /// beyond the raw fields.
    fn materialize(raw: &RawRecord) -> Result<Self, String> {
        serde_json::from_value(Value::Object(raw.clone())).map_err(|e| e.to_string())
    }
}

/// Storage for one position: the record as received, or as materialized.
#[derive(Debug, Clone)]
enum Slot<T> {
    Raw(RawRecord),
    Materialized(T),
}

/// A sequence of API records that materializes lazily.
///
/// Indices are assigned in insertion order and survive deletions as holes;
/// `len()` counts present slots, not the highest index. Out-of-bounds access
/// yields `None` rather than an error so consumers can probe defensively.
#[derive(Debug, Clone)]
pub struct LazyCollection<T: Record> {
    slots: BTreeMap<usize, Slot<T>>,
    projection: Option<Vec<Value>>,
    key_index: Option<HashMap<String, usize>>,
    aggregates: HashMap<String, f64>,
}

impl<T: Record> Default for LazyCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> LazyCollection<T> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            projection: None,
            key_index: None,
            aggregates: HashMap::new(),
        }
    }

    /// Build a collection from a batch of raw records.
    pub fn from_raw(items: Vec<RawRecord>) -> Self {
        let mut collection = Self::new();
        collection.set_items(items);
        collection
    }

    /// Build a collection from a decoded JSON array of objects, as returned
    /// by list endpoints. No record is materialized here.
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let array = value
            .as_array()
            .ok_or_else(|| ApiError::Deserialization("expected a JSON array of records".to_string()))?;
        let mut items = Vec::with_capacity(array.len());
        for entry in array {
            match entry {
                Value::Object(map) => items.push(map.clone()),
                other => {
                    return Err(ApiError::Deserialization(format!(
                        "expected a JSON object in record array, got {other}"
                    )))
                }
            }
        }
        Ok(Self::from_raw(items))
    }

    /// Replace all contents with a fresh batch of raw records. Resets
    /// materialization state and every derived view. Always succeeds.
    pub fn set_items(&mut self, items: Vec<RawRecord>) {
        self.slots = items.into_iter().enumerate().map(|(i, raw)| (i, Slot::Raw(raw))).collect();
        self.invalidate_views();
    }

    /// Number of present slots, materialized or not. O(1).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append an already-typed record.
    pub fn push(&mut self, record: T) {
        let index = self.next_index();
        self.slots.insert(index, Slot::Materialized(record));
        self.invalidate_views();
    }

    /// Append a raw record; conversion is deferred until first access.
    pub fn push_raw(&mut self, raw: RawRecord) {
        let index = self.next_index();
        self.slots.insert(index, Slot::Raw(raw));
        self.invalidate_views();
    }

    /// Overwrite the slot at `index` with a typed record. Replacing a pending
    /// raw slot promotes it in one step: the raw value is dropped with the
    /// slot it lived in.
    pub fn set(&mut self, index: usize, record: T) {
        self.slots.insert(index, Slot::Materialized(record));
        self.invalidate_views();
    }

    /// Overwrite the slot at `index` with a raw record, demoting any
    /// previously materialized value there.
    pub fn set_raw(&mut self, index: usize, raw: RawRecord) {
        self.slots.insert(index, Slot::Raw(raw));
        self.invalidate_views();
    }

    /// Delete the slot at `index`. Later indices keep their positions; the
    /// hole simply no longer counts.
    pub fn remove(&mut self, index: usize) {
        if self.slots.remove(&index).is_some() {
            self.invalidate_views();
        }
    }

    /// The record at `index`, materializing and memoizing on first access.
    /// Absent indices yield `Ok(None)`.
    pub fn get(&mut self, index: usize) -> Result<Option<&T>, MaterializationError> {
        self.materialize_at(index)?;
        match self.slots.get(&index) {
            Some(Slot::Materialized(record)) => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    /// The record at index 0, if present. O(1) amortized regardless of size.
    pub fn first(&mut self) -> Result<Option<&T>, MaterializationError> {
        self.get(0)
    }

    /// Force materialization of every slot and return the full record set in
    /// index order. Already-realized slots cost nothing.
    pub fn all(&mut self) -> Result<Vec<&T>, MaterializationError> {
        let indices: Vec<usize> = self.slots.keys().copied().collect();
        for index in indices {
            self.materialize_at(index)?;
        }
        Ok(self
            .slots
            .values()
            .filter_map(|slot| match slot {
                Slot::Materialized(record) => Some(record),
                Slot::Raw(_) => None,
            })
            .collect())
    }

    /// The plain-value projection of the collection, in index order. Cached
    /// until the next mutation; recomputing materializes every slot.
    pub fn to_array(&mut self) -> Result<&[Value], MaterializationError> {
        if self.projection.is_none() {
            let indices: Vec<usize> = self.slots.keys().copied().collect();
            let mut values = Vec::with_capacity(indices.len());
            for index in indices {
                self.materialize_at(index)?;
                if let Some(Slot::Materialized(record)) = self.slots.get(&index) {
                    let value = serde_json::to_value(record)
                        .map_err(|e| MaterializationError { index, reason: e.to_string() })?;
                    values.push(value);
                }
            }
            self.projection = Some(values);
        }
        Ok(self.projection.as_deref().unwrap_or_default())
    }

    /// The projection serialized as a JSON array, suitable for re-emitting
    /// as a response body.
    pub fn to_json(&mut self) -> Result<String, ApiError> {
        let values = self.to_array()?;
        serde_json::to_string(values).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Look up a record by the value of its natural-key field
    /// ([`Record::KEY_FIELD`]).
    ///
    /// The first lookup after a mutation scans stored entries once to build a
    /// key → index map without materializing anything; the map is then reused
    /// until the next mutation. Only the matched record is materialized.
    pub fn find_by_key(&mut self, key: &Value) -> Result<Option<&T>, MaterializationError> {
        let Some(key) = key_string(key) else {
            return Ok(None);
        };
        if self.key_index.is_none() {
            let mut map = HashMap::new();
            for (&index, slot) in &self.slots {
                if let Some(k) = slot_field(slot, T::KEY_FIELD).as_ref().and_then(key_string) {
                    map.insert(k, index);
                }
            }
            self.key_index = Some(map);
        }
        match self.key_index.as_ref().and_then(|map| map.get(&key)).copied() {
            Some(index) => self.get(index),
            None => Ok(None),
        }
    }

    /// Sum of a numeric field over stored entries, computed without
    /// materializing and memoized until the next mutation. Entries lacking
    /// the field or holding a non-numeric value contribute nothing.
    pub fn sum(&mut self, field: &str) -> f64 {
        if let Some(&total) = self.aggregates.get(field) {
            return total;
        }
        let total = self
            .slots
            .values()
            .filter_map(|slot| slot_field(slot, field))
            .filter_map(|value| value.as_f64())
            .sum();
        self.aggregates.insert(field.to_string(), total);
        total
    }

    /// Iterate records in ascending index order, materializing per step.
    ///
    /// The iterator snapshots the index order at creation and holds the
    /// collection's exclusive borrow, so the backing storage cannot change
    /// mid-traversal. [`Iter::reset`] returns the cursor to the start.
    pub fn iter(&mut self) -> Iter<'_, T> {
        let indices = self.slots.keys().copied().collect();
        Iter { collection: self, indices, pos: 0 }
    }

    fn next_index(&self) -> usize {
        self.slots.keys().next_back().map_or(0, |&last| last + 1)
    }

    fn materialize_at(&mut self, index: usize) -> Result<(), MaterializationError> {
        let pending = matches!(self.slots.get(&index), Some(Slot::Raw(_)));
        if pending {
            let record = match self.slots.get(&index) {
                Some(Slot::Raw(raw)) => {
                    T::materialize(raw).map_err(|reason| MaterializationError { index, reason })?
                }
                _ => return Ok(()),
            };
            self.slots.insert(index, Slot::Materialized(record));
        }
        Ok(())
    }

    // Derived views must be cleared before any mutating call returns.
    fn invalidate_views(&mut self) {
        self.projection = None;
        self.key_index = None;
        self.aggregates.clear();
    }
}

/// Read one field from a slot without changing its state. Materialized slots
/// answer through their serialized form.
fn slot_field<T: Record>(slot: &Slot<T>, field: &str) -> Option<Value> {
    match slot {
        Slot::Raw(raw) => raw.get(field).cloned(),
        Slot::Materialized(record) => {
            serde_json::to_value(record).ok().and_then(|v| v.get(field).cloned())
        }
    }
}

/// Normalize a scalar JSON value to its key form. Arrays, objects and null
/// are never natural keys.
fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lazy iterator over a [`LazyCollection`].
///
/// Yields owned records (clones of the memoized values) so the borrow rules
/// stay simple for callers. A materialization failure is yielded in place of
/// that record; iteration may continue past it.
pub struct Iter<'a, T: Record> {
    collection: &'a mut LazyCollection<T>,
    indices: Vec<usize>,
    pos: usize,
}

impl<T: Record> Iter<'_, T> {
    /// Return the cursor to the first record.
    pub fn reset(&mut self) {
        self.pos = 0;
    }
}

impl<T: Record> Iterator for Iter<'_, T> {
    type Item = Result<T, MaterializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&index) = self.indices.get(self.pos) {
            self.pos += 1;
            match self.collection.get(index) {
                Ok(Some(record)) => return Some(Ok(record.clone())),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}
