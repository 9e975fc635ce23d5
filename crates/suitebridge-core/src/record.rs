// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-shaped and domain-shaped record representations.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{RecordId, RecordType};

/// Wire key holding a record's internal id.
pub const INTERNAL_ID_KEY: &str = "internalId";

/// A backend-shaped, loosely-typed record as produced by a single backend call.
///
/// Keys may carry XML namespace prefixes (`platformCore:name`); resolution of
/// dotted paths is the mapping engine's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireRecord(Value);

/// A wire record restricted to a requested field set.
pub type WireFragment = WireRecord;

impl WireRecord {
    pub fn new(value: Value) -> Self {
        WireRecord(value)
    }

    pub fn empty() -> Self {
        WireRecord(Value::Object(Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for WireRecord {
    fn from(value: Value) -> Self {
        WireRecord(value)
    }
}

/// Outgoing update body holding only the fields a caller explicitly set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePatch {
    pub record_type: RecordType,
    pub id: Option<RecordId>,
    pub body: Map<String, Value>,
}

impl WirePatch {
    pub fn new(record_type: RecordType, id: Option<RecordId>) -> Self {
        Self {
            record_type,
            id,
            body: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Converts the patch into a wire record, carrying the id under `internalId`.
    pub fn into_wire_record(self) -> WireRecord {
        let mut body = self.body;
        if let Some(id) = self.id {
            body.insert(INTERNAL_ID_KEY.to_string(), Value::String(id.to_string()));
        }
        WireRecord(Value::Object(body))
    }
}

/// A typed domain value.
///
/// `Absent` (field omitted on the wire), `Null` (explicit null on the wire)
/// and `Text("")` (empty string on the wire) are distinct states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DomainValue {
    Absent,
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(DateTime<FixedOffset>),
    Date(NaiveDate),
    Reference { id: String, name: Option<String> },
    List(Vec<DomainValue>),
}

impl DomainValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, DomainValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DomainValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

static ABSENT: DomainValue = DomainValue::Absent;

/// Caller-facing record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRecord {
    record_type: RecordType,
    id: Option<RecordId>,
    fields: BTreeMap<String, DomainValue>,
}

impl DomainRecord {
    pub fn builder(record_type: RecordType) -> DomainRecordBuilder {
        DomainRecordBuilder {
            record_type,
            id: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns the value of a field, or `Absent` when it was never set.
    pub fn get(&self, field: &str) -> &DomainValue {
        self.fields.get(field).unwrap_or(&ABSENT)
    }

    /// Returns true if the field holds anything other than `Absent`.
    pub fn is_set(&self, field: &str) -> bool {
        !self.get(field).is_absent()
    }

    /// Iterates explicitly set fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DomainValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`DomainRecord`].
#[derive(Debug)]
pub struct DomainRecordBuilder {
    record_type: RecordType,
    id: Option<RecordId>,
    fields: BTreeMap<String, DomainValue>,
}

impl DomainRecordBuilder {
    pub fn id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets a field. Setting `Absent` unsets it.
    pub fn set(mut self, field: impl Into<String>, value: DomainValue) -> Self {
        let field = field.into();
        if value.is_absent() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
        self
    }

    pub fn build(self) -> DomainRecord {
        DomainRecord {
            record_type: self.record_type,
            id: self.id,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_field_reads_as_absent() {
        let record = DomainRecord::builder(RecordType::new("customer"))
            .set("name", DomainValue::Text("Acme".into()))
            .build();
        assert_eq!(record.get("email"), &DomainValue::Absent);
        assert!(!record.is_set("email"));
        assert!(record.is_set("name"));
    }

    #[test]
    fn setting_absent_removes_field() {
        let record = DomainRecord::builder(RecordType::new("customer"))
            .set("name", DomainValue::Text("Acme".into()))
            .set("name", DomainValue::Absent)
            .build();
        assert!(record.is_empty());
    }

    #[test]
    fn empty_text_null_and_absent_are_distinct() {
        assert_ne!(DomainValue::Text(String::new()), DomainValue::Null);
        assert_ne!(DomainValue::Null, DomainValue::Absent);
        assert_ne!(DomainValue::Text(String::new()), DomainValue::Absent);
    }

    #[test]
    fn patch_into_wire_record_carries_id() {
        let mut patch = WirePatch::new(RecordType::new("customer"), Some(RecordId(42)));
        patch
            .body
            .insert("email".into(), Value::String("a@b.c".into()));
        let wire = patch.into_wire_record();
        assert_eq!(wire.as_value()["internalId"], "42");
        assert_eq!(wire.as_value()["email"], "a@b.c");
    }
}
