// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional translation between wire records and domain records.
//!
//! The engine is pure apart from the injected [`CustomFieldResolver`]: the
//! same wire record and registry always yield the same domain record.

use std::sync::Arc;

use serde_json::{Map, Value};
use suitebridge_core::record::INTERNAL_ID_KEY;
use suitebridge_core::{
    CustomFieldResolver, DomainRecord, DomainValue, RecordId, RecordType, SuitebridgeError,
    WirePatch, WireRecord,
};
use tracing::warn;

use crate::convert::{decode, encode};
use crate::path::{child, insert, insert_custom, lookup, lookup_custom};
use crate::registry::MappingRegistry;
use crate::rule::{FieldRule, RecordMapping, WirePath};

/// Translates wire records to domain records and back using a [`MappingRegistry`].
#[derive(Clone)]
pub struct MappingEngine {
    registry: Arc<MappingRegistry>,
    resolver: Arc<dyn CustomFieldResolver>,
}

impl MappingEngine {
    pub fn new(registry: Arc<MappingRegistry>, resolver: Arc<dyn CustomFieldResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Maps every field of the record type's mapping.
    pub fn to_domain(
        &self,
        wire: &WireRecord,
        record_type: &RecordType,
    ) -> Result<DomainRecord, SuitebridgeError> {
        self.to_domain_selected(wire, record_type, &[])
    }

    /// Maps only the selected domain fields (all when `selection` is empty).
    ///
    /// Required fields outside the selection are not checked, since they were
    /// never fetched.
    pub fn to_domain_selected(
        &self,
        wire: &WireRecord,
        record_type: &RecordType,
        selection: &[String],
    ) -> Result<DomainRecord, SuitebridgeError> {
        let mapping = self.registry.require(record_type)?;
        let root = wire.as_value();
        if !root.is_object() {
            return Err(SuitebridgeError::Mapping {
                field: INTERNAL_ID_KEY.to_string(),
                path: String::new(),
                reason: "wire record is not an object".to_string(),
            });
        }

        let mut builder = DomainRecord::builder(record_type.clone());
        if let Some(id) = read_id(root)? {
            builder = builder.id(id);
        }
        for rule in mapping.selected(selection) {
            let value = self.read_field(&mapping, rule, root)?;
            builder = builder.set(rule.name.clone(), value);
        }
        Ok(builder.build())
    }

    /// Builds an update body holding only the fields set on `record`.
    ///
    /// `Null` is written as an explicit null; unset fields are never written.
    pub fn to_wire(&self, record: &DomainRecord) -> Result<WirePatch, SuitebridgeError> {
        let mapping = self.registry.require(record.record_type())?;
        let mut patch = WirePatch::new(record.record_type().clone(), record.id());

        for (name, value) in record.fields() {
            let rule = mapping.rule(name).ok_or_else(|| SuitebridgeError::Mapping {
                field: name.to_string(),
                path: String::new(),
                reason: "no mapping rule for this field".to_string(),
            })?;
            self.write_field(&mapping, rule, value, &mut patch.body)?;
        }
        Ok(patch)
    }

    fn read_field(
        &self,
        mapping: &RecordMapping,
        rule: &FieldRule,
        root: &Value,
    ) -> Result<DomainValue, SuitebridgeError> {
        for path in &rule.paths {
            let found = match path {
                WirePath::Dotted(dotted) => lookup(root, dotted),
                WirePath::CustomField(key) => {
                    match self.resolver.resolve(mapping.record_type(), key) {
                        Some(script_id) => lookup_custom(root, &script_id),
                        None => {
                            warn!(
                                record_type = %mapping.record_type(),
                                field = %rule.name,
                                internal_key = %key,
                                "custom field key has no script id for this account"
                            );
                            None
                        }
                    }
                }
            };
            if let Some(raw) = found {
                return decode(rule.kind, raw)
                    .map(|value| rule.transform.forward(value))
                    .map_err(|reason| SuitebridgeError::Mapping {
                        field: rule.name.clone(),
                        path: path.to_string(),
                        reason,
                    });
            }
        }

        if rule.required {
            Err(SuitebridgeError::Mapping {
                field: rule.name.clone(),
                path: rule.describe_paths(),
                reason: "required field is missing".to_string(),
            })
        } else {
            Ok(DomainValue::Absent)
        }
    }

    fn write_field(
        &self,
        mapping: &RecordMapping,
        rule: &FieldRule,
        value: &DomainValue,
        body: &mut Map<String, Value>,
    ) -> Result<(), SuitebridgeError> {
        let Some(path) = rule.paths.first() else {
            return Err(SuitebridgeError::Mapping {
                field: rule.name.clone(),
                path: String::new(),
                reason: "rule has no wire path".to_string(),
            });
        };
        let fail = |reason: String| SuitebridgeError::Mapping {
            field: rule.name.clone(),
            path: path.to_string(),
            reason,
        };

        if !rule.kind.accepts(value) {
            return Err(fail(format!("value does not fit a {} field", rule.kind)));
        }
        let reversed = rule.transform.reverse(value.clone()).map_err(&fail)?;
        let wire_value = encode(&reversed).map_err(&fail)?;

        match path {
            WirePath::Dotted(dotted) => insert(body, dotted, wire_value),
            WirePath::CustomField(key) => {
                let script_id = self
                    .resolver
                    .resolve(mapping.record_type(), key)
                    .ok_or_else(|| fail(format!("custom field key `{key}` cannot be resolved")))?;
                insert_custom(body, &script_id, wire_value);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingEngine")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn read_id(root: &Value) -> Result<Option<RecordId>, SuitebridgeError> {
    let Some(raw) = root.as_object().and_then(|o| child(o, INTERNAL_ID_KEY)) else {
        return Ok(None);
    };
    let parsed = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().map(RecordId),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| SuitebridgeError::Mapping {
        field: INTERNAL_ID_KEY.to_string(),
        path: INTERNAL_ID_KEY.to_string(),
        reason: format!("`{raw}` is not a record id"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use suitebridge_core::traits::StaticCustomFieldResolver;
    use suitebridge_core::{ErrorKind, RecordId};

    use super::*;
    use crate::rule::{FieldKind, FieldRule};

    fn engine() -> MappingEngine {
        let mut registry = MappingRegistry::with_builtin();
        registry.register(
            crate::builtin::customer()
                .field(FieldRule::custom("tier", "tier", FieldKind::Text))
                .field(FieldRule::custom("region", "region", FieldKind::Text)),
        );
        let resolver = StaticCustomFieldResolver::new().with("customer", "tier", "custentity_tier");
        MappingEngine::new(Arc::new(registry), Arc::new(resolver))
    }

    #[test]
    fn maps_namespaced_wire_record() {
        let wire = WireRecord::new(json!({
            "platformCore:internalId": "42",
            "listRel:entityId": "CUST-42",
            "listRel:companyName": "Acme",
            "listRel:isInactive": false,
            "listRel:subsidiary": { "internalId": "1", "name": "HQ" },
            "listRel:dateCreated": "2024-01-15T09:30:00-08:00",
            "customFieldList": {
                "customField": [{ "scriptId": "custentity_tier", "value": "gold" }]
            }
        }));
        let record = engine().to_domain(&wire, &RecordType::new("customer")).unwrap();
        assert_eq!(record.id(), Some(RecordId(42)));
        assert_eq!(record.get("name"), &DomainValue::Text("Acme".into()));
        assert_eq!(record.get("active"), &DomainValue::Boolean(true));
        assert_eq!(record.get("tier"), &DomainValue::Text("gold".into()));
        assert!(matches!(record.get("created_at"), DomainValue::Timestamp(_)));
        assert!(record.get("email").is_absent());
    }

    #[test]
    fn first_present_path_wins() {
        let wire = WireRecord::new(json!({ "entityId": "C1", "altName": "Alt Only" }));
        let record = engine().to_domain(&wire, &RecordType::new("customer")).unwrap();
        assert_eq!(record.get("name"), &DomainValue::Text("Alt Only".into()));
    }

    #[test]
    fn empty_null_and_omitted_map_to_distinct_states() {
        let wire = WireRecord::new(json!({ "entityId": "C1", "email": "", "phone": null }));
        let record = engine().to_domain(&wire, &RecordType::new("customer")).unwrap();
        assert_eq!(record.get("email"), &DomainValue::Text(String::new()));
        assert_eq!(record.get("phone"), &DomainValue::Null);
        assert_eq!(record.get("name"), &DomainValue::Absent);
    }

    #[test]
    fn missing_required_field_names_field_and_path() {
        let wire = WireRecord::new(json!({ "companyName": "Acme" }));
        let err = engine()
            .to_domain(&wire, &RecordType::new("customer"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        match err {
            SuitebridgeError::Mapping { field, path, .. } => {
                assert_eq!(field, "entity_id");
                assert_eq!(path, "entityId");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn selection_skips_unselected_required_fields() {
        let wire = WireRecord::new(json!({ "internalId": "5", "email": "a@b.c" }));
        let record = engine()
            .to_domain_selected(&wire, &RecordType::new("customer"), &["email".to_string()])
            .unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.id(), Some(RecordId(5)));
    }

    #[test]
    fn naive_wire_timestamp_is_a_mapping_error() {
        let wire = WireRecord::new(json!({ "entityId": "C1", "lastModifiedDate": "2024-01-15T09:30:00" }));
        let err = engine()
            .to_domain(&wire, &RecordType::new("customer"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        assert!(err.to_string().contains("lastModifiedDate"));
    }

    #[test]
    fn unresolvable_optional_custom_field_is_absent() {
        let wire = WireRecord::new(json!({ "entityId": "C1" }));
        let record = engine().to_domain(&wire, &RecordType::new("customer")).unwrap();
        assert!(record.get("region").is_absent());
    }

    #[test]
    fn to_wire_emits_only_set_fields() {
        let record = DomainRecord::builder(RecordType::new("customer"))
            .id(RecordId(9))
            .set("email", DomainValue::Text("new@acme.test".into()))
            .set("phone", DomainValue::Null)
            .set("active", DomainValue::Boolean(false))
            .set("tier", DomainValue::Text("silver".into()))
            .build();
        let patch = engine().to_wire(&record).unwrap();
        assert_eq!(patch.id, Some(RecordId(9)));
        assert_eq!(
            Value::Object(patch.body),
            json!({
                "email": "new@acme.test",
                "phone": null,
                "isInactive": true,
                "customFieldList": {
                    "customField": [{ "scriptId": "custentity_tier", "value": "silver" }]
                }
            })
        );
    }

    #[test]
    fn to_wire_rejects_kind_mismatch_and_unknown_field() {
        let bad_kind = DomainRecord::builder(RecordType::new("customer"))
            .set("balance", DomainValue::Text("lots".into()))
            .build();
        assert_eq!(engine().to_wire(&bad_kind).unwrap_err().kind(), ErrorKind::Mapping);

        let unknown = DomainRecord::builder(RecordType::new("customer"))
            .set("favourite_colour", DomainValue::Text("blue".into()))
            .build();
        let err = engine().to_wire(&unknown).unwrap_err();
        assert!(err.to_string().contains("favourite_colour"));
    }

    #[test]
    fn invoice_status_is_translated_both_ways() {
        let wire = WireRecord::new(json!({ "tranId": "INV-7", "status": "paidInFull" }));
        let record = engine().to_domain(&wire, &RecordType::new("invoice")).unwrap();
        assert_eq!(record.get("status"), &DomainValue::Text("paid".into()));
        let patch = engine().to_wire(&record).unwrap();
        assert_eq!(patch.body["status"], "paidInFull");
    }

    #[test]
    fn invoice_status_in_wire_spelling_is_rejected() {
        let record = DomainRecord::builder(RecordType::new("invoice"))
            .set("status", DomainValue::Text("paidInFull".into()))
            .build();
        let err = engine().to_wire(&record).unwrap_err();
        assert!(matches!(err, SuitebridgeError::Mapping { ref field, .. } if field == "status"));
    }
}
