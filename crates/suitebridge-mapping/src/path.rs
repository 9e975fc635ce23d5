// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dotted-path navigation over namespace-prefixed wire trees.

use serde_json::{Map, Value};

/// Top-level wire field holding custom field entries.
pub const CUSTOM_FIELD_LIST: &str = "customFieldList";
const CUSTOM_FIELD: &str = "customField";
const SCRIPT_ID: &str = "scriptId";
const VALUE: &str = "value";

/// Local part of a key, with any `prefix:` removed.
pub(crate) fn local_name(key: &str) -> &str {
    key.rsplit_once(':').map_or(key, |(_, local)| local)
}

/// Child of an object by segment name. An exact key wins over a prefixed one.
pub(crate) fn child<'a>(object: &'a Map<String, Value>, segment: &str) -> Option<&'a Value> {
    object.get(segment).or_else(|| {
        object
            .iter()
            .find(|(key, _)| local_name(key) == segment)
            .map(|(_, value)| value)
    })
}

/// Value at a dotted path, or `None` when any segment is missing.
///
/// A present explicit `null` is returned as `Some(Value::Null)`.
pub(crate) fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object().and_then(|o| child(o, segment)))
}

/// Value of the custom field whose script id is `script_id`.
///
/// An entry that exists but carries no value reads as `null`.
pub(crate) fn lookup_custom<'a>(root: &'a Value, script_id: &str) -> Option<&'a Value> {
    let list = lookup(root, CUSTOM_FIELD_LIST)?.as_object()?;
    let entries = match child(list, CUSTOM_FIELD)? {
        Value::Array(entries) => entries.as_slice(),
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => return None,
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .find(|entry| child(entry, SCRIPT_ID).and_then(Value::as_str) == Some(script_id))
        .map(|entry| child(entry, VALUE).unwrap_or(&Value::Null))
}

/// Writes `value` at a dotted path, creating intermediate objects.
pub(crate) fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        node = next;
    }
}

/// Appends a `{scriptId, value}` entry to the custom field list.
pub(crate) fn insert_custom(root: &mut Map<String, Value>, script_id: &str, value: Value) {
    let list = root
        .entry(CUSTOM_FIELD_LIST.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !list.is_object() {
        *list = Value::Object(Map::new());
    }
    let Value::Object(list) = list else {
        return;
    };
    let entries = list
        .entry(CUSTOM_FIELD.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entries.is_array() {
        *entries = Value::Array(Vec::new());
    }
    if let Value::Array(entries) = entries {
        let mut entry = Map::new();
        entry.insert(SCRIPT_ID.to_string(), Value::String(script_id.to_string()));
        entry.insert(VALUE.to_string(), value);
        entries.push(Value::Object(entry));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_strips_namespace_prefixes() {
        let wire = json!({
            "platformCore:entityStatus": { "platformCore:name": "Closed Won" },
            "companyName": "Acme"
        });
        assert_eq!(
            lookup(&wire, "entityStatus.name"),
            Some(&json!("Closed Won"))
        );
        assert_eq!(lookup(&wire, "companyName"), Some(&json!("Acme")));
        assert_eq!(lookup(&wire, "entityStatus.internalId"), None);
    }

    #[test]
    fn lookup_distinguishes_null_from_missing() {
        let wire = json!({ "email": null });
        assert_eq!(lookup(&wire, "email"), Some(&Value::Null));
        assert_eq!(lookup(&wire, "phone"), None);
    }

    #[test]
    fn custom_field_found_by_script_id() {
        let wire = json!({
            "customFieldList": {
                "customField": [
                    { "scriptId": "custentity_region", "value": "EMEA" },
                    { "scriptId": "custentity_tier", "value": "gold" }
                ]
            }
        });
        assert_eq!(lookup_custom(&wire, "custentity_tier"), Some(&json!("gold")));
        assert_eq!(lookup_custom(&wire, "custentity_missing"), None);
    }

    #[test]
    fn custom_field_single_entry_object() {
        let wire = json!({
            "platformCore:customFieldList": {
                "platformCore:customField": { "scriptId": "custentity_tier" }
            }
        });
        assert_eq!(lookup_custom(&wire, "custentity_tier"), Some(&Value::Null));
    }

    #[test]
    fn insert_creates_nested_objects() {
        let mut root = Map::new();
        insert(&mut root, "billingAddress.city", json!("Austin"));
        insert(&mut root, "billingAddress.zip", json!("78701"));
        insert_custom(&mut root, "custentity_tier", json!("gold"));
        assert_eq!(
            Value::Object(root),
            json!({
                "billingAddress": { "city": "Austin", "zip": "78701" },
                "customFieldList": {
                    "customField": [{ "scriptId": "custentity_tier", "value": "gold" }]
                }
            })
        );
    }
}
