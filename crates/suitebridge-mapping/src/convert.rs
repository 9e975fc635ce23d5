// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between wire JSON values and typed domain values.
//!
//! Errors are returned as plain reasons; the engine attaches field and path.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use suitebridge_core::DomainValue;
use suitebridge_core::record::INTERNAL_ID_KEY;

use crate::path::child;
use crate::rule::FieldKind;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decodes a wire value for a field of `kind`.
///
/// Explicit `null` and the empty string are kept as `Null` and `Text("")`
/// for every kind.
pub(crate) fn decode(kind: FieldKind, value: &Value) -> Result<DomainValue, String> {
    match value {
        Value::Null => return Ok(DomainValue::Null),
        Value::String(s) if s.is_empty() => return Ok(DomainValue::Text(String::new())),
        _ => {}
    }

    match kind {
        FieldKind::Text => match value {
            Value::String(s) => Ok(DomainValue::Text(s.clone())),
            Value::Number(n) => Ok(DomainValue::Text(n.to_string())),
            Value::Bool(b) => Ok(DomainValue::Text(b.to_string())),
            other => Err(mismatch("text", other)),
        },
        FieldKind::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .map(DomainValue::Integer)
                .ok_or_else(|| format!("`{n}` is not an integer")),
            Value::String(s) => s
                .trim()
                .parse()
                .map(DomainValue::Integer)
                .map_err(|_| format!("`{s}` is not an integer")),
            other => Err(mismatch("integer", other)),
        },
        FieldKind::Decimal => match value {
            Value::Number(n) => n
                .as_f64()
                .map(DomainValue::Decimal)
                .ok_or_else(|| format!("`{n}` is not a decimal")),
            Value::String(s) => s
                .trim()
                .parse()
                .map(DomainValue::Decimal)
                .map_err(|_| format!("`{s}` is not a decimal")),
            other => Err(mismatch("decimal", other)),
        },
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(DomainValue::Boolean(*b)),
            Value::String(s) => match s.trim() {
                "true" | "T" => Ok(DomainValue::Boolean(true)),
                "false" | "F" => Ok(DomainValue::Boolean(false)),
                _ => Err(format!("`{s}` is not a boolean")),
            },
            other => Err(mismatch("boolean", other)),
        },
        FieldKind::Timestamp => match value {
            Value::String(s) => parse_timestamp(s).map(DomainValue::Timestamp),
            other => Err(mismatch("timestamp", other)),
        },
        FieldKind::Date => match value {
            Value::String(s) => parse_date(s).map(DomainValue::Date),
            other => Err(mismatch("date", other)),
        },
        FieldKind::Reference => decode_reference(value),
        FieldKind::List => match value {
            Value::Array(items) => Ok(DomainValue::List(items.iter().map(infer).collect())),
            // Reference lists arrive wrapped as `{"recordRef": [...]}`.
            Value::Object(wrapper) if wrapper.len() == 1 => match wrapper.values().next() {
                Some(Value::Array(items)) => Ok(DomainValue::List(items.iter().map(infer).collect())),
                _ => Err(mismatch("list", value)),
            },
            other => Err(mismatch("list", other)),
        },
    }
}

/// Encodes a domain value for the wire. `Absent` is never encoded.
pub(crate) fn encode(value: &DomainValue) -> Result<Value, String> {
    Ok(match value {
        DomainValue::Absent => return Err("absent values are not written".to_string()),
        DomainValue::Null => Value::Null,
        DomainValue::Text(s) => Value::String(s.clone()),
        DomainValue::Integer(i) => Value::Number((*i).into()),
        DomainValue::Decimal(d) => Number::from_f64(*d)
            .map(Value::Number)
            .ok_or_else(|| format!("{d} is not a finite number"))?,
        DomainValue::Boolean(b) => Value::Bool(*b),
        DomainValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        DomainValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        DomainValue::Reference { id, name } => {
            let mut object = Map::new();
            object.insert(INTERNAL_ID_KEY.to_string(), Value::String(id.clone()));
            if let Some(name) = name {
                object.insert("name".to_string(), Value::String(name.clone()));
            }
            Value::Object(object)
        }
        DomainValue::List(items) => Value::Array(items.iter().map(encode).collect::<Result<_, _>>()?),
    })
}

/// Parses an RFC 3339 instant, rejecting values without a zone.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<chrono::FixedOffset>, String> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).map_err(|_| {
        if s.parse::<NaiveDateTime>().is_ok() {
            format!("timestamp `{s}` has no timezone offset")
        } else {
            format!("`{s}` is not an RFC 3339 timestamp")
        }
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|ts| ts.date_naive()))
        .map_err(|_| format!("`{s}` is not a date"))
}

fn decode_reference(value: &Value) -> Result<DomainValue, String> {
    match value {
        Value::String(s) => Ok(DomainValue::Reference {
            id: s.clone(),
            name: None,
        }),
        Value::Number(n) => Ok(DomainValue::Reference {
            id: n.to_string(),
            name: None,
        }),
        Value::Object(object) => reference_from_object(object)
            .ok_or_else(|| "reference has no internalId".to_string()),
        other => Err(mismatch("reference", other)),
    }
}

fn reference_from_object(object: &Map<String, Value>) -> Option<DomainValue> {
    let id = match child(object, INTERNAL_ID_KEY)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let name = child(object, "name").and_then(Value::as_str).map(str::to_string);
    Some(DomainValue::Reference { id, name })
}

/// Best-effort typing for list items, whose kind is not declared.
fn infer(value: &Value) -> DomainValue {
    match value {
        Value::Null => DomainValue::Null,
        Value::Bool(b) => DomainValue::Boolean(*b),
        Value::Number(n) => n
            .as_i64()
            .map(DomainValue::Integer)
            .or_else(|| n.as_f64().map(DomainValue::Decimal))
            .unwrap_or_else(|| DomainValue::Text(n.to_string())),
        Value::String(s) => DomainValue::Text(s.clone()),
        Value::Array(items) => DomainValue::List(items.iter().map(infer).collect()),
        Value::Object(object) => reference_from_object(object)
            .unwrap_or_else(|| DomainValue::Text(value.to_string())),
    }
}

fn mismatch(expected: &str, found: &Value) -> String {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("expected {expected}, found {found}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_and_empty_string_stay_distinct() {
        for kind in [FieldKind::Text, FieldKind::Integer, FieldKind::Timestamp] {
            assert_eq!(decode(kind, &Value::Null).unwrap(), DomainValue::Null);
            assert_eq!(
                decode(kind, &json!("")).unwrap(),
                DomainValue::Text(String::new())
            );
        }
    }

    #[test]
    fn numeric_strings_decode() {
        assert_eq!(
            decode(FieldKind::Integer, &json!("42")).unwrap(),
            DomainValue::Integer(42)
        );
        assert_eq!(
            decode(FieldKind::Decimal, &json!("1250.75")).unwrap(),
            DomainValue::Decimal(1250.75)
        );
        assert!(decode(FieldKind::Integer, &json!("4.2")).is_err());
    }

    #[test]
    fn naive_timestamp_is_rejected() {
        let err = decode(FieldKind::Timestamp, &json!("2024-03-01T10:00:00")).unwrap_err();
        assert!(err.contains("no timezone offset"), "got: {err}");
        let ok = decode(FieldKind::Timestamp, &json!("2024-03-01T10:00:00-08:00")).unwrap();
        match ok {
            DomainValue::Timestamp(ts) => assert_eq!(ts.offset().local_minus_utc(), -8 * 3600),
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn reference_accepts_prefixed_object_and_scalar() {
        let v = decode(
            FieldKind::Reference,
            &json!({ "platformCore:internalId": "12", "platformCore:name": "Parent Co" }),
        )
        .unwrap();
        assert_eq!(
            v,
            DomainValue::Reference {
                id: "12".into(),
                name: Some("Parent Co".into())
            }
        );
        assert_eq!(
            decode(FieldKind::Reference, &json!(7)).unwrap(),
            DomainValue::Reference {
                id: "7".into(),
                name: None
            }
        );
    }

    #[test]
    fn wrapped_reference_list_decodes() {
        let v = decode(
            FieldKind::List,
            &json!({ "recordRef": [{ "internalId": "1" }, { "internalId": "2", "name": "B" }] }),
        )
        .unwrap();
        let DomainValue::List(items) = v else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(encode(&items[1]).unwrap(), json!({ "internalId": "2", "name": "B" }));
    }

    #[test]
    fn encode_rejects_non_finite_decimal() {
        assert!(encode(&DomainValue::Decimal(f64::NAN)).is_err());
        assert!(encode(&DomainValue::Absent).is_err());
    }
}
