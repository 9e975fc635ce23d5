// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative mapping rules.
//!
//! A [`RecordMapping`] is plain data: an ordered list of [`FieldRule`]s, each
//! naming a domain field, where it lives on the wire, what kind of value it
//! holds, and an optional value transform. Nothing here performs I/O.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use suitebridge_core::record::INTERNAL_ID_KEY;
use suitebridge_core::{DomainValue, FieldSet, RecordType};

use crate::path::CUSTOM_FIELD_LIST;

/// Type of value a domain field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    /// Zone-qualified instant. Naive wire values are rejected.
    Timestamp,
    Date,
    /// `{internalId, name}` record reference.
    Reference,
    List,
}

impl FieldKind {
    /// Whether a domain value may be written to a field of this kind.
    ///
    /// `Null` and the empty string are accepted everywhere so that a field
    /// can be cleared and an empty wire value survives a round trip.
    pub fn accepts(self, value: &DomainValue) -> bool {
        match (self, value) {
            (_, DomainValue::Null) => true,
            (_, DomainValue::Text(s)) if s.is_empty() => true,
            (FieldKind::Text, DomainValue::Text(_))
            | (FieldKind::Integer, DomainValue::Integer(_))
            | (FieldKind::Decimal, DomainValue::Decimal(_))
            | (FieldKind::Boolean, DomainValue::Boolean(_))
            | (FieldKind::Timestamp, DomainValue::Timestamp(_))
            | (FieldKind::Date, DomainValue::Date(_))
            | (FieldKind::Reference, DomainValue::Reference { .. })
            | (FieldKind::List, DomainValue::List(_)) => true,
            _ => false,
        }
    }
}

/// Bidirectional value transform applied after decoding (forward) and before
/// encoding (reverse).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// `(wire, domain)` pairs for enumerated text values. Unlisted values pass
    /// through unless they collide with a listed wire value.
    ValueMap(Vec<(String, String)>),
    /// Wire flag is the negation of the domain flag (`isInactive` vs `active`).
    InvertBool,
}

impl Transform {
    pub fn value_map<I, W, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (W, D)>,
        W: Into<String>,
        D: Into<String>,
    {
        Transform::ValueMap(
            pairs
                .into_iter()
                .map(|(w, d)| (w.into(), d.into()))
                .collect(),
        )
    }

    pub(crate) fn forward(&self, value: DomainValue) -> DomainValue {
        match (self, value) {
            (Transform::ValueMap(pairs), DomainValue::Text(s)) => DomainValue::Text(
                pairs
                    .iter()
                    .find(|(wire, _)| *wire == s)
                    .map(|(_, domain)| domain.clone())
                    .unwrap_or(s),
            ),
            (Transform::InvertBool, DomainValue::Boolean(b)) => DomainValue::Boolean(!b),
            (_, value) => value,
        }
    }

    /// Inverse of [`forward`](Self::forward).
    ///
    /// An unlisted domain value that equals a listed wire value is rejected:
    /// it would be rewritten on the way back in.
    pub(crate) fn reverse(&self, value: DomainValue) -> Result<DomainValue, String> {
        match (self, value) {
            (Transform::ValueMap(pairs), DomainValue::Text(s)) => {
                if let Some((wire, _)) = pairs.iter().find(|(_, domain)| *domain == s) {
                    return Ok(DomainValue::Text(wire.clone()));
                }
                if let Some((_, domain)) = pairs.iter().find(|(wire, _)| *wire == s) {
                    return Err(format!("`{s}` is a wire value; use `{domain}`"));
                }
                Ok(DomainValue::Text(s))
            }
            (Transform::InvertBool, DomainValue::Boolean(b)) => Ok(DomainValue::Boolean(!b)),
            (_, value) => Ok(value),
        }
    }
}

/// Where a domain field lives on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePath {
    /// Dotted path through nested objects. Segments match with or without a
    /// namespace prefix.
    Dotted(String),
    /// Custom field located by internal key, resolved to an account-specific
    /// script id at mapping time.
    CustomField(String),
}

impl WirePath {
    /// Top-level wire field that must be fetched to read this path.
    pub fn top_level(&self) -> &str {
        match self {
            WirePath::Dotted(path) => path.split('.').next().unwrap_or(path),
            WirePath::CustomField(_) => CUSTOM_FIELD_LIST,
        }
    }
}

impl fmt::Display for WirePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WirePath::Dotted(path) => f.write_str(path),
            WirePath::CustomField(key) => write!(f, "customField[{key}]"),
        }
    }
}

/// Mapping rule for one domain field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: String,
    /// Candidate locations, tried in order. The first present one wins; the
    /// first one is also where writes go.
    pub paths: Vec<WirePath>,
    pub kind: FieldKind,
    pub transform: Transform,
    pub required: bool,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            paths: Vec::new(),
            kind,
            transform: Transform::Identity,
            required: false,
        }
    }

    /// Rule for a custom field addressed by internal key.
    pub fn custom(name: impl Into<String>, internal_key: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind).custom_key(internal_key)
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(WirePath::Dotted(path.into()));
        self
    }

    pub fn custom_key(mut self, internal_key: impl Into<String>) -> Self {
        self.paths.push(WirePath::CustomField(internal_key.into()));
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_custom(&self) -> bool {
        self.paths
            .iter()
            .any(|p| matches!(p, WirePath::CustomField(_)))
    }

    /// Human-readable list of candidate paths for error messages.
    pub fn describe_paths(&self) -> String {
        self.paths
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// All mapping rules for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMapping {
    record_type: RecordType,
    rules: Vec<FieldRule>,
}

impl RecordMapping {
    pub fn new(record_type: impl Into<RecordType>) -> Self {
        Self {
            record_type: record_type.into(),
            rules: Vec::new(),
        }
    }

    /// Adds a rule. A rule with the same name replaces the earlier one.
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.rules.retain(|r| r.name != rule.name);
        self.rules.push(rule);
        self
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Names from `selection` that have no rule, in input order.
    pub fn unknown_fields<'a>(&self, selection: &'a [String]) -> Vec<&'a str> {
        selection
            .iter()
            .map(String::as_str)
            .filter(|name| self.rule(name).is_none())
            .collect()
    }

    /// Backend search column for a domain field, if it maps to a plain path.
    pub fn search_column(&self, name: &str) -> Option<&str> {
        self.rule(name)?.paths.iter().find_map(|p| match p {
            WirePath::Dotted(path) => Some(path.as_str()),
            WirePath::CustomField(_) => None,
        })
    }

    /// Top-level backend fields needed to map `selection` (all rules when empty).
    ///
    /// Always includes the internal id.
    pub fn backend_fields(&self, selection: &[String]) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.insert(INTERNAL_ID_KEY);
        for rule in self.selected(selection) {
            for path in &rule.paths {
                fields.insert(path.top_level());
            }
        }
        fields
    }

    /// Rules for `selection`, or every rule when the selection is empty.
    /// Unknown names are skipped.
    pub fn selected<'a>(&'a self, selection: &'a [String]) -> impl Iterator<Item = &'a FieldRule> {
        self.rules
            .iter()
            .filter(move |r| selection.is_empty() || selection.iter().any(|s| *s == r.name))
    }
}
