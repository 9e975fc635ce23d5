// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity, field-set, and pagination types shared across the workspace.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

use crate::error::{ErrorKind, SuitebridgeError};

/// Backend internal id of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// Name of a backend record type (`customer`, `invoice`, ...), always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(String);

impl RecordType {
    pub fn new(name: impl AsRef<str>) -> Self {
        RecordType(name.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordType {
    fn from(name: &str) -> Self {
        RecordType::new(name)
    }
}

/// An exact, order-insensitive set of backend field names.
///
/// Two sets are interchangeable only when they are equal: the cache never
/// matches a subset or superset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSet(BTreeSet<String>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        self.0.insert(field.into())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Stable hex digest of the sorted field names, used as part of cache keys.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in &self.0 {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(&hasher.finalize()[..12])
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Opaque continuation handle issued by the backend. Never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        PageToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Identities the search returned that could not be served, e.g. records
    /// deleted between the search and the field fetch. They do not block
    /// later pages.
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        serialize_with = "serialize_failures"
    )]
    pub failures: BTreeMap<RecordId, SuitebridgeError>,
    pub total_records: u64,
    pub total_pages: u32,
    /// 1-based index of this page.
    pub current_page_index: u32,
    /// Present while further pages remain.
    pub continuation_token: Option<PageToken>,
    /// Effective page size after clamping.
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// True when every identity on the page was served.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct FailureView {
    kind: ErrorKind,
    message: String,
}

fn serialize_failures<S: Serializer>(
    failures: &BTreeMap<RecordId, SuitebridgeError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(failures.iter().map(|(id, error)| {
        (
            id,
            FailureView {
                kind: error.kind(),
                message: error.to_string(),
            },
        )
    }))
}

/// Caller credentials, passed through to backend adapters untouched.
///
/// The core never inspects or stores these values; adapters expose them only
/// when building an outgoing request.
#[derive(Clone, Default)]
pub struct Credentials {
    headers: Arc<Vec<(String, SecretString)>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates credentials from header name/value pairs supplied by the boundary layer.
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), SecretString::from(v.into())))
            .collect();
        Self {
            headers: Arc::new(headers),
        }
    }

    /// Iterates header pairs, exposing secret values. Adapter use only.
    pub fn expose_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.expose_secret()))
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("headers", &self.headers.len())
            .finish()
    }
}
