// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend collaborator traits and the request/response shapes they exchange.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::failure::BackendFailure;
use crate::record::WireFragment;
use crate::types::{Credentials, FieldSet, RecordId, RecordType, SortDirection};

/// Comparison operator of a search criterion, in backend spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SearchOperator {
    /// Value is one of a list (ids, references).
    AnyOf,
    /// Exact match on a single value.
    Is,
    /// Timestamp at or after the given instant.
    OnOrAfter,
    /// Timestamp strictly before the given instant.
    Before,
    /// Substring match, used for keyword search.
    Contains,
}

/// A single search criterion sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Backend search column, e.g. `internalId` or `lastModifiedDate`.
    pub field: String,
    /// How `search_value` is compared against the column.
    pub operator: SearchOperator,
    /// A scalar for `is`/date operators, an array for `anyOf`.
    pub search_value: serde_json::Value,
}

/// Result ordering applied by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Backend column to sort on.
    pub field: String,
    pub direction: SortDirection,
}

/// Initial search request. Continuations never resend it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Record type being searched.
    pub record_type: RecordType,
    /// Criteria combined with AND. Empty matches every record.
    pub criteria: Vec<Criterion>,
    /// Effective page size, already clamped.
    pub page_size: u32,
    /// Backend ordering. `None` leaves the backend default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Skip sublists when the backend supports it.
    pub body_fields_only: bool,
    /// Backend "fast" hint. Advisory only.
    pub fast: bool,
}

/// One page of a backend search: identities plus continuation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Continuation handle. Absent when the backend did not open a stateful search.
    pub search_id: Option<String>,
    /// Matches across every page of the search.
    pub total_records: u64,
    /// Number of pages at the search's page size.
    pub total_pages: u32,
    /// 1-based page index.
    pub page_index: u32,
    /// Identities on this page, in backend order.
    pub ids: Vec<RecordId>,
}

/// Result of one field-fetch call. Identities missing from both maps were not returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchBatch {
    /// Identities that were returned, projected to the requested fields.
    pub fragments: BTreeMap<RecordId, WireFragment>,
    /// Identities the backend reported an error for.
    pub failures: BTreeMap<RecordId, BackendFailure>,
}

/// Scripted search protocol: initial search and numbered continuation.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Opens a search and returns its first page.
    async fn search(
        &self,
        credentials: &Credentials,
        request: &SearchRequest,
    ) -> Result<SearchPage, BackendFailure>;

    /// Fetches `page_index` of an open search by its backend-issued id.
    async fn search_more(
        &self,
        credentials: &Credentials,
        search_id: &str,
        page_index: u32,
    ) -> Result<SearchPage, BackendFailure>;
}

/// Batched field fetch: a set of identities plus field names yields wire fragments.
#[async_trait]
pub trait FieldFetcher: Send + Sync {
    /// Fetches `fields` for every id in one call.
    ///
    /// A call-level error fails the whole batch. Per-identity errors belong
    /// in [`FetchBatch::failures`].
    async fn fetch_fields(
        &self,
        credentials: &Credentials,
        record_type: &RecordType,
        ids: &[RecordId],
        fields: &FieldSet,
    ) -> Result<FetchBatch, BackendFailure>;
}

/// Resolves a custom field's account-specific script id from its internal key.
pub trait CustomFieldResolver: Send + Sync {
    /// Returns `None` when the account has no such custom field.
    fn resolve(&self, record_type: &RecordType, internal_key: &str) -> Option<String>;
}

/// Resolver backed by a fixed table, keyed by (record type, internal key).
#[derive(Debug, Clone, Default)]
pub struct StaticCustomFieldResolver {
    /// Script id per (record type, internal key).
    entries: BTreeMap<(RecordType, String), String>,
}

impl StaticCustomFieldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one entry, replacing any earlier one for the same key.
    pub fn with(
        mut self,
        record_type: impl Into<RecordType>,
        internal_key: impl Into<String>,
        script_id: impl Into<String>,
    ) -> Self {
        self.entries
            .insert((record_type.into(), internal_key.into()), script_id.into());
        self
    }
}

impl CustomFieldResolver for StaticCustomFieldResolver {
    fn resolve(&self, record_type: &RecordType, internal_key: &str) -> Option<String> {
        self.entries
            .get(&(record_type.clone(), internal_key.to_string()))
            .cloned()
    }
}
