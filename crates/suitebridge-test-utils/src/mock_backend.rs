// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory backend implementing both search and field-fetch protocols.
//!
//! `MockBackend` counts every call and can inject faults: expired searches,
//! per-identity failures, silently omitted identities, queued call failures,
//! and artificial latency.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use suitebridge_core::record::INTERNAL_ID_KEY;
use suitebridge_core::traits::{
    FetchBatch, FieldFetcher, SearchBackend, SearchOperator, SearchPage, SearchRequest,
};
use suitebridge_core::{BackendFailure, Credentials, FieldSet, RecordId, RecordType, WireRecord};

/// Backend call kinds, for queued failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Search,
    SearchMore,
    FetchFields,
}

#[derive(Debug)]
struct OpenSearch {
    ids: Vec<RecordId>,
    page_size: usize,
}

#[derive(Debug, Default)]
struct Faults {
    expire_searches: bool,
    failing: BTreeMap<RecordId, BackendFailure>,
    omitted: BTreeSet<RecordId>,
    queued: HashMap<Call, VecDeque<BackendFailure>>,
    fetch_delay: Option<Duration>,
}

/// A deterministic in-memory backend.
pub struct MockBackend {
    records: Mutex<BTreeMap<RecordType, BTreeMap<RecordId, Value>>>,
    searches: Mutex<HashMap<String, OpenSearch>>,
    faults: Mutex<Faults>,
    next_search: AtomicU64,
    search_calls: AtomicUsize,
    search_more_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    fetched_ids: AtomicUsize,
}

impl MockBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            searches: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            next_search: AtomicU64::new(1),
            search_calls: AtomicUsize::new(0),
            search_more_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            fetched_ids: AtomicUsize::new(0),
        }
    }

    /// Create a backend holding customers `1..=count`.
    pub async fn with_customers(count: u64) -> Self {
        let backend = Self::new();
        for id in 1..=count {
            backend
                .insert("customer", RecordId(id), customer_record(id))
                .await;
        }
        backend
    }

    /// Store a full wire record.
    pub async fn insert(&self, record_type: impl Into<RecordType>, id: RecordId, record: Value) {
        self.records
            .lock()
            .await
            .entry(record_type.into())
            .or_default()
            .insert(id, record);
    }

    /// Every later `search_more` reports an invalid search id.
    pub async fn expire_searches(&self) {
        self.faults.lock().await.expire_searches = true;
    }

    /// Field fetches report `failure` for `id`.
    pub async fn fail_id(&self, id: RecordId, failure: BackendFailure) {
        self.faults.lock().await.failing.insert(id, failure);
    }

    /// Field fetches silently leave `id` out of the response.
    pub async fn omit_id(&self, id: RecordId) {
        self.faults.lock().await.omitted.insert(id);
    }

    /// The next call of kind `call` fails with `failure`.
    pub async fn push_failure(&self, call: Call, failure: BackendFailure) {
        self.faults
            .lock()
            .await
            .queued
            .entry(call)
            .or_default()
            .push_back(failure);
    }

    /// Field fetches sleep for `delay` before answering.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        self.faults.lock().await.fetch_delay = Some(delay);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn search_more_calls(&self) -> usize {
        self.search_more_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Total identities requested across all field fetches.
    pub fn fetched_ids(&self) -> usize {
        self.fetched_ids.load(Ordering::SeqCst)
    }

    /// Total backend calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.search_more_calls() + self.fetch_calls()
    }

    async fn take_failure(&self, call: Call) -> Option<BackendFailure> {
        self.faults
            .lock()
            .await
            .queued
            .get_mut(&call)
            .and_then(VecDeque::pop_front)
    }

    async fn page(&self, search_id: &str, page_index: u32) -> Result<SearchPage, BackendFailure> {
        let searches = self.searches.lock().await;
        let open = searches
            .get(search_id)
            .ok_or_else(|| BackendFailure::fault("INVALID_SEARCH_ID", "Invalid search id"))?;
        let total_pages = total_pages(open.ids.len(), open.page_size);
        if page_index == 0 || (page_index > total_pages && total_pages > 0) {
            return Err(BackendFailure::fault(
                "INVALID_PAGE_INDEX",
                format!("page {page_index} out of range 1..={total_pages}"),
            ));
        }
        let start = (page_index as usize - 1) * open.page_size;
        let ids = open
            .ids
            .iter()
            .skip(start)
            .take(open.page_size)
            .copied()
            .collect();
        Ok(SearchPage {
            search_id: Some(search_id.to_string()),
            total_records: open.ids.len() as u64,
            total_pages,
            page_index,
            ids,
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn search(
        &self,
        _credentials: &Credentials,
        request: &SearchRequest,
    ) -> Result<SearchPage, BackendFailure> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.take_failure(Call::Search).await {
            return Err(failure);
        }

        let id_filter: Option<BTreeSet<RecordId>> = request
            .criteria
            .iter()
            .find(|c| c.field == INTERNAL_ID_KEY)
            .map(|c| match (c.operator, &c.search_value) {
                (SearchOperator::AnyOf, Value::Array(values)) => {
                    values.iter().filter_map(parse_id).collect()
                }
                (SearchOperator::Is, value) => parse_id(value).into_iter().collect(),
                _ => BTreeSet::new(),
            });

        let ids: Vec<RecordId> = {
            let records = self.records.lock().await;
            records
                .get(&request.record_type)
                .map(|by_id| {
                    by_id
                        .keys()
                        .filter(|id| id_filter.as_ref().is_none_or(|f| f.contains(id)))
                        .copied()
                        .collect()
                })
                .unwrap_or_default()
        };

        let search_id = format!(
            "WEBSERVICES_MOCK_{}",
            self.next_search.fetch_add(1, Ordering::SeqCst)
        );
        tracing::debug!(search_id = %search_id, matches = ids.len(), "mock search opened");
        self.searches.lock().await.insert(
            search_id.clone(),
            OpenSearch {
                ids,
                page_size: request.page_size.max(1) as usize,
            },
        );
        self.page(&search_id, 1).await
    }

    async fn search_more(
        &self,
        _credentials: &Credentials,
        search_id: &str,
        page_index: u32,
    ) -> Result<SearchPage, BackendFailure> {
        self.search_more_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.take_failure(Call::SearchMore).await {
            return Err(failure);
        }
        if self.faults.lock().await.expire_searches {
            return Err(BackendFailure::fault(
                "USER_ERROR",
                format!("Invalid search id: {search_id}"),
            ));
        }
        self.page(search_id, page_index).await
    }
}

#[async_trait]
impl FieldFetcher for MockBackend {
    async fn fetch_fields(
        &self,
        _credentials: &Credentials,
        record_type: &RecordType,
        ids: &[RecordId],
        fields: &FieldSet,
    ) -> Result<FetchBatch, BackendFailure> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.fetch_add(ids.len(), Ordering::SeqCst);

        let delay = self.faults.lock().await.fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = self.take_failure(Call::FetchFields).await {
            return Err(failure);
        }

        let faults = self.faults.lock().await;
        let records = self.records.lock().await;
        let by_id = records.get(record_type);
        let mut batch = FetchBatch::default();
        for id in ids {
            if let Some(failure) = faults.failing.get(id) {
                batch.failures.insert(*id, failure.clone());
                continue;
            }
            if faults.omitted.contains(id) {
                continue;
            }
            if let Some(Value::Object(record)) = by_id.and_then(|m| m.get(id)) {
                batch
                    .fragments
                    .insert(*id, WireRecord::new(project(record, fields)));
            }
        }
        Ok(batch)
    }
}

/// Keeps the top-level keys whose local name is in `fields` (all when empty).
fn project(record: &Map<String, Value>, fields: &FieldSet) -> Value {
    let kept = record
        .iter()
        .filter(|(key, _)| {
            let local = key.rsplit_once(':').map_or(key.as_str(), |(_, l)| l);
            fields.is_empty() || fields.contains(local)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(kept)
}

fn parse_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_u64().map(RecordId),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn total_pages(records: usize, page_size: usize) -> u32 {
    records.div_ceil(page_size) as u32
}

/// A customer wire record with a few namespaced keys, as the XML protocol returns them.
pub fn customer_record(id: u64) -> Value {
    json!({
        "internalId": id.to_string(),
        "listRel:entityId": format!("CUST-{id}"),
        "listRel:companyName": format!("Customer {id}"),
        "email": format!("customer{id}@example.test"),
        "phone": "",
        "isInactive": false,
        "subsidiary": { "internalId": "1", "name": "Headquarters" },
        "balance": (id as f64) * 10.5,
        "dateCreated": "2023-11-02T08:15:00-07:00",
        "lastModifiedDate": "2024-05-01T12:00:00Z"
    })
}
