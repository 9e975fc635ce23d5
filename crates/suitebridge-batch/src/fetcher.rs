// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batched field fetching with cache lookup and in-flight coalescing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use suitebridge_config::{BackendConfig, BatchConfig};
use suitebridge_core::traits::FetchBatch;
use suitebridge_core::{
    Credentials, DiagnosticEvent, DiagnosticSink, FieldFetcher, FieldSet, RecordId, RecordType,
    SuitebridgeError, WireFragment,
};
use suitebridge_resilience::{ErrorTranslator, Operation};
use tokio::sync::watch;
use tracing::{Instrument, debug, info_span};

use crate::cache::{CacheKey, FieldCache};
use crate::limit::ConcurrencyLimit;

/// Per-identity result of a field fetch.
pub type FetchOutcome = Result<WireFragment, SuitebridgeError>;

/// Grouping and deadline settings for field fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub max_batch_size: usize,
    pub parallel: bool,
    pub call_timeout: Option<Duration>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default(), &BackendConfig::default())
    }
}

impl BatchSettings {
    pub fn from_config(batch: &BatchConfig, backend: &BackendConfig) -> Self {
        Self {
            max_batch_size: batch.max_batch_size.max(1),
            parallel: batch.parallel,
            call_timeout: Some(backend.call_timeout()),
        }
    }
}

/// Post-fetch hook, run once per backend batch before results are cached.
#[async_trait]
pub trait BatchTransform: Send + Sync {
    async fn apply(
        &self,
        record_type: &RecordType,
        fragments: &mut BTreeMap<RecordId, WireFragment>,
    ) -> Result<(), SuitebridgeError>;
}

type FlightResult = Option<FetchOutcome>;

#[derive(Debug)]
struct Flight {
    token: u64,
    rx: watch::Receiver<FlightResult>,
}

/// Removes a leader's in-flight entries when it finishes or is dropped.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<CacheKey, Flight>,
    keys: Vec<CacheKey>,
    token: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        for key in &self.keys {
            self.in_flight.remove_if(key, |_, flight| flight.token == self.token);
        }
    }
}

/// Fetches wire fragments for sets of identities.
pub struct BatchFetcher {
    backend: Arc<dyn FieldFetcher>,
    cache: Arc<FieldCache>,
    limit: ConcurrencyLimit,
    translator: ErrorTranslator,
    sink: Arc<dyn DiagnosticSink>,
    settings: BatchSettings,
    transform: Option<Arc<dyn BatchTransform>>,
    in_flight: DashMap<CacheKey, Flight>,
    next_token: AtomicU64,
}

impl BatchFetcher {
    pub fn new(
        backend: Arc<dyn FieldFetcher>,
        cache: Arc<FieldCache>,
        limit: ConcurrencyLimit,
        translator: ErrorTranslator,
        sink: Arc<dyn DiagnosticSink>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            backend,
            cache,
            limit,
            translator,
            sink,
            settings,
            transform: None,
            in_flight: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn BatchTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    pub fn limit(&self) -> &ConcurrencyLimit {
        &self.limit
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Returns one outcome per distinct requested identity.
    ///
    /// Fresh cache entries for the exact field set are served without a
    /// backend call. Identities already being fetched by another caller wait
    /// for that result; if that caller goes away first, they are fetched here.
    pub async fn fetch(
        &self,
        credentials: &Credentials,
        record_type: &RecordType,
        ids: &[RecordId],
        fields: &FieldSet,
    ) -> BTreeMap<RecordId, FetchOutcome> {
        let fingerprint = fields.fingerprint();
        let key = |id: RecordId| CacheKey::with_fingerprint(record_type, id, fingerprint.clone());
        let distinct: BTreeSet<RecordId> = ids.iter().copied().collect();

        let mut results = BTreeMap::new();
        let mut misses = Vec::new();
        for id in distinct {
            match self.cache.get(&key(id)) {
                Some(fragment) => {
                    results.insert(id, Ok(fragment));
                }
                None => misses.push(id),
            }
        }
        if !results.is_empty() {
            self.sink.emit(DiagnosticEvent::CacheHit {
                record_type: record_type.clone(),
                count: results.len(),
            });
        }
        if misses.is_empty() {
            return results;
        }
        self.sink.emit(DiagnosticEvent::CacheMiss {
            record_type: record_type.clone(),
            count: misses.len(),
        });

        // Claim each missing key or join the caller already fetching it.
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut senders = BTreeMap::new();
        let mut followers = Vec::new();
        for id in misses {
            match self.in_flight.entry(key(id)) {
                Entry::Occupied(flight) => followers.push((id, flight.get().rx.clone())),
                Entry::Vacant(slot) => {
                    let (tx, rx) = watch::channel(None);
                    slot.insert(Flight { token, rx });
                    senders.insert(id, tx);
                }
            }
        }

        if !senders.is_empty() {
            let guard = FlightGuard {
                in_flight: &self.in_flight,
                keys: senders.keys().map(|id| key(*id)).collect(),
                token,
            };
            let owned: Vec<RecordId> = senders.keys().copied().collect();
            let fetched = self.fetch_groups(credentials, record_type, owned, fields).await;
            for (id, outcome) in fetched {
                if let Some(tx) = senders.get(&id) {
                    tx.send_replace(Some(outcome.clone()));
                }
                results.insert(id, outcome);
            }
            drop(guard);
        }

        let mut orphaned = Vec::new();
        for (id, mut rx) in followers {
            let waited = rx.wait_for(Option::is_some).await.map(|value| (*value).clone());
            let shared = match waited {
                Ok(value) => value,
                Err(_) => rx.borrow().clone(),
            };
            match shared {
                Some(outcome) => {
                    results.insert(id, outcome);
                }
                None => orphaned.push(id),
            }
        }
        if !orphaned.is_empty() {
            debug!(
                record_type = %record_type,
                count = orphaned.len(),
                "coalesced fetch abandoned, fetching directly"
            );
            results.extend(self.fetch_groups(credentials, record_type, orphaned, fields).await);
        }
        results
    }

    /// Splits `ids` into bounded groups and fetches each with one backend call.
    async fn fetch_groups(
        &self,
        credentials: &Credentials,
        record_type: &RecordType,
        ids: Vec<RecordId>,
        fields: &FieldSet,
    ) -> BTreeMap<RecordId, FetchOutcome> {
        let groups: Vec<Vec<RecordId>> = ids
            .chunks(self.settings.max_batch_size)
            .map(<[RecordId]>::to_vec)
            .collect();
        let group_count = groups.len();

        let outcomes = if self.settings.parallel {
            join_all(groups.into_iter().enumerate().map(|(index, group)| {
                self.fetch_group(credentials, record_type, group, fields)
                    .instrument(info_span!("fetch_group", index, of = group_count))
            }))
            .await
        } else {
            let mut outcomes = Vec::with_capacity(group_count);
            for (index, group) in groups.into_iter().enumerate() {
                outcomes.push(
                    self.fetch_group(credentials, record_type, group, fields)
                        .instrument(info_span!("fetch_group", index, of = group_count))
                        .await,
                );
            }
            outcomes
        };
        outcomes.into_iter().flatten().collect()
    }

    async fn fetch_group(
        &self,
        credentials: &Credentials,
        record_type: &RecordType,
        ids: Vec<RecordId>,
        fields: &FieldSet,
    ) -> BTreeMap<RecordId, FetchOutcome> {
        let mut op = Operation::read("fetch_fields").record_type(record_type);
        if let Some(timeout) = self.settings.call_timeout {
            op = op.timeout(timeout);
        }

        let batch = match self.limit.acquire().await {
            Ok(_permit) => {
                debug!(record_type = %record_type, ids = ids.len(), fields = fields.len(), "fetching field batch");
                self.translator
                    .call(&op, || {
                        self.backend
                            .fetch_fields(credentials, record_type, &ids, fields)
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        let FetchBatch {
            mut fragments,
            failures,
        } = match batch {
            Ok(batch) => batch,
            Err(error) => return self.fail_all(record_type, &ids, &error),
        };

        let requested: BTreeSet<RecordId> = ids.iter().copied().collect();
        fragments.retain(|id, _| requested.contains(id));
        if let Some(transform) = &self.transform
            && let Err(error) = transform.apply(record_type, &mut fragments).await
        {
            return self.fail_all(record_type, &ids, &error);
        }

        let mut outcomes = BTreeMap::new();
        for id in ids {
            let outcome = if let Some(fragment) = fragments.remove(&id) {
                self.cache.insert(
                    CacheKey::new(record_type, id, fields),
                    fragment.clone(),
                );
                Ok(fragment)
            } else if let Some(failure) = failures.get(&id) {
                Err(self
                    .translator
                    .translate(failure, &op.clone().record_id(id)))
            } else {
                Err(SuitebridgeError::RecordNotFound {
                    record_type: record_type.to_string(),
                    record_id: id.to_string(),
                })
            };
            if let Err(error) = &outcome {
                self.sink.emit(DiagnosticEvent::FetchFailed {
                    record_type: record_type.clone(),
                    kind: error.kind(),
                });
            }
            outcomes.insert(id, outcome);
        }
        outcomes
    }

    fn fail_all(
        &self,
        record_type: &RecordType,
        ids: &[RecordId],
        error: &SuitebridgeError,
    ) -> BTreeMap<RecordId, FetchOutcome> {
        for _ in ids {
            self.sink.emit(DiagnosticEvent::FetchFailed {
                record_type: record_type.clone(),
                kind: error.kind(),
            });
        }
        ids.iter().map(|id| (*id, Err(error.clone()))).collect()
    }
}

impl std::fmt::Debug for BatchFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFetcher")
            .field("settings", &self.settings)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}
