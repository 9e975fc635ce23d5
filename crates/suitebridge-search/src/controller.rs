// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serves one page of a query: search or continue, fetch fields, map.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use suitebridge_batch::BatchFetcher;
use suitebridge_core::traits::SearchPage;
use suitebridge_core::{
    Credentials, DomainRecord, ErrorKind, Page, PageToken, RecordId, SearchBackend,
    SuitebridgeError,
};
use suitebridge_mapping::{MappingEngine, RecordMapping};
use suitebridge_query::QuerySpec;
use suitebridge_resilience::{ErrorTranslator, Operation};
use tracing::{debug, info, warn};

use crate::continuation::{ContinuationRegistry, ContinuationState, SearchContinuation};
use crate::criteria::search_request;

/// Drives backend searches and continuations for [`QuerySpec`]s.
pub struct SearchController {
    backend: Arc<dyn SearchBackend>,
    fetcher: Arc<BatchFetcher>,
    engine: MappingEngine,
    registry: ContinuationRegistry,
    translator: ErrorTranslator,
    call_timeout: Option<Duration>,
}

impl SearchController {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        fetcher: Arc<BatchFetcher>,
        engine: MappingEngine,
        registry: ContinuationRegistry,
        translator: ErrorTranslator,
    ) -> Self {
        let call_timeout = fetcher.settings().call_timeout;
        Self {
            backend,
            fetcher,
            engine,
            registry,
            translator,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &ContinuationRegistry {
        &self.registry
    }

    /// Returns the page `spec` asks for.
    ///
    /// Without a page token this opens a new backend search. With one, the
    /// next page of that search is served and the filters on `spec` are
    /// ignored; the field selection still applies.
    pub async fn execute(
        &self,
        credentials: &Credentials,
        spec: &QuerySpec,
    ) -> Result<Page<DomainRecord>, SuitebridgeError> {
        let mapping = self.engine.registry().require(spec.record_type())?;
        match spec.page_token() {
            None => self.first_page(credentials, spec, &mapping).await,
            Some(token) => self.next_page(credentials, spec, &mapping, token).await,
        }
    }

    async fn first_page(
        &self,
        credentials: &Credentials,
        spec: &QuerySpec,
        mapping: &RecordMapping,
    ) -> Result<Page<DomainRecord>, SuitebridgeError> {
        let record_type = spec.record_type();
        let request = search_request(spec, mapping);
        let op = self.operation("search").record_type(record_type);

        let page = {
            let _permit = self.fetcher.limit().acquire().await?;
            self.translator
                .call(&op, || self.backend.search(credentials, &request))
                .await?
        };
        check_index(&page, 1)?;
        info!(
            record_type = %record_type,
            total_records = page.total_records,
            total_pages = page.total_pages,
            criteria = request.criteria.len(),
            "search opened"
        );

        let (records, failures) = self.load(credentials, spec, mapping, &page.ids).await?;
        let page_size = spec.page_size().effective;

        let continuation_token = match (&page.search_id, page.total_pages > 1) {
            (_, false) => None,
            (None, true) => {
                return Err(SuitebridgeError::BackendFault {
                    code: "MISSING_SEARCH_ID".to_string(),
                    message: format!(
                        "search reported {} pages but no search id",
                        page.total_pages
                    ),
                });
            }
            (Some(search_id), true) => {
                let continuation =
                    SearchContinuation::from_first_page(search_id, record_type, &page, page_size);
                let token = continuation.token();
                match self.registry.open(continuation) {
                    ContinuationState::Active => Some(token),
                    _ => None,
                }
            }
        };

        Ok(Page {
            records,
            failures,
            total_records: page.total_records,
            total_pages: page.total_pages,
            current_page_index: page.page_index,
            continuation_token,
            page_size,
        })
    }

    async fn next_page(
        &self,
        credentials: &Credentials,
        spec: &QuerySpec,
        mapping: &RecordMapping,
        token: &PageToken,
    ) -> Result<Page<DomainRecord>, SuitebridgeError> {
        let checkout = self.registry.checkout(token)?;
        let Some(continuation) = checkout.continuation().cloned() else {
            return Err(SuitebridgeError::StaleContinuation {
                search_id: token.to_string(),
            });
        };
        if &continuation.record_type != spec.record_type() {
            return Err(SuitebridgeError::invalid(
                "page_token",
                token.as_str(),
                format!(
                    "continuation belongs to {}, not {}",
                    continuation.record_type,
                    spec.record_type()
                ),
            ));
        }

        let expected = continuation.next_page();
        let op = self
            .operation("search_more")
            .record_type(&continuation.record_type)
            .search_id(continuation.search_id.as_str());
        let outcome = {
            let _permit = self.fetcher.limit().acquire().await?;
            self.translator
                .call(&op, || {
                    self.backend
                        .search_more(credentials, &continuation.search_id, expected)
                })
                .await
        };
        let page = match outcome {
            Ok(page) => page,
            Err(error) if error.kind() == ErrorKind::StaleContinuation => {
                checkout.expire("backend rejected search id");
                return Err(error);
            }
            Err(error) => return Err(error),
        };
        check_index(&page, expected)?;

        let (records, failures) = self.load(credentials, spec, mapping, &page.ids).await?;
        let state = checkout.advance(page.page_index, page.total_pages);
        debug!(
            search_id = %continuation.search_id,
            page_index = page.page_index,
            total_pages = page.total_pages,
            state = %state,
            "continuation page served"
        );

        Ok(Page {
            records,
            failures,
            total_records: page.total_records,
            total_pages: page.total_pages,
            current_page_index: page.page_index,
            continuation_token: (state == ContinuationState::Active).then(|| token.clone()),
            page_size: continuation.page_size,
        })
    }

    /// Fetches and maps `ids`, preserving search order.
    ///
    /// Identities that are missing or cannot be mapped are reported per id.
    /// Any other failure fails the page, and the same token can be retried.
    async fn load(
        &self,
        credentials: &Credentials,
        spec: &QuerySpec,
        mapping: &RecordMapping,
        ids: &[RecordId],
    ) -> Result<(Vec<DomainRecord>, BTreeMap<RecordId, SuitebridgeError>), SuitebridgeError> {
        let mut records = Vec::with_capacity(ids.len());
        let mut failures = BTreeMap::new();
        if ids.is_empty() {
            return Ok((records, failures));
        }
        let fields = mapping.backend_fields(spec.fields());
        let mut fetched = self
            .fetcher
            .fetch(credentials, spec.record_type(), ids, &fields)
            .await;

        for id in ids {
            // Duplicate ids on a page were consumed on first sight.
            let Some(outcome) = fetched.remove(id) else {
                continue;
            };
            let mapped = outcome.and_then(|wire| {
                self.engine
                    .to_domain_selected(&wire, spec.record_type(), spec.fields())
            });
            match mapped {
                Ok(record) => records.push(record),
                Err(error) if is_record_scoped(&error) => {
                    warn!(
                        record_type = %spec.record_type(),
                        record_id = %id,
                        kind = %error.kind(),
                        "identity skipped on page"
                    );
                    failures.insert(*id, error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok((records, failures))
    }

    fn operation(&self, name: &str) -> Operation {
        let op = Operation::read(name);
        match self.call_timeout {
            Some(timeout) => op.timeout(timeout),
            None => op,
        }
    }
}

/// Failures that concern one record rather than the call serving the page.
fn is_record_scoped(error: &SuitebridgeError) -> bool {
    matches!(error.kind(), ErrorKind::RecordNotFound | ErrorKind::Mapping)
}

fn check_index(page: &SearchPage, expected: u32) -> Result<(), SuitebridgeError> {
    if page.page_index == expected {
        Ok(())
    } else {
        Err(SuitebridgeError::BackendFault {
            code: "PAGE_SEQUENCE".to_string(),
            message: format!(
                "expected page {expected}, backend returned page {}",
                page.page_index
            ),
        })
    }
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("registry", &self.registry)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
