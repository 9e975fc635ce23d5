// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The caller-facing record service.
//!
//! [`RecordService`] owns one set of shared state per deployment: the field
//! cache, the continuation registry and the global backend concurrency limit.
//! It is cheap to share behind an `Arc` and safe to call concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use suitebridge_batch::{
    BatchFetcher, BatchSettings, BatchTransform, ConcurrencyLimit, FetchOutcome, FieldCache,
};
use suitebridge_config::SuitebridgeConfig;
use suitebridge_core::traits::StaticCustomFieldResolver;
use suitebridge_core::{
    Credentials, CustomFieldResolver, DiagnosticSink, DomainRecord, FieldFetcher, FieldSet, Page,
    RecordId, RecordType, SearchBackend, SuitebridgeError, TracingSink, WirePatch, WireRecord,
};
use suitebridge_mapping::{MappingEngine, MappingRegistry, RecordMapping};
use suitebridge_query::{QueryLimits, QuerySpec, QuerySpecBuilder};
use suitebridge_resilience::{ErrorTranslator, RetryPolicy};
use suitebridge_restlet::RestletClient;
use suitebridge_search::{ContinuationRegistry, SearchController};
use tracing::{debug, info};

/// Counts removed by a maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Maintenance {
    pub cache_entries: usize,
    pub continuations: usize,
}

/// Paginated, typed access to backend records.
pub struct RecordService {
    limits: QueryLimits,
    engine: MappingEngine,
    fetcher: Arc<BatchFetcher>,
    controller: SearchController,
}

impl RecordService {
    pub fn builder(config: SuitebridgeConfig) -> RecordServiceBuilder {
        RecordServiceBuilder::new(config)
    }

    /// Builds a service talking to the RESTlet configured under `[backend]`.
    pub fn from_config(config: SuitebridgeConfig) -> Result<Self, SuitebridgeError> {
        Self::builder(config).restlet()?.build()
    }

    pub fn query_limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Validates `builder` against the mapping for `record_type`.
    pub fn query(
        &self,
        record_type: &RecordType,
        builder: QuerySpecBuilder,
    ) -> Result<QuerySpec, SuitebridgeError> {
        let mapping = self.engine.registry().require(record_type)?;
        builder.build(&mapping, &self.limits)
    }

    /// Returns one page of `record_type` records matching `spec`.
    pub async fn execute(
        &self,
        credentials: &Credentials,
        spec: &QuerySpec,
        record_type: &RecordType,
    ) -> Result<Page<DomainRecord>, SuitebridgeError> {
        if spec.record_type() != record_type {
            return Err(SuitebridgeError::invalid(
                "record_type",
                record_type.as_str(),
                format!("query was built for {}", spec.record_type()),
            ));
        }
        self.controller.execute(credentials, spec).await
    }

    /// Fetches `fields` for each identity, one outcome per distinct id.
    ///
    /// `fields` are backend field names. A failure for one identity never
    /// affects the others.
    pub async fn fetch_fields(
        &self,
        credentials: &Credentials,
        ids: &[RecordId],
        fields: &FieldSet,
        record_type: &RecordType,
    ) -> BTreeMap<RecordId, FetchOutcome> {
        self.fetcher
            .fetch(credentials, record_type, ids, fields)
            .await
    }

    pub fn map_to_domain(
        &self,
        wire: &WireRecord,
        record_type: &RecordType,
    ) -> Result<DomainRecord, SuitebridgeError> {
        self.engine.to_domain(wire, record_type)
    }

    pub fn map_to_wire(&self, record: &DomainRecord) -> Result<WirePatch, SuitebridgeError> {
        self.engine.to_wire(record)
    }

    /// Drops cached fragments of one record, e.g. after an update.
    pub fn invalidate(&self, record_type: &RecordType, id: RecordId) -> usize {
        self.fetcher.cache().invalidate(record_type, id)
    }

    /// Evicts stale cache entries and idle continuations.
    pub fn purge_expired(&self) -> Maintenance {
        let removed = Maintenance {
            cache_entries: self.fetcher.cache().purge_expired(),
            continuations: self.controller.registry().purge_idle(),
        };
        debug!(
            cache_entries = removed.cache_entries,
            continuations = removed.continuations,
            "maintenance pass"
        );
        removed
    }

    pub fn open_continuations(&self) -> usize {
        self.controller.registry().len()
    }

    pub fn cached_fragments(&self) -> usize {
        self.fetcher.cache().len()
    }
}

impl std::fmt::Debug for RecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordService")
            .field("limits", &self.limits)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`RecordService`] from configuration and collaborators.
pub struct RecordServiceBuilder {
    config: SuitebridgeConfig,
    search: Option<Arc<dyn SearchBackend>>,
    fetcher: Option<Arc<dyn FieldFetcher>>,
    registry: MappingRegistry,
    resolver: Arc<dyn CustomFieldResolver>,
    sink: Arc<dyn DiagnosticSink>,
    transform: Option<Arc<dyn BatchTransform>>,
}

impl RecordServiceBuilder {
    fn new(config: SuitebridgeConfig) -> Self {
        Self {
            config,
            search: None,
            fetcher: None,
            registry: MappingRegistry::with_builtin(),
            resolver: Arc::new(StaticCustomFieldResolver::new()),
            sink: Arc::new(TracingSink),
            transform: None,
        }
    }

    /// Uses one collaborator for both searching and field fetching.
    pub fn backend<B>(mut self, backend: Arc<B>) -> Self
    where
        B: SearchBackend + FieldFetcher + 'static,
    {
        let search: Arc<dyn SearchBackend> = backend.clone();
        let fetcher: Arc<dyn FieldFetcher> = backend;
        self.search = Some(search);
        self.fetcher = Some(fetcher);
        self
    }

    pub fn search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    pub fn field_fetcher(mut self, fetcher: Arc<dyn FieldFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Uses the RESTlet client described by the `[backend]` section.
    pub fn restlet(self) -> Result<Self, SuitebridgeError> {
        let client = Arc::new(RestletClient::new(&self.config.backend)?);
        Ok(self.backend(client))
    }

    /// Adds or replaces the mapping for one record type.
    pub fn mapping(mut self, mapping: RecordMapping) -> Self {
        self.registry.register(mapping);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn CustomFieldResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn transform(mut self, transform: Arc<dyn BatchTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn build(self) -> Result<RecordService, SuitebridgeError> {
        let (Some(search), Some(field_fetcher)) = (self.search, self.fetcher) else {
            return Err(SuitebridgeError::Config(
                "a search backend and a field fetcher are required".into(),
            ));
        };
        let config = self.config;

        let translator =
            ErrorTranslator::new(RetryPolicy::from(&config.retry), self.sink.clone());
        let mut fetcher = BatchFetcher::new(
            field_fetcher,
            Arc::new(FieldCache::from_config(&config.cache)),
            ConcurrencyLimit::new(config.batch.max_concurrency),
            translator.clone(),
            self.sink.clone(),
            BatchSettings::from_config(&config.batch, &config.backend),
        );
        if let Some(transform) = self.transform {
            fetcher = fetcher.with_transform(transform);
        }
        let fetcher = Arc::new(fetcher);

        let engine = MappingEngine::new(Arc::new(self.registry), self.resolver);
        let registry = ContinuationRegistry::from_config(&config.search, self.sink);
        let controller = SearchController::new(
            search,
            fetcher.clone(),
            engine.clone(),
            registry,
            translator,
        );

        info!(
            record_types = engine.registry().record_types().len(),
            max_batch_size = config.batch.max_batch_size,
            max_concurrency = config.batch.max_concurrency,
            cache_enabled = config.cache.enabled,
            "record service ready"
        );
        Ok(RecordService {
            limits: QueryLimits::from(&config.query),
            engine,
            fetcher,
            controller,
        })
    }
}

impl std::fmt::Debug for RecordServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordServiceBuilder")
            .field("has_search", &self.search.is_some())
            .field("has_fetcher", &self.fetcher.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use suitebridge_config::BackendConfig;

    use super::*;

    #[test]
    fn build_without_backend_is_a_config_error() {
        let err = RecordService::builder(SuitebridgeConfig::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, SuitebridgeError::Config(_)));
    }

    #[test]
    fn from_config_requires_restlet_settings() {
        let err = RecordService::from_config(SuitebridgeConfig::default()).unwrap_err();
        assert!(matches!(err, SuitebridgeError::Config(ref m) if m.contains("script_id")));
    }

    #[tokio::test]
    async fn from_config_builds_with_restlet() {
        let config = SuitebridgeConfig {
            backend: BackendConfig {
                account: Some("TSTDRV1".into()),
                script_id: Some("12".into()),
                deploy_id: Some("1".into()),
                ..BackendConfig::default()
            },
            ..SuitebridgeConfig::default()
        };
        let service = RecordService::from_config(config).unwrap();
        assert_eq!(service.query_limits().max_id_range, 10_000);
        assert_eq!(service.open_continuations(), 0);
    }
}
