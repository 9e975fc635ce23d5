// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The immutable, validated request descriptor.

use suitebridge_config::QueryConfig;
use suitebridge_core::{PageToken, RecordId, RecordType, SortDirection, SuitebridgeError, Violation};
use suitebridge_mapping::RecordMapping;

use crate::dates::{DateRange, parse_range};
use crate::ids::{IdFilter, parse_id_range, parse_ids};

/// Limits applied while building a [`QuerySpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_id_range: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QueryLimits {
    fn from(config: &QueryConfig) -> Self {
        Self {
            max_id_range: config.max_id_range,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// Requested and effective page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub requested: Option<u32>,
    pub effective: u32,
    /// True when `effective` differs from what was requested.
    pub adjusted: bool,
}

impl PageSize {
    fn clamp(requested: Option<u32>, limits: &QueryLimits) -> Self {
        let effective = requested
            .unwrap_or(limits.default_page_size)
            .clamp(1, limits.max_page_size.max(1));
        Self {
            requested,
            effective,
            adjusted: requested.is_some_and(|r| r != effective),
        }
    }
}

/// Sort key, validated against the record mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Domain field name.
    pub field: String,
    /// Backend column the field maps to.
    pub column: String,
    pub direction: SortDirection,
}

/// Performance and visibility flags passed to the backend search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    pub body_fields_only: bool,
    pub fast: bool,
    pub include_inactive: bool,
}

/// A validated record query.
///
/// When a page token is present the backend search is already fixed and the
/// filters are not re-sent.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    record_type: RecordType,
    ids: Option<IdFilter>,
    created: Option<DateRange>,
    updated: Option<DateRange>,
    fields: Vec<String>,
    page_size: PageSize,
    page_token: Option<PageToken>,
    sort: Option<Sort>,
    search: Option<String>,
    subsidiary_id: Option<RecordId>,
    flags: QueryFlags,
}

impl QuerySpec {
    pub fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::default()
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn ids(&self) -> Option<&IdFilter> {
        self.ids.as_ref()
    }

    pub fn created(&self) -> Option<&DateRange> {
        self.created.as_ref()
    }

    pub fn updated(&self) -> Option<&DateRange> {
        self.updated.as_ref()
    }

    /// Selected domain fields. Empty means every mapped field.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn page_token(&self) -> Option<&PageToken> {
        self.page_token.as_ref()
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn subsidiary_id(&self) -> Option<RecordId> {
        self.subsidiary_id
    }

    pub fn flags(&self) -> QueryFlags {
        self.flags
    }

    /// Same query, continued at `token`.
    pub fn with_page_token(&self, token: PageToken) -> Self {
        Self {
            page_token: Some(token),
            ..self.clone()
        }
    }
}

/// Collects raw caller intent. Nothing is validated until [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct QuerySpecBuilder {
    ids: Option<String>,
    id_range: Option<String>,
    created_since: Option<String>,
    created_before: Option<String>,
    updated_since: Option<String>,
    updated_before: Option<String>,
    fields: Vec<String>,
    page_size: Option<u32>,
    page_token: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    search: Option<String>,
    subsidiary_id: Option<String>,
    flags: QueryFlags,
}

impl QuerySpecBuilder {
    /// `42`, `1,2,3`, `[1,2,3]`, `1-100` or mixes thereof.
    pub fn ids(mut self, ids: impl Into<String>) -> Self {
        self.ids = Some(ids.into());
        self
    }

    /// Inclusive `start,end`.
    pub fn id_range(mut self, range: impl Into<String>) -> Self {
        self.id_range = Some(range.into());
        self
    }

    pub fn created_since(mut self, ts: impl Into<String>) -> Self {
        self.created_since = Some(ts.into());
        self
    }

    pub fn created_before(mut self, ts: impl Into<String>) -> Self {
        self.created_before = Some(ts.into());
        self
    }

    pub fn updated_since(mut self, ts: impl Into<String>) -> Self {
        self.updated_since = Some(ts.into());
        self
    }

    pub fn updated_before(mut self, ts: impl Into<String>) -> Self {
        self.updated_before = Some(ts.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Comma-separated field list, as received from a query string.
    pub fn fields_csv(self, fields: &str) -> Self {
        self.fields(fields.split(',').map(str::trim).filter(|f| !f.is_empty()))
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    /// `asc` or `desc`, case-insensitive.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn subsidiary_id(mut self, id: impl Into<String>) -> Self {
        self.subsidiary_id = Some(id.into());
        self
    }

    pub fn body_fields_only(mut self, on: bool) -> Self {
        self.flags.body_fields_only = on;
        self
    }

    pub fn fast(mut self, on: bool) -> Self {
        self.flags.fast = on;
        self
    }

    pub fn include_inactive(mut self, on: bool) -> Self {
        self.flags.include_inactive = on;
        self
    }

    /// Validates everything at once against `mapping` and `limits`.
    ///
    /// Fails with a single validation error listing every violation.
    pub fn build(
        self,
        mapping: &RecordMapping,
        limits: &QueryLimits,
    ) -> Result<QuerySpec, SuitebridgeError> {
        let mut violations = Vec::new();

        let ids = match (&self.ids, &self.id_range) {
            (Some(ids), Some(_)) => {
                violations.push(Violation::new(
                    "id_range",
                    ids.as_str(),
                    "cannot be combined with ids",
                ));
                None
            }
            (Some(ids), None) => collect(parse_ids(ids, limits.max_id_range), &mut violations),
            (None, Some(range)) => {
                collect(parse_id_range(range, limits.max_id_range), &mut violations)
            }
            (None, None) => None,
        };

        let created = parse_range(
            "created",
            self.created_since.as_deref(),
            self.created_before.as_deref(),
            &mut violations,
        );
        let updated = parse_range(
            "updated",
            self.updated_since.as_deref(),
            self.updated_before.as_deref(),
            &mut violations,
        );

        let mut fields: Vec<String> = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let field = field.trim().to_string();
            if field.is_empty() || fields.contains(&field) {
                continue;
            }
            if mapping.rule(&field).is_none() {
                violations.push(Violation::new(
                    "fields",
                    field.as_str(),
                    format!("unknown field for {}", mapping.record_type()),
                ));
            }
            fields.push(field);
        }

        let direction = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortDirection::default(),
            Some(order) => order.parse().unwrap_or_else(|_| {
                violations.push(Violation::new("order", order, "expected `asc` or `desc`"));
                SortDirection::default()
            }),
        };
        let sort = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(field) => match mapping.search_column(field) {
                Some(column) => Some(Sort {
                    field: field.to_string(),
                    column: column.to_string(),
                    direction,
                }),
                None => {
                    violations.push(Violation::new(
                        "sort_by",
                        field,
                        format!("not a sortable field for {}", mapping.record_type()),
                    ));
                    None
                }
            },
        };

        let page_token = match self.page_token.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                violations.push(Violation::new("page_token", "", "must not be empty"));
                None
            }
            Some(token) => Some(PageToken::new(token)),
        };

        let subsidiary_id = self.subsidiary_id.as_deref().and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(id) if id > 0 => Some(RecordId(id)),
                _ => {
                    violations.push(Violation::new(
                        "subsidiary_id",
                        raw,
                        "not a positive integer id",
                    ));
                    None
                }
            }
        });

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if !violations.is_empty() {
            return Err(SuitebridgeError::Validation { violations });
        }

        let page_size = PageSize::clamp(self.page_size, limits);
        if page_size.adjusted {
            tracing::debug!(
                requested = ?page_size.requested,
                effective = page_size.effective,
                "page size clamped"
            );
        }

        Ok(QuerySpec {
            record_type: mapping.record_type().clone(),
            ids,
            created,
            updated,
            fields,
            page_size,
            page_token,
            sort,
            search,
            subsidiary_id,
            flags: self.flags,
        })
    }
}

fn collect<T>(result: Result<T, Vec<Violation>>, violations: &mut Vec<Violation>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(mut found) => {
            violations.append(&mut found);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use suitebridge_core::ErrorKind;
    use suitebridge_mapping::builtin;

    use super::*;

    fn limits() -> QueryLimits {
        QueryLimits::default()
    }

    #[test]
    fn empty_builder_uses_defaults() {
        let spec = QuerySpec::builder()
            .build(&builtin::customer(), &limits())
            .unwrap();
        assert_eq!(spec.record_type().as_str(), "customer");
        assert_eq!(spec.page_size().effective, 20);
        assert!(!spec.page_size().adjusted);
        assert!(spec.ids().is_none());
        assert!(spec.fields().is_empty());
        assert_eq!(spec.flags(), QueryFlags::default());
    }

    #[test]
    fn page_size_is_clamped_and_flagged() {
        let big = QuerySpec::builder()
            .page_size(5000)
            .build(&builtin::customer(), &limits())
            .unwrap();
        assert_eq!(big.page_size().effective, 1000);
        assert!(big.page_size().adjusted);
        assert_eq!(big.page_size().requested, Some(5000));

        let zero = QuerySpec::builder()
            .page_size(0)
            .build(&builtin::customer(), &limits())
            .unwrap();
        assert_eq!(zero.page_size().effective, 1);
        assert!(zero.page_size().adjusted);
    }

    #[test]
    fn every_violation_is_aggregated() {
        let err = QuerySpec::builder()
            .ids("1,x")
            .created_since("2024-01-01T00:00:00")
            .fields_csv("name,nmae")
            .sort_by("shoe_size")
            .order("sideways")
            .subsidiary_id("-3")
            .build(&builtin::customer(), &limits())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["ids", "created_since", "fields", "order", "sort_by", "subsidiary_id"]
        );
        assert!(err.to_string().contains("nmae"));
    }

    #[test]
    fn ids_and_id_range_are_exclusive() {
        let err = QuerySpec::builder()
            .ids("1,2")
            .id_range("1,5")
            .build(&builtin::customer(), &limits())
            .unwrap_err();
        assert_eq!(err.violations()[0].field, "id_range");
    }

    #[test]
    fn sort_resolves_backend_column() {
        let spec = QuerySpec::builder()
            .sort_by("updated_at")
            .order("DESC")
            .build(&builtin::customer(), &limits())
            .unwrap();
        let sort = spec.sort().unwrap();
        assert_eq!(sort.column, "lastModifiedDate");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn fields_are_deduplicated_in_order() {
        let spec = QuerySpec::builder()
            .fields_csv("email, name,email")
            .build(&builtin::customer(), &limits())
            .unwrap();
        assert_eq!(spec.fields(), ["email".to_string(), "name".to_string()]);
    }

    #[test]
    fn blank_search_term_is_dropped() {
        let spec = QuerySpec::builder()
            .search("   ")
            .subsidiary_id("3")
            .build(&builtin::customer(), &limits())
            .unwrap();
        assert_eq!(spec.search(), None);
        assert_eq!(spec.subsidiary_id(), Some(RecordId(3)));
    }

    #[test]
    fn with_page_token_keeps_filters() {
        let spec = QuerySpec::builder()
            .ids("1-50")
            .build(&builtin::customer(), &limits())
            .unwrap();
        let next = spec.with_page_token(PageToken::new("WEBSERVICES_1_2"));
        assert_eq!(next.page_token().map(PageToken::as_str), Some("WEBSERVICES_1_2"));
        assert_eq!(next.ids(), spec.ids());
    }
}
