// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translates a [`QuerySpec`] into backend search criteria.

use chrono::SecondsFormat;
use serde_json::{Value, json};
use suitebridge_core::traits::{Criterion, SearchOperator, SearchRequest, SortSpec};
use suitebridge_mapping::{RecordMapping, WirePath};
use suitebridge_query::{DateRange, QuerySpec};

// Columns used when a mapping has no `created_at`/`updated_at` rule.
const CREATED_COLUMN: &str = "dateCreated";
const UPDATED_COLUMN: &str = "lastModifiedDate";
const INACTIVE_COLUMN: &str = "isInactive";
const TEXT_COLUMN: &str = "_text";

/// Builds the initial search request for `spec`.
pub fn search_request(spec: &QuerySpec, mapping: &RecordMapping) -> SearchRequest {
    let flags = spec.flags();
    SearchRequest {
        record_type: spec.record_type().clone(),
        criteria: build_criteria(spec, mapping),
        page_size: spec.page_size().effective,
        sort: spec.sort().map(|sort| SortSpec {
            field: sort.column.clone(),
            direction: sort.direction,
        }),
        body_fields_only: flags.body_fields_only,
        fast: flags.fast,
    }
}

/// Search criteria for every filter set on `spec`.
///
/// Both ends of a date range are sent, against the column the mapping reads
/// `created_at` or `updated_at` from. The inactive filter only applies to
/// record types that map `isInactive`.
pub fn build_criteria(spec: &QuerySpec, mapping: &RecordMapping) -> Vec<Criterion> {
    let mut criteria = Vec::new();

    if let Some(ids) = spec.ids() {
        let values: Vec<Value> = ids.iter().map(|id| Value::String(id.to_string())).collect();
        criteria.push(match <[Value; 1]>::try_from(values) {
            Ok([single]) => criterion("internalId", SearchOperator::Is, single),
            Err(values) => criterion("internalId", SearchOperator::AnyOf, Value::Array(values)),
        });
    }

    if let Some(range) = spec.created() {
        let column = mapping.search_column("created_at").unwrap_or(CREATED_COLUMN);
        push_range(&mut criteria, column, range);
    }
    if let Some(range) = spec.updated() {
        let column = mapping.search_column("updated_at").unwrap_or(UPDATED_COLUMN);
        push_range(&mut criteria, column, range);
    }

    if let Some(term) = spec.search() {
        criteria.push(criterion(TEXT_COLUMN, SearchOperator::Contains, json!(term)));
    }

    if let Some(subsidiary) = spec.subsidiary_id() {
        criteria.push(criterion(
            "subsidiary",
            SearchOperator::AnyOf,
            json!([{ "internalId": subsidiary.to_string() }]),
        ));
    }

    if !spec.flags().include_inactive && maps_column(mapping, INACTIVE_COLUMN) {
        criteria.push(criterion(INACTIVE_COLUMN, SearchOperator::Is, json!(false)));
    }

    criteria
}

fn push_range(criteria: &mut Vec<Criterion>, column: &str, range: &DateRange) {
    if let Some(since) = range.since {
        criteria.push(criterion(
            column,
            SearchOperator::OnOrAfter,
            json!(since.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ));
    }
    if let Some(before) = range.before {
        criteria.push(criterion(
            column,
            SearchOperator::Before,
            json!(before.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ));
    }
}

fn criterion(field: &str, operator: SearchOperator, search_value: Value) -> Criterion {
    Criterion {
        field: field.to_string(),
        operator,
        search_value,
    }
}

fn maps_column(mapping: &RecordMapping, column: &str) -> bool {
    mapping
        .rules()
        .iter()
        .flat_map(|rule| &rule.paths)
        .any(|path| matches!(path, WirePath::Dotted(p) if p == column))
}

#[cfg(test)]
mod tests {
    use suitebridge_mapping::builtin;
    use suitebridge_query::QueryLimits;

    use super::*;

    fn build(builder: suitebridge_query::QuerySpecBuilder, mapping: &RecordMapping) -> Vec<Criterion> {
        let spec = builder.build(mapping, &QueryLimits::default()).unwrap();
        build_criteria(&spec, mapping)
    }

    #[test]
    fn customer_defaults_exclude_inactive() {
        let criteria = build(QuerySpec::builder(), &builtin::customer());
        assert_eq!(
            criteria,
            vec![criterion("isInactive", SearchOperator::Is, json!(false))]
        );
    }

    #[test]
    fn include_inactive_drops_the_filter() {
        let criteria = build(
            QuerySpec::builder().include_inactive(true),
            &builtin::customer(),
        );
        assert!(criteria.is_empty());
    }

    #[test]
    fn invoices_have_no_inactive_filter() {
        assert!(build(QuerySpec::builder(), &builtin::invoice()).is_empty());
    }

    #[test]
    fn ids_become_any_of_or_is() {
        let many = build(QuerySpec::builder().ids("1-3"), &builtin::invoice());
        assert_eq!(
            many,
            vec![criterion("internalId", SearchOperator::AnyOf, json!(["1", "2", "3"]))]
        );
        let one = build(QuerySpec::builder().ids("42"), &builtin::invoice());
        assert_eq!(one, vec![criterion("internalId", SearchOperator::Is, json!("42"))]);
    }

    #[test]
    fn both_ends_of_a_date_range_are_sent() {
        let criteria = build(
            QuerySpec::builder()
                .updated_since("2024-01-01T00:00:00Z")
                .updated_before("2024-02-01T00:00:00+01:00"),
            &builtin::invoice(),
        );
        assert_eq!(
            criteria,
            vec![
                criterion(
                    "lastModifiedDate",
                    SearchOperator::OnOrAfter,
                    json!("2024-01-01T00:00:00Z")
                ),
                criterion(
                    "lastModifiedDate",
                    SearchOperator::Before,
                    json!("2024-02-01T00:00:00+01:00")
                ),
            ]
        );
    }

    #[test]
    fn created_range_uses_the_mapped_column() {
        let since = QuerySpec::builder().created_since("2024-01-01T00:00:00Z");
        let invoice = build(since.clone(), &builtin::invoice());
        assert_eq!(invoice[0].field, "createdDate");
        let customer = build(since.include_inactive(true), &builtin::customer());
        assert_eq!(customer[0].field, "dateCreated");

        let bare = RecordMapping::new("note").field(
            suitebridge_mapping::FieldRule::new("title", suitebridge_mapping::FieldKind::Text)
                .path("title"),
        );
        let fallback = build(
            QuerySpec::builder().updated_since("2024-01-01T00:00:00Z"),
            &bare,
        );
        assert_eq!(fallback[0].field, "lastModifiedDate");
    }

    #[test]
    fn search_term_and_subsidiary() {
        let criteria = build(
            QuerySpec::builder().search("acme").subsidiary_id("7"),
            &builtin::invoice(),
        );
        assert_eq!(
            criteria,
            vec![
                criterion("_text", SearchOperator::Contains, json!("acme")),
                criterion(
                    "subsidiary",
                    SearchOperator::AnyOf,
                    json!([{ "internalId": "7" }])
                ),
            ]
        );
    }

    #[test]
    fn request_carries_sort_and_flags() {
        let mapping = builtin::invoice();
        let spec = QuerySpec::builder()
            .sort_by("tran_date")
            .order("desc")
            .page_size(50)
            .fast(true)
            .build(&mapping, &QueryLimits::default())
            .unwrap();
        let request = search_request(&spec, &mapping);
        assert_eq!(request.page_size, 50);
        assert!(request.fast);
        let sort = request.sort.unwrap();
        assert_eq!(sort.field, "tranDate");
        assert_eq!(sort.direction, suitebridge_core::SortDirection::Desc);
    }
}
