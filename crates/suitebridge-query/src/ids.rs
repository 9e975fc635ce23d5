// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record id filters: explicit sets and bounded inclusive ranges.
//!
//! Accepted forms for `ids`: `42`, `1,2,3`, `[1,2,3]`, `1-100`, and mixes
//! such as `1,5-10,15`. The `id_range` parameter takes `start,end`.
//! Every malformed token is reported; nothing is silently dropped.

use std::collections::BTreeSet;

use suitebridge_core::{RecordId, Violation};

/// A validated id filter. Iteration is ascending and distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    Set(BTreeSet<RecordId>),
    /// Inclusive on both ends.
    Range { start: RecordId, end: RecordId },
}

impl IdFilter {
    /// Number of ids the filter selects.
    pub fn len(&self) -> u64 {
        match self {
            IdFilter::Set(ids) => ids.len() as u64,
            IdFilter::Range { start, end } => end.0 - start.0 + 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: RecordId) -> bool {
        match self {
            IdFilter::Set(ids) => ids.contains(&id),
            IdFilter::Range { start, end } => (*start..=*end).contains(&id),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = RecordId> + '_> {
        match self {
            IdFilter::Set(ids) => Box::new(ids.iter().copied()),
            IdFilter::Range { start, end } => Box::new((start.0..=end.0).map(RecordId)),
        }
    }

    pub fn to_vec(&self) -> Vec<RecordId> {
        self.iter().collect()
    }
}

/// Parses the `ids` parameter.
pub fn parse_ids(input: &str, max: u64) -> Result<IdFilter, Vec<Violation>> {
    const FIELD: &str = "ids";

    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return Err(vec![Violation::new(FIELD, input, "no ids given")]);
    }

    let mut violations = Vec::new();
    let mut pieces = Vec::with_capacity(parts.len());
    for part in &parts {
        let parsed = match part.split_once('-') {
            Some((start, end)) => parse_span(FIELD, part, start, end, max),
            None => parse_one(FIELD, part).map(|id| (id, id)),
        };
        match parsed {
            Ok(span) => pieces.push(span),
            Err(v) => violations.push(v),
        }
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    if let [(start, end)] = pieces.as_slice()
        && start != end
    {
        return Ok(IdFilter::Range {
            start: *start,
            end: *end,
        });
    }

    let mut ids = BTreeSet::new();
    for (start, end) in pieces {
        for id in start.0..=end.0 {
            ids.insert(RecordId(id));
            if ids.len() as u64 > max {
                return Err(vec![too_many(FIELD, input, max)]);
            }
        }
    }
    Ok(IdFilter::Set(ids))
}

/// Parses the `id_range` parameter (`start,end`, inclusive).
pub fn parse_id_range(input: &str, max: u64) -> Result<IdFilter, Vec<Violation>> {
    const FIELD: &str = "id_range";

    let Some((start, end)) = input.split_once(',') else {
        return Err(vec![Violation::new(
            FIELD,
            input,
            "expected `start,end`",
        )]);
    };
    let (start, end) = parse_span(FIELD, input, start, end, max).map_err(|v| vec![v])?;
    Ok(IdFilter::Range { start, end })
}

fn parse_one(field: &str, token: &str) -> Result<RecordId, Violation> {
    match token.trim().parse::<u64>() {
        Ok(0) => Err(Violation::new(field, token, "ids start at 1")),
        Ok(id) => Ok(RecordId(id)),
        Err(_) => Err(Violation::new(field, token, "not a positive integer id")),
    }
}

fn parse_span(
    field: &str,
    token: &str,
    start: &str,
    end: &str,
    max: u64,
) -> Result<(RecordId, RecordId), Violation> {
    let start = parse_one(field, start).map_err(|v| Violation { value: token.to_string(), ..v })?;
    let end = parse_one(field, end).map_err(|v| Violation { value: token.to_string(), ..v })?;
    if start > end {
        return Err(Violation::new(field, token, "range start is after range end"));
    }
    if end.0 - start.0 + 1 > max {
        return Err(too_many(field, token, max));
    }
    Ok((start, end))
}

fn too_many(field: &str, token: &str, max: u64) -> Violation {
    Violation::new(field, token, format!("selects more than {max} ids"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(filter: &IdFilter) -> Vec<u64> {
        filter.iter().map(|id| id.0).collect()
    }

    #[test]
    fn parses_single_set_and_brackets() {
        assert_eq!(ids(&parse_ids("42", 10).unwrap()), vec![42]);
        assert_eq!(ids(&parse_ids("3, 1,2", 10).unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&parse_ids("[1,2,3]", 10).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn mixed_ranges_merge_and_dedupe() {
        let filter = parse_ids("1,5-8,6,15", 100).unwrap();
        assert_eq!(ids(&filter), vec![1, 5, 6, 7, 8, 15]);
        assert_eq!(filter.len(), 6);
    }

    #[test]
    fn single_range_stays_a_range() {
        let filter = parse_ids("10-19", 100).unwrap();
        assert_eq!(
            filter,
            IdFilter::Range {
                start: RecordId(10),
                end: RecordId(19)
            }
        );
        assert!(filter.contains(RecordId(15)));
        assert!(!filter.contains(RecordId(20)));
    }

    #[test]
    fn every_bad_token_is_reported() {
        let violations = parse_ids("1,abc,0,9-3", 100).unwrap_err();
        let values: Vec<_> = violations.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["abc", "0", "9-3"]);
    }

    #[test]
    fn union_above_max_is_rejected() {
        let violations = parse_ids("1-6,10-15", 10).unwrap_err();
        assert!(violations[0].reason.contains("more than 10"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(parse_ids("[]", 10).is_err());
        assert!(parse_ids(" , ", 10).is_err());
    }

    #[test]
    fn id_range_parameter() {
        let filter = parse_id_range("100,199", 1000).unwrap();
        assert_eq!(filter.len(), 100);
        assert!(parse_id_range("100", 1000).is_err());
        assert!(parse_id_range("1,10001", 10_000).is_err());
        assert!(parse_id_range("1,10000", 10_000).is_ok());
    }
}
