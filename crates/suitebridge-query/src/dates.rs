// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zone-qualified date range filters.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use suitebridge_core::Violation;

/// Half-open instant range: `since <= t < before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub since: Option<DateTime<FixedOffset>>,
    pub before: Option<DateTime<FixedOffset>>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.before.is_none()
    }
}

/// Parses an RFC 3339 instant. Values without a zone are rejected, never
/// defaulted to UTC.
pub fn parse_instant(field: &str, input: &str) -> Result<DateTime<FixedOffset>, Violation> {
    let s = input.trim();
    DateTime::parse_from_rfc3339(s).map_err(|_| {
        let reason = if s.parse::<NaiveDateTime>().is_ok() {
            "timestamp has no timezone offset; add `Z` or an offset such as `+02:00`"
        } else if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
            "date has no time or timezone; use a full RFC 3339 timestamp"
        } else {
            "not an RFC 3339 timestamp"
        };
        Violation::new(field, input, reason)
    })
}

/// Builds a range from optional `since`/`before` inputs, collecting violations.
///
/// `prefix` names the filter (`created`, `updated`) in violation messages.
pub(crate) fn parse_range(
    prefix: &str,
    since: Option<&str>,
    before: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<DateRange> {
    let since_field = format!("{prefix}_since");
    let before_field = format!("{prefix}_before");

    let mut parse = |field: &str, input: Option<&str>| match input.map(|s| parse_instant(field, s)) {
        Some(Ok(ts)) => Some(ts),
        Some(Err(v)) => {
            violations.push(v);
            None
        }
        None => None,
    };
    let range = DateRange {
        since: parse(&since_field, since),
        before: parse(&before_field, before),
    };

    if let (Some(since_ts), Some(before_ts)) = (range.since, range.before)
        && since_ts >= before_ts
    {
        violations.push(Violation::new(
            since_field,
            since.unwrap_or_default(),
            format!("must be before {before_field}"),
        ));
    }

    (!range.is_empty()).then_some(range)
}
