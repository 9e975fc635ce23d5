// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validated record queries for Suitebridge.
//!
//! Parses raw caller intent (id filters, date ranges, field selection, page
//! size, sort, flags) into an immutable [`QuerySpec`]. Construction either
//! succeeds completely or fails with one validation error naming every
//! violation.

pub mod dates;
pub mod ids;
pub mod query_spec;

pub use dates::{DateRange, parse_instant};
pub use ids::{IdFilter, parse_id_range, parse_ids};
pub use query_spec::{PageSize, QueryFlags, QueryLimits, QuerySpec, QuerySpecBuilder, Sort};
