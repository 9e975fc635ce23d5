// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field mapping engine for Suitebridge.
//!
//! Record mappings are declarative tables ([`RecordMapping`] of
//! [`FieldRule`]s) held in a [`MappingRegistry`]. The [`MappingEngine`] walks
//! those tables to translate loosely-typed, namespace-prefixed wire records
//! into typed domain records and back.

pub mod builtin;
mod convert;
pub mod engine;
mod path;
pub mod registry;
pub mod rule;

pub use engine::MappingEngine;
pub use path::CUSTOM_FIELD_LIST;
pub use registry::MappingRegistry;
pub use rule::{FieldKind, FieldRule, RecordMapping, Transform, WirePath};
