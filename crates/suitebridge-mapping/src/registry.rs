// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of record mappings, indexed by record type.

use std::collections::HashMap;
use std::sync::Arc;

use suitebridge_core::{RecordType, SuitebridgeError};

use crate::builtin;
use crate::rule::RecordMapping;

/// Registry of declarative record mappings.
///
/// Adding a record type means registering a [`RecordMapping`]; the engine's
/// dispatch never changes.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: HashMap<RecordType, Arc<RecordMapping>>,
}

impl MappingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `customer` and `invoice` mappings.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(builtin::customer());
        registry.register(builtin::invoice());
        registry
    }

    /// Registers a mapping, replacing any existing one for the same record type.
    pub fn register(&mut self, mapping: RecordMapping) {
        tracing::debug!(
            record_type = %mapping.record_type(),
            fields = mapping.rules().len(),
            "registered record mapping"
        );
        self.mappings
            .insert(mapping.record_type().clone(), Arc::new(mapping));
    }

    pub fn get(&self, record_type: &RecordType) -> Option<Arc<RecordMapping>> {
        self.mappings.get(record_type).cloned()
    }

    /// Looks up a mapping, failing with a validation error for unknown types.
    pub fn require(&self, record_type: &RecordType) -> Result<Arc<RecordMapping>, SuitebridgeError> {
        self.get(record_type).ok_or_else(|| {
            SuitebridgeError::invalid(
                "record_type",
                record_type.as_str(),
                "no mapping registered for this record type",
            )
        })
    }

    /// Registered record types, sorted.
    pub fn record_types(&self) -> Vec<&RecordType> {
        let mut types: Vec<_> = self.mappings.keys().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use suitebridge_core::ErrorKind;

    use super::*;
    use crate::rule::{FieldKind, FieldRule};

    #[test]
    fn builtin_registry_has_customer_and_invoice() {
        let registry = MappingRegistry::with_builtin();
        let types: Vec<_> = registry.record_types().iter().map(|t| t.as_str()).collect();
        assert_eq!(types, vec!["customer", "invoice"]);
    }

    #[test]
    fn unknown_record_type_is_a_validation_error() {
        let registry = MappingRegistry::with_builtin();
        let err = registry.require(&RecordType::new("vendor")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.violations()[0].field, "record_type");
    }

    #[test]
    fn registering_new_type_needs_no_dispatch_change() {
        let mut registry = MappingRegistry::with_builtin();
        registry.register(
            RecordMapping::new("vendor")
                .field(FieldRule::new("name", FieldKind::Text).path("companyName")),
        );
        assert!(registry.require(&RecordType::new("vendor")).is_ok());
    }
}
