// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL cache of wire fragments keyed by exact field set.

use std::time::Duration;

use dashmap::DashMap;
use suitebridge_config::CacheConfig;
use suitebridge_core::{FieldSet, RecordId, RecordType, WireFragment};
use tokio::time::Instant;
use tracing::debug;

/// Identifies one cached fragment. Entries for different field sets never mix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_type: RecordType,
    pub id: RecordId,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(record_type: &RecordType, id: RecordId, fields: &FieldSet) -> Self {
        Self::with_fingerprint(record_type, id, fields.fingerprint())
    }

    pub(crate) fn with_fingerprint(record_type: &RecordType, id: RecordId, fingerprint: String) -> Self {
        Self {
            record_type: record_type.clone(),
            id,
            fingerprint,
        }
    }
}

#[derive(Debug)]
struct Entry {
    fragment: WireFragment,
    stored_at: Instant,
}

/// Shared field cache. Inserts replace the previous entry and reset its TTL.
#[derive(Debug)]
pub struct FieldCache {
    entries: DashMap<CacheKey, Entry>,
    ttl: Duration,
    enabled: bool,
}

impl FieldCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            enabled: true,
        }
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.ttl())
        } else {
            Self::disabled()
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a fresh fragment for `key`, dropping it if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<WireFragment> {
        if !self.enabled {
            return None;
        }
        let fresh = self
            .entries
            .get(key)
            .map(|entry| (self.is_fresh(&entry), entry.fragment.clone()));
        match fresh {
            Some((true, fragment)) => Some(fragment),
            Some((false, _)) => {
                self.entries.remove_if(key, |_, entry| !self.is_fresh(entry));
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, fragment: WireFragment) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key,
            Entry {
                fragment,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every entry for one record, whatever its field set. Returns the count removed.
    pub fn invalidate(&self, record_type: &RecordType, id: RecordId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !(key.id == id && &key.record_type == record_type));
        let removed = before.saturating_sub(self.entries.len());
        debug!(record_type = %record_type, id = %id, removed, "field cache invalidated");
        removed
    }

    /// Drops every expired entry. Returns the count removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }
}
