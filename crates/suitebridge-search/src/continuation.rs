// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of open backend searches.
//!
//! Each continuation is checked out exclusively while a page is being served.
//! A second request presenting the same token meanwhile gets
//! `StaleContinuation`. A checkout that is dropped without being advanced or
//! expired puts the continuation back unchanged, so a failed page can be
//! retried with the same token.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use strum::Display;
use suitebridge_config::SearchConfig;
use suitebridge_core::traits::SearchPage;
use suitebridge_core::{DiagnosticEvent, DiagnosticSink, PageToken, RecordType, SuitebridgeError};
use tokio::time::Instant;
use tracing::debug;

/// Lifecycle of a search continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ContinuationState {
    Fresh,
    Active,
    Exhausted,
    Expired,
}

/// State of one open backend search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContinuation {
    pub search_id: String,
    pub record_type: RecordType,
    pub total_records: u64,
    pub total_pages: u32,
    /// Index of the last page served (1-based).
    pub page_index: u32,
    pub page_size: u32,
    pub issued_at: Instant,
    pub last_used: Instant,
}

impl SearchContinuation {
    /// Continuation positioned after the first page of `page`.
    pub fn from_first_page(
        search_id: impl Into<String>,
        record_type: &RecordType,
        page: &SearchPage,
        page_size: u32,
    ) -> Self {
        let now = Instant::now();
        Self {
            search_id: search_id.into(),
            record_type: record_type.clone(),
            total_records: page.total_records,
            total_pages: page.total_pages,
            page_index: page.page_index,
            page_size,
            issued_at: now,
            last_used: now,
        }
    }

    pub fn next_page(&self) -> u32 {
        self.page_index + 1
    }

    pub fn state(&self) -> ContinuationState {
        if self.page_index >= self.total_pages {
            ContinuationState::Exhausted
        } else {
            ContinuationState::Active
        }
    }

    pub fn token(&self) -> PageToken {
        PageToken::new(self.search_id.clone())
    }
}

#[derive(Debug)]
enum Slot {
    Idle(SearchContinuation),
    CheckedOut,
}

/// Shared map from backend search id to continuation.
pub struct ContinuationRegistry {
    entries: DashMap<String, Slot>,
    idle_timeout: Duration,
    max_lifetime: Duration,
    sink: Arc<dyn DiagnosticSink>,
}

impl ContinuationRegistry {
    pub fn new(idle_timeout: Duration, max_lifetime: Duration, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            entries: DashMap::new(),
            idle_timeout,
            max_lifetime,
            sink,
        }
    }

    pub fn from_config(config: &SearchConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::new(config.idle_timeout(), config.max_lifetime(), sink)
    }

    /// Stores `continuation` if pages remain. Returns its state.
    pub fn open(&self, continuation: SearchContinuation) -> ContinuationState {
        let state = continuation.state();
        match state {
            ContinuationState::Active => {
                self.sink.emit(DiagnosticEvent::ContinuationOpened {
                    search_id: continuation.search_id.clone(),
                    total_pages: continuation.total_pages,
                });
                self.entries
                    .insert(continuation.search_id.clone(), Slot::Idle(continuation));
            }
            _ => self.sink.emit(DiagnosticEvent::ContinuationExhausted {
                search_id: continuation.search_id,
            }),
        }
        state
    }

    /// Takes exclusive hold of the continuation behind `token`.
    pub fn checkout(&self, token: &PageToken) -> Result<Checkout<'_>, SuitebridgeError> {
        let search_id = token.as_str();
        let taken = match self.entries.get_mut(search_id) {
            Some(mut slot) => match std::mem::replace(&mut *slot, Slot::CheckedOut) {
                Slot::Idle(continuation) => Some(continuation),
                Slot::CheckedOut => {
                    debug!(search_id, "continuation already in use");
                    return Err(stale(search_id));
                }
            },
            None => None,
        };
        let Some(continuation) = taken else {
            debug!(search_id, "unknown or finished continuation");
            return Err(stale(search_id));
        };

        if let Some(reason) = self.expiry_reason(&continuation) {
            self.entries.remove(search_id);
            self.sink.emit(DiagnosticEvent::ContinuationExpired {
                search_id: search_id.to_string(),
                reason: reason.to_string(),
            });
            return Err(stale(search_id));
        }

        Ok(Checkout {
            registry: self,
            continuation: Some(continuation),
        })
    }

    /// Drops idle continuations past their idle timeout or lifetime.
    /// Returns how many were removed.
    pub fn purge_idle(&self) -> usize {
        let mut expired = Vec::new();
        self.entries.retain(|search_id, slot| match slot {
            Slot::Idle(continuation) => match self.expiry_reason(continuation) {
                Some(reason) => {
                    expired.push((search_id.clone(), reason));
                    false
                }
                None => true,
            },
            Slot::CheckedOut => true,
        });
        for (search_id, reason) in &expired {
            self.sink.emit(DiagnosticEvent::ContinuationExpired {
                search_id: search_id.clone(),
                reason: reason.to_string(),
            });
        }
        expired.len()
    }

    /// Open continuations, including checked-out ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expiry_reason(&self, continuation: &SearchContinuation) -> Option<&'static str> {
        if continuation.issued_at.elapsed() >= self.max_lifetime {
            Some("maximum lifetime reached")
        } else if continuation.last_used.elapsed() >= self.idle_timeout {
            Some("idle timeout")
        } else {
            None
        }
    }

    fn restore(&self, continuation: SearchContinuation) {
        self.entries
            .insert(continuation.search_id.clone(), Slot::Idle(continuation));
    }
}

impl std::fmt::Debug for ContinuationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuationRegistry")
            .field("open", &self.entries.len())
            .field("idle_timeout", &self.idle_timeout)
            .field("max_lifetime", &self.max_lifetime)
            .finish_non_exhaustive()
    }
}

fn stale(search_id: &str) -> SuitebridgeError {
    SuitebridgeError::StaleContinuation {
        search_id: search_id.to_string(),
    }
}

/// Exclusive hold on one continuation.
#[derive(Debug)]
pub struct Checkout<'a> {
    registry: &'a ContinuationRegistry,
    continuation: Option<SearchContinuation>,
}

impl Checkout<'_> {
    pub fn continuation(&self) -> Option<&SearchContinuation> {
        self.continuation.as_ref()
    }

    /// Records that `page_index` was served. Removes the continuation once
    /// the last page is reached.
    pub fn advance(mut self, page_index: u32, total_pages: u32) -> ContinuationState {
        let Some(mut continuation) = self.continuation.take() else {
            return ContinuationState::Expired;
        };
        continuation.page_index = page_index;
        continuation.total_pages = total_pages;
        continuation.last_used = Instant::now();

        let state = continuation.state();
        match state {
            ContinuationState::Exhausted => {
                self.registry.entries.remove(&continuation.search_id);
                self.registry
                    .sink
                    .emit(DiagnosticEvent::ContinuationExhausted {
                        search_id: continuation.search_id,
                    });
            }
            _ => self.registry.restore(continuation),
        }
        state
    }

    /// Destroys the continuation after the backend rejected it.
    pub fn expire(mut self, reason: &str) {
        if let Some(continuation) = self.continuation.take() {
            self.registry.entries.remove(&continuation.search_id);
            self.registry.sink.emit(DiagnosticEvent::ContinuationExpired {
                search_id: continuation.search_id,
                reason: reason.to_string(),
            });
        }
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if let Some(continuation) = self.continuation.take() {
            self.registry.restore(continuation);
        }
    }
}
