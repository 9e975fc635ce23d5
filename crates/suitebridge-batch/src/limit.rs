// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use suitebridge_core::SuitebridgeError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Global cap on concurrent backend calls, shared by every call site.
///
/// Callers beyond the limit queue for a permit; they never burst past it.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit(Arc<Semaphore>);

impl ConcurrencyLimit {
    pub fn new(permits: usize) -> Self {
        Self(Arc::new(Semaphore::new(permits.max(1))))
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, SuitebridgeError> {
        Arc::clone(&self.0)
            .acquire_owned()
            .await
            .map_err(|_| SuitebridgeError::Internal("backend concurrency limit closed".into()))
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.0.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_shared_between_clones() {
        let limit = ConcurrencyLimit::new(2);
        let other = limit.clone();
        let _a = limit.acquire().await.unwrap();
        let _b = other.acquire().await.unwrap();
        assert_eq!(limit.available(), 0);
        assert!(other.0.try_acquire().is_err());
    }

    #[test]
    fn zero_is_raised_to_one() {
        assert_eq!(ConcurrencyLimit::new(0).available(), 1);
    }
}
