//! Testing utilities.
//!
//! [`FlakyStore`] wraps a [`MemoryStore`] and can be scripted to respond
//! slowly or fail, for exercising sync error paths without real I/O.

use crate::persist::{CharacterStore, MemoryStore, StoreError, StoreRequest, StoreResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A store with scripted latency and failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    delay: Option<Duration>,
    failure: Option<String>,
    /// Respond with an error status instead of a transport error.
    reject: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every request with `StoreError::Rejected(message)`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Toggle answering with an `error` status response.
    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The wrapped store, for inspecting what was written.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl CharacterStore for FlakyStore {
    async fn handle(&self, request: StoreRequest) -> Result<StoreResponse, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(StoreError::Rejected(message.clone()));
        }
        if self.reject.load(Ordering::SeqCst) {
            return Ok(StoreResponse::error("scripted rejection"));
        }
        self.inner.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_store_scripts() {
        let store = FlakyStore::new().failing("offline");
        let result = store.handle(StoreRequest::get_character_map("n")).await;
        assert!(matches!(result, Err(StoreError::Rejected(msg)) if msg == "offline"));
        assert_eq!(store.calls(), 1);

        let store = FlakyStore::new();
        store.set_rejecting(true);
        let response = store.handle(StoreRequest::get_character_map("n")).await.unwrap();
        assert!(response.into_result().is_err());

        store.set_rejecting(false);
        let response = store.handle(StoreRequest::get_character_map("n")).await.unwrap();
        assert!(response.into_result().is_ok());
        assert_eq!(store.calls(), 2);
    }
}
