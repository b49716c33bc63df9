//! Mock implementations for testing

use crate::error::AstraError;
use crate::generation::{ChatMessage, GenerationProvider, Prompt};
use crate::store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use mockall::mock;
use std::time::Duration;

// ============================================================================
// MockGenerationProvider
// ============================================================================

mock! {
    pub GenerationProvider {}

    #[async_trait]
    impl GenerationProvider for GenerationProvider {
        async fn generate(&self, prompt: &Prompt) -> Result<String, AstraError>;
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AstraError>;
    }
}

/// Provider whose `generate` returns a fixed text.
pub fn replying(text: &str) -> MockGenerationProvider {
    let text = text.to_string();
    let mut provider = MockGenerationProvider::new();
    provider
        .expect_generate()
        .times(1)
        .returning(move |_| Ok(text.clone()));
    provider
}

/// Provider whose `generate` fails once with the error built by `make_err`.
pub fn failing<F>(make_err: F) -> MockGenerationProvider
where
    F: Fn() -> AstraError + Send + 'static,
{
    let mut provider = MockGenerationProvider::new();
    provider
        .expect_generate()
        .times(1)
        .returning(move |_| Err(make_err()));
    provider
}

// ============================================================================
// MockKeyValueStore
// ============================================================================

mock! {
    pub KeyValueStore {}

    impl KeyValueStore for KeyValueStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
        fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    }
}

/// Empty store that rejects every write.
pub fn read_only_store() -> MockKeyValueStore {
    let mut store = MockKeyValueStore::new();
    store.expect_get().returning(|_| Ok(None));
    store
        .expect_set()
        .returning(|_, _| Err(StoreError::Other("disk full".into())));
    store
}

// ============================================================================
// SlowProvider - sleeps before answering
// ============================================================================

pub struct SlowProvider {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait]
impl GenerationProvider for SlowProvider {
    async fn generate(&self, _prompt: &Prompt) -> Result<String, AstraError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}
