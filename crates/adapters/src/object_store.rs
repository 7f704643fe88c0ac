// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage adapter for rendered assets.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from object storage
#[derive(Debug, Clone, Error)]
pub enum ObjectStoreError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("delete failed: {0}")]
    Delete(String),
}

/// Adapter for a public object store
#[async_trait]
pub trait ObjectStoreAdapter: Clone + Send + Sync + 'static {
    /// Store bytes under `key`; returns the public URL.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ObjectStoreAdapter, ObjectStoreError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory object store recording contents and content types.
    #[derive(Clone, Default)]
    pub struct MemoryObjectStore {
        objects: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    }

    impl MemoryObjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.objects.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.objects.lock().is_empty()
        }
    }

    #[async_trait]
    impl ObjectStoreAdapter for MemoryObjectStore {
        async fn put(
            &self,
            key: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<String, ObjectStoreError> {
            self.objects.lock().insert(key.to_string(), (bytes, content_type.to_string()));
            Ok(format!("https://assets.example.test/{key}"))
        }

        async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.objects.lock().remove(key);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::MemoryObjectStore;
