use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreError;

/// Object storage as seen by the reconciler. Paths are relative to the
/// configured bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Replaces the tag set of the object at `path`.
    async fn set_tags(
        &self,
        path: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), StoreError>;
}
