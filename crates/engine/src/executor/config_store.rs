use async_trait::async_trait;
use dashmap::DashMap;

/// Scoped key-value store for per-resource flags (e.g. a degraded-mode
/// switch the remediated system reads). Last-writer-wins; the action
/// executor is the sole writer in this process.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<(), ConfigStoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ConfigStoreError>;
}

#[derive(Debug)]
pub struct ConfigStoreError(pub String);

impl std::fmt::Display for ConfigStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config store: {}", self.0)
    }
}

impl std::error::Error for ConfigStoreError {}

pub struct InMemoryConfigStore {
    values: DashMap<String, String>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), ConfigStoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ConfigStoreError> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }
}

/// Flag key for a managed resource, mirroring parameter-store style paths.
pub fn degraded_flag_key(namespace: &str, name: &str) -> String {
    format!("/{namespace}/{name}/degraded_mode")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryConfigStore::new();
        let key = degraded_flag_key("apps", "checkout");
        assert_eq!(store.get(&key).await.unwrap(), None);
        store.put(&key, "true").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = InMemoryConfigStore::new();
        store.put("/apps/checkout/degraded_mode", "true").await.unwrap();
        store.put("/apps/checkout/degraded_mode", "false").await.unwrap();
        assert_eq!(
            store.get("/apps/checkout/degraded_mode").await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[test]
    fn flag_key_shape() {
        assert_eq!(
            degraded_flag_key("apps", "checkout"),
            "/apps/checkout/degraded_mode"
        );
    }
}
