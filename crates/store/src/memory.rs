use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{PreferenceKey, PreferenceStore, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<RwLock<HashMap<PreferenceKey, String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: PreferenceKey) -> StoreResult<Option<String>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set(&self, key: PreferenceKey, value: Option<String>) -> StoreResult<()> {
        let mut values = self.values.write().await;
        match value {
            Some(value) => {
                values.insert(key, value);
            }
            None => {
                values.remove(&key);
            }
        }
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.values.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallInfo;

    #[tokio::test]
    async fn setting_none_removes_the_value() {
        let store = MemoryPreferenceStore::new();
        store
            .set(PreferenceKey::PushToken, Some("push".into()))
            .await
            .unwrap();
        store.set(PreferenceKey::PushToken, None).await.unwrap();
        assert_eq!(store.get(PreferenceKey::PushToken).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_call_requires_a_call_id() {
        let store = MemoryPreferenceStore::new();
        store
            .set(PreferenceKey::CallerDisplayName, Some("Alice".into()))
            .await
            .unwrap();
        assert_eq!(store.last_call().await.unwrap(), None);

        store
            .set_last_call(Some(CallInfo {
                call_id: "call-1".into(),
                caller_display_name: Some("Alice".into()),
            }))
            .await
            .unwrap();
        let call = store.last_call().await.unwrap().unwrap();
        assert_eq!(call.call_id, "call-1");

        store.set_last_call(None).await.unwrap();
        assert_eq!(store.last_call().await.unwrap(), None);
        assert_eq!(
            store.get(PreferenceKey::CallerDisplayName).await.unwrap(),
            None
        );
    }
}
