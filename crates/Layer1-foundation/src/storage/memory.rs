//! 메모리 스토리지 어댑터

use super::adapter::{not_found, StorageAdapter};
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// 프로세스 메모리에만 저장하는 어댑터 (기본값)
#[derive(Debug, Default)]
pub struct MemoryStoreAdapter {
    data: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 미리 데이터를 채운 어댑터 생성
    ///
    /// `data`는 `{ namespace: { key: value } }` 형태의 객체여야 합니다.
    /// 객체가 아닌 네임스페이스 항목은 무시합니다.
    pub fn preload(data: Value) -> Self {
        let mut namespaces = HashMap::new();

        if let Value::Object(map) = data {
            for (namespace, entries) in map {
                match entries {
                    Value::Object(entries) => {
                        namespaces.insert(namespace, entries);
                    }
                    other => {
                        debug!(namespace = %namespace, value = %other, "Skipping non-object preload entry");
                    }
                }
            }
        }

        Self {
            data: RwLock::new(namespaces),
        }
    }

    /// 네임스페이스의 키 수
    pub fn len(&self, namespace: &str) -> usize {
        self.data.read().get(namespace).map(Map::len).unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

#[async_trait]
impl StorageAdapter for MemoryStoreAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Value> {
        self.data
            .read()
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned()
            .ok_or_else(|| not_found(namespace, key))
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        self.data
            .write()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, namespace: &str, key: &str) -> Result<()> {
        if let Some(entries) = self.data.write().get_mut(namespace) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&self, namespace: &str) -> Result<()> {
        self.data.write().remove(namespace);
        Ok(())
    }
}
