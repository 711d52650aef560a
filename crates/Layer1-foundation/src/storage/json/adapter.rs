//! JSON 파일 스토리지 어댑터
//!
//! 네임스페이스마다 `<namespace>.json` 파일 하나에 키/값 객체를 저장합니다.
//! 영숫자와 `-` 이외의 바이트는 `_XX`(16진수)로 인코딩해 이름이 겹치지 않습니다.

use super::store::JsonStore;
use crate::storage::adapter::{not_found, StorageAdapter};
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::trace;

/// JSON 파일 기반 어댑터
#[derive(Debug)]
pub struct JsonFileAdapter {
    store: JsonStore,

    /// read-modify-write 직렬화
    lock: Mutex<()>,
}

impl JsonFileAdapter {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    fn filename(namespace: &str) -> String {
        let mut name = String::with_capacity(namespace.len() + 5);
        for byte in namespace.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{:02X}", byte));
            }
        }
        name.push_str(".json");
        name
    }

    fn read_namespace(&self, namespace: &str) -> Result<Map<String, Value>> {
        Ok(self
            .store
            .read::<Map<String, Value>>(&Self::filename(namespace))?
            .unwrap_or_default())
    }
}

#[async_trait]
impl StorageAdapter for JsonFileAdapter {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Value> {
        let _guard = self.lock.lock();
        self.read_namespace(namespace)?
            .remove(key)
            .ok_or_else(|| not_found(namespace, key))
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_namespace(namespace)?;
        entries.insert(key.to_string(), value);

        trace!(namespace, key, "Persisting storage entry");
        self.store.write(&Self::filename(namespace), &entries)
    }

    async fn del(&self, namespace: &str, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_namespace(namespace)?;
        if entries.remove(key).is_some() {
            self.store.write(&Self::filename(namespace), &entries)?;
        }
        Ok(())
    }

    async fn clear(&self, namespace: &str) -> Result<()> {
        let _guard = self.lock.lock();
        self.store.remove(&Self::filename(namespace))
    }
}
