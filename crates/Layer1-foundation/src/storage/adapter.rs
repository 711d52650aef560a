//! Storage Adapter - 교체 가능한 영속 저장소 인터페이스
//!
//! 플러그인은 `namespace` + `key`로 값을 저장/조회합니다.
//! 어댑터 구현(메모리, JSON 파일 등)은 구성 시점에 선택됩니다.

use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// 스토리지 어댑터 트레이트
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// 어댑터 이름 (디버깅용)
    fn name(&self) -> &str;

    /// 값 조회. 없으면 `Error::NotFound`
    async fn get(&self, namespace: &str, key: &str) -> Result<Value>;

    /// 값 저장
    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<()>;

    /// 값 삭제 (없어도 성공)
    async fn del(&self, namespace: &str, key: &str) -> Result<()>;

    /// 네임스페이스 전체 삭제
    async fn clear(&self, namespace: &str) -> Result<()>;
}

pub(crate) fn not_found(namespace: &str, key: &str) -> Error {
    Error::NotFound(format!("no value for `{}` in storage namespace `{}`", key, namespace))
}

// ============================================================================
// BoundStorage
// ============================================================================

/// 네임스페이스에 바인딩된 스토리지 핸들
#[derive(Clone)]
pub struct BoundStorage {
    adapter: Arc<dyn StorageAdapter>,
    namespace: String,
}

impl BoundStorage {
    pub fn new(adapter: Arc<dyn StorageAdapter>, namespace: impl Into<String>) -> Self {
        Self {
            adapter,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub async fn get(&self, key: &str) -> Result<Value> {
        self.adapter.get(&self.namespace, key).await
    }

    /// 값 조회 (없으면 `None`)
    pub async fn get_optional(&self, key: &str) -> Result<Option<Value>> {
        match self.adapter.get(&self.namespace, key).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.adapter.put(&self.namespace, key, value).await
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        self.adapter.del(&self.namespace, key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.adapter.clear(&self.namespace).await
    }
}

impl std::fmt::Debug for BoundStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundStorage")
            .field("adapter", &self.adapter.name())
            .field("namespace", &self.namespace)
            .finish()
    }
}
