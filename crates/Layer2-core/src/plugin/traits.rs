//! Plugin traits - 핵심 플러그인 인터페이스

use crate::client::{ClientInner, WebexClient};
use crate::request::{HttpResponse, RequestOptions};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::{Arc, Weak};
use webex_foundation::{get_path, BoundStorage, Error, Observable, Result};

// ============================================================================
// PluginStatus - 플러그인 준비 상태
// ============================================================================

/// 플러그인 상태
///
/// 선언 순서가 곧 우선순위입니다. 루트 상태는 자식 상태의 최소값입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginStatus {
    /// 초기화 실패
    Failed,

    /// 아직 생성/등록되지 않음
    Unconstructed,

    /// 비동기 준비 작업 진행 중
    Initializing,

    /// 사용 가능
    Ready,
}

impl PluginStatus {
    /// 상태 속성 키
    pub const ATTRIBUTE: &'static str = "status";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Unconstructed => "unconstructed",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "failed" => Some(Self::Failed),
            "unconstructed" => Some(Self::Unconstructed),
            "initializing" => Some(Self::Initializing),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }

    /// 관찰 가능한 상태에서 읽기
    ///
    /// `status` 속성이 우선이고, 없으면 `ready: false`만 미준비로 봅니다.
    /// 둘 다 없으면 `Ready`입니다.
    pub fn from_state(state: &Observable) -> Self {
        if let Some(status) = state
            .get(Self::ATTRIBUTE)
            .and_then(|v| v.as_str().and_then(Self::parse))
        {
            return status;
        }

        match state.get("ready") {
            Some(Value::Bool(false)) => Self::Initializing,
            _ => Self::Ready,
        }
    }

    /// 관찰 가능한 상태에 기록 (`change:status` + `change` 발행)
    pub fn apply(self, state: &Observable) -> bool {
        state.set(Self::ATTRIBUTE, self.as_str())
    }
}

impl std::fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// 플러그인 네임스페이스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// 루트에 직접 노출
    Public,

    /// `internal` 아래에만 노출
    Internal,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

// ============================================================================
// PluginContext - 플러그인에 제공되는 컨텍스트
// ============================================================================

/// 플러그인 컨텍스트 - 플러그인이 클라이언트와 상호작용하는 인터페이스
///
/// 클라이언트에 대한 참조는 약한 참조입니다. 플러그인은 부모를 소유하지 않습니다.
#[derive(Clone)]
pub struct PluginContext {
    client: Weak<ClientInner>,
    name: String,
    namespace: Namespace,

    /// 생성 시점의 `config[name]` 스냅샷
    config: Value,

    /// 클라이언트 생성 옵션의 초기 속성 (`credentials` 등)
    attributes: Map<String, Value>,

    storage: BoundStorage,
}

impl PluginContext {
    pub(crate) fn new(
        client: Weak<ClientInner>,
        name: impl Into<String>,
        namespace: Namespace,
        config: Value,
        attributes: Map<String, Value>,
        storage: BoundStorage,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            namespace,
            config,
            attributes,
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    // ========================================================================
    // 설정
    // ========================================================================

    /// 플러그인 설정 서브트리
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// 플러그인 설정에서 점(.) 경로로 조회
    pub fn config_value(&self, path: &str) -> Option<&Value> {
        get_path(&self.config, path)
    }

    /// 클라이언트 생성 옵션으로 전달된 초기 속성
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    // ========================================================================
    // 클라이언트 / 스토리지 / 요청
    // ========================================================================

    /// 부모 클라이언트
    ///
    /// 클라이언트가 이미 해제되었으면 `NotReady`
    pub fn client(&self) -> Result<WebexClient> {
        self.client
            .upgrade()
            .map(WebexClient::from_inner)
            .ok_or_else(|| Error::NotReady(format!("client for plugin `{}` is gone", self.name)))
    }

    /// 이 플러그인 네임스페이스에 바인딩된 스토리지
    pub fn storage(&self) -> &BoundStorage {
        &self.storage
    }

    /// 공유 요청 파이프라인으로 요청
    pub async fn request(&self, options: RequestOptions) -> Result<HttpResponse> {
        self.client()?.request(options).await
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("storage", &self.storage)
            .finish()
    }
}

// ============================================================================
// Plugin Trait - 모든 플러그인이 구현해야 하는 인터페이스
// ============================================================================

/// 플러그인 트레이트
///
/// 생성은 `PluginFactory`가 동기적으로 수행합니다.
/// 비동기 준비 작업은 `on_load`에서 하고, 진행 상황은 `status` 속성으로 알립니다.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// 관찰 가능한 상태 (`set` → `change:<key>`, `change`)
    fn state(&self) -> &Observable;

    /// 현재 상태. 기본 구현은 `state()`의 `status`/`ready` 속성을 읽습니다.
    fn status(&self) -> PluginStatus {
        PluginStatus::from_state(self.state())
    }

    /// 이름 기반 메서드 호출 (루트 proxy가 사용)
    async fn invoke(&self, method: &str, _args: Value) -> Result<Value> {
        Err(Error::unknown_method(std::any::type_name::<Self>(), method))
    }

    /// 클라이언트 구성 후 호출 (internal → public, 등록 순서)
    async fn on_load(&self) -> Result<()> {
        Ok(())
    }

    /// 플러그인 해제 시 호출
    async fn teardown(&self) -> Result<()> {
        Ok(())
    }

    /// 타입 캐스팅을 위한 헬퍼 (다운캐스팅 지원)
    fn as_any(&self) -> &dyn Any;

    /// `Arc` 다운캐스팅용
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(PluginStatus::Failed < PluginStatus::Unconstructed);
        assert!(PluginStatus::Unconstructed < PluginStatus::Initializing);
        assert!(PluginStatus::Initializing < PluginStatus::Ready);

        let min = [PluginStatus::Ready, PluginStatus::Initializing, PluginStatus::Ready]
            .into_iter()
            .min();
        assert_eq!(min, Some(PluginStatus::Initializing));
    }

    #[test]
    fn test_status_from_state() {
        let state = Observable::new();
        assert_eq!(PluginStatus::from_state(&state), PluginStatus::Ready);

        state.set("ready", false);
        assert_eq!(PluginStatus::from_state(&state), PluginStatus::Initializing);

        state.set("ready", true);
        assert_eq!(PluginStatus::from_state(&state), PluginStatus::Ready);

        PluginStatus::Failed.apply(&state);
        assert_eq!(PluginStatus::from_state(&state), PluginStatus::Failed);
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            PluginStatus::Failed,
            PluginStatus::Unconstructed,
            PluginStatus::Initializing,
            PluginStatus::Ready,
        ] {
            assert_eq!(PluginStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PluginStatus::parse("torn-down"), None);
    }
}
