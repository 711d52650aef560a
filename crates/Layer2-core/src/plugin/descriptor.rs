//! Plugin Descriptor - 등록된 플러그인 선언

use super::traits::{Namespace, Plugin, PluginContext};
use crate::request::PayloadTransform;
use serde_json::{Map, Value};
use std::sync::Arc;
use webex_foundation::{deep_merge, Result};

/// 플러그인 생성 함수
pub type PluginFactory = Arc<dyn Fn(PluginContext) -> Result<Arc<dyn Plugin>> + Send + Sync>;

/// 구체 타입 생성자를 `PluginFactory`로 변환
///
/// ```ignore
/// registry.register_plugin("rooms", factory(Rooms::new), RegisterOptions::new())?;
/// ```
pub fn factory<P, F>(constructor: F) -> PluginFactory
where
    P: Plugin,
    F: Fn(PluginContext) -> Result<P> + Send + Sync + 'static,
{
    Arc::new(move |ctx| Ok(Arc::new(constructor(ctx)?) as Arc<dyn Plugin>))
}

// ============================================================================
// RegisterOptions
// ============================================================================

/// 등록 옵션 (기본 설정, proxy 메서드, payload transform, replace)
#[derive(Clone)]
pub struct RegisterOptions {
    pub(crate) config: Value,
    pub(crate) proxies: Vec<String>,
    pub(crate) transforms: Vec<PayloadTransform>,
    pub(crate) replace: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            config: Value::Object(Map::new()),
            proxies: Vec::new(),
            transforms: Vec::new(),
            replace: false,
        }
    }
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 루트 설정에 병합될 기본 설정
    pub fn config(mut self, config: Value) -> Self {
        deep_merge(&mut self.config, &config);
        self
    }

    /// 루트에 노출할 proxy 메서드
    pub fn proxy(mut self, method: impl Into<String>) -> Self {
        self.proxies.push(method.into());
        self
    }

    pub fn proxies<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxies.extend(methods.into_iter().map(Into::into));
        self
    }

    /// 요청 파이프라인 payload transform
    pub fn transform(mut self, transform: PayloadTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// 같은 이름의 기존 등록을 덮어씀 (테스트 격리용)
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }
}

impl std::fmt::Debug for RegisterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterOptions")
            .field("config", &self.config)
            .field("proxies", &self.proxies)
            .field("transforms", &self.transforms.len())
            .field("replace", &self.replace)
            .finish()
    }
}

// ============================================================================
// PluginDescriptor
// ============================================================================

/// 등록된 플러그인 선언
///
/// 등록 후에는 변경되지 않습니다. 교체는 `replace` 등록으로만 합니다.
#[derive(Clone)]
pub struct PluginDescriptor {
    name: String,
    namespace: Namespace,
    factory: PluginFactory,
    config: Value,
    proxies: Vec<String>,
    transforms: Vec<PayloadTransform>,
}

impl PluginDescriptor {
    pub(crate) fn new(
        name: String,
        namespace: Namespace,
        factory: PluginFactory,
        options: RegisterOptions,
    ) -> Self {
        Self {
            name,
            namespace,
            factory,
            config: options.config,
            proxies: options.proxies,
            transforms: options.transforms,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    pub fn transforms(&self) -> &[PayloadTransform] {
        &self.transforms
    }

    /// 인스턴스 생성
    pub fn construct(&self, ctx: PluginContext) -> Result<Arc<dyn Plugin>> {
        (self.factory)(ctx)
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .field("proxies", &self.proxies)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
