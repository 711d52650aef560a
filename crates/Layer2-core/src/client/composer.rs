//! Composer - 레지스트리 스냅샷으로 루트 클라이언트 구성
//!
//! 구성 단계 (모두 동기):
//! 1. 설정 병합: core defaults → internal 기본값 → public 기본값 → 사용자 설정
//! 2. payload transform 체인과 proxy 테이블 생성 (등록 순서)
//! 3. 루트 생성 후 internal 플러그인 생성 (`internal.<name>`)
//! 4. public 플러그인 생성 (`<name>`)
//! 5. 자식 `change` 이벤트를 루트로 연결
//!
//! 어느 플러그인이든 생성에 실패하면 전체 구성이 실패합니다.

use super::options::{core_defaults, ClientOptions};
use crate::credentials::Credentials;
use crate::plugin::{
    global_registry, Namespace, Plugin, PluginContext, PluginDescriptor, PluginRegistry,
    PluginStatus,
};
use crate::request::{
    join_url, resolve_url, HttpResponse, HttpTransport, ReqwestTransport, RequestOptions,
    RequestPipeline, RetryConfig, Target, TrackingId, TransformChain,
};
use crate::services::ServiceCatalog;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use webex_foundation::{
    deep_merge, get_path, BoundStorage, ConfigLayers, Error, Event, HandlerId, LayerKind,
    MemoryStoreAdapter, Observable, Result, StorageAdapter,
};

/// 기본 추적 ID 접두사
const DEFAULT_TRACKING_PREFIX: &str = "webex-js-sdk";

/// 구성된 자식 플러그인
#[derive(Clone)]
struct Child {
    name: String,
    plugin: Arc<dyn Plugin>,
}

/// proxy 메서드의 소유 플러그인
#[derive(Debug, Clone)]
struct ProxyTarget {
    namespace: Namespace,
    plugin: String,
}

// ============================================================================
// ClientInner
// ============================================================================

/// 루트 클라이언트 상태 (플러그인은 `Weak`로만 참조)
pub struct ClientInner {
    state: Observable,
    config: RwLock<Value>,
    layers: ConfigLayers,
    public: RwLock<Vec<Child>>,
    internal: RwLock<Vec<Child>>,
    proxies: HashMap<String, ProxyTarget>,
    pipeline: RequestPipeline,
    services: ServiceCatalog,
    storage: Arc<dyn StorageAdapter>,
    constructed: AtomicBool,
}

impl ClientInner {
    fn children(&self, namespace: Namespace) -> Vec<Child> {
        match namespace {
            Namespace::Public => self.public.read().clone(),
            Namespace::Internal => self.internal.read().clone(),
        }
    }

    fn child(&self, namespace: Namespace, name: &str) -> Option<Arc<dyn Plugin>> {
        let children = match namespace {
            Namespace::Public => self.public.read(),
            Namespace::Internal => self.internal.read(),
        };
        children
            .iter()
            .find(|child| child.name == name)
            .map(|child| Arc::clone(&child.plugin))
    }

    /// 직접 자식 상태의 최소값 (`internal`은 하나의 자식으로 취급)
    fn status(&self) -> PluginStatus {
        if !self.constructed.load(Ordering::SeqCst) {
            return PluginStatus::Unconstructed;
        }

        let internal = self
            .children(Namespace::Internal)
            .iter()
            .map(|child| child.plugin.status())
            .min()
            .unwrap_or(PluginStatus::Ready);

        self.children(Namespace::Public)
            .iter()
            .map(|child| child.plugin.status())
            .chain(std::iter::once(internal))
            .min()
            .unwrap_or(PluginStatus::Ready)
    }

    /// `ready` 속성 갱신. Ready로 전환되면 `ready` 이벤트 발행
    fn refresh_ready(&self) {
        let ready = self.status() == PluginStatus::Ready;
        if self.state.set("ready", ready) && ready {
            debug!("Webex client is ready");
            self.state.trigger("ready", vec![]);
        }
    }
}

// ============================================================================
// WebexClient
// ============================================================================

/// 루트 클라이언트
///
/// 복제는 같은 루트를 가리킵니다.
#[derive(Clone)]
pub struct WebexClient {
    inner: Arc<ClientInner>,
}

impl WebexClient {
    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    // ========================================================================
    // 구성
    // ========================================================================

    /// 전역 레지스트리로 구성
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::compose(&global_registry(), options)
    }

    /// 구성 후 로드 (`loaded` 이벤트까지)
    pub async fn init(options: ClientOptions) -> Result<Self> {
        Self::init_with(&global_registry(), options).await
    }

    /// 지정한 레지스트리로 구성 후 로드
    pub async fn init_with(registry: &PluginRegistry, options: ClientOptions) -> Result<Self> {
        let client = Self::compose(registry, options)?;
        client.load().await?;
        Ok(client)
    }

    /// 지정한 레지스트리 스냅샷으로 구성
    pub fn compose(registry: &PluginRegistry, options: ClientOptions) -> Result<Self> {
        let internal: Vec<PluginDescriptor> =
            registry.registered_plugins(Namespace::Internal).collect();
        let public: Vec<PluginDescriptor> =
            registry.registered_plugins(Namespace::Public).collect();

        // 1. 설정 병합
        let mut layers = ConfigLayers::new().with(LayerKind::Defaults, "core", core_defaults());
        for descriptor in &internal {
            layers.push(LayerKind::Internal, descriptor.name(), descriptor.config().clone());
        }
        for descriptor in &public {
            layers.push(LayerKind::Public, descriptor.name(), descriptor.config().clone());
        }
        layers.push(LayerKind::User, "options", options.config.clone());
        let config = layers.fold();

        // 2. transform 체인 + proxy 테이블
        let mut transforms = TransformChain::new();
        let mut proxies: HashMap<String, ProxyTarget> = HashMap::new();
        for descriptor in internal.iter().chain(public.iter()) {
            transforms.extend(descriptor.transforms().iter().cloned());

            for method in descriptor.proxies() {
                let target = ProxyTarget {
                    namespace: descriptor.namespace(),
                    plugin: descriptor.name().to_string(),
                };
                if let Some(previous) = proxies.insert(method.clone(), target) {
                    warn!(
                        method = %method,
                        previous = %previous.plugin,
                        plugin = %descriptor.name(),
                        "Proxy method declared twice, later registration wins"
                    );
                }
            }
        }

        let transport: Arc<dyn HttpTransport> = match options.transport.clone() {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let prefix = config
            .get("trackingIdPrefix")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TRACKING_PREFIX)
            .to_string();
        let pipeline = RequestPipeline::new(
            transport,
            transforms,
            TrackingId::new(prefix),
            RetryConfig::from_config(get_path(&config, "request.retry")),
        );

        let storage: Arc<dyn StorageAdapter> = match options.storage.clone() {
            Some(storage) => storage,
            None => Arc::new(MemoryStoreAdapter::new()),
        };
        let namespace_prefix = get_path(&config, "storage.namespacePrefix")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // 3-4. 루트 먼저 생성 후 자식 생성
        let inner = Arc::new(ClientInner {
            state: Observable::new(),
            config: RwLock::new(config.clone()),
            layers,
            public: RwLock::new(Vec::new()),
            internal: RwLock::new(Vec::new()),
            proxies,
            pipeline,
            services: ServiceCatalog::from_config(config.get("services")),
            storage: Arc::clone(&storage),
            constructed: AtomicBool::new(false),
        });

        let attributes = options.attributes();
        for descriptor in internal.iter().chain(public.iter()) {
            let name = descriptor.name().to_string();
            let ctx = PluginContext::new(
                Arc::downgrade(&inner),
                name.clone(),
                descriptor.namespace(),
                config.get(&name).cloned().unwrap_or_else(|| Value::Object(Map::new())),
                attributes.clone(),
                BoundStorage::new(
                    Arc::clone(&storage),
                    storage_namespace(&namespace_prefix, &name),
                ),
            );

            let plugin = descriptor
                .construct(ctx)
                .map_err(|e| Error::construction(name.clone(), e))?;
            debug!(plugin = %name, namespace = %descriptor.namespace(), "Constructed plugin");

            let child = Child { name, plugin };
            match descriptor.namespace() {
                Namespace::Public => inner.public.write().push(child),
                Namespace::Internal => inner.internal.write().push(child),
            }
        }

        // 5. 자식 change → 루트
        for namespace in [Namespace::Internal, Namespace::Public] {
            for child in inner.children(namespace) {
                let event = match namespace {
                    Namespace::Public => format!("change:{}", child.name),
                    Namespace::Internal => "change:internal".to_string(),
                };
                listen_to_child(&inner, &child, event);
            }
        }

        inner.constructed.store(true, Ordering::SeqCst);
        inner.refresh_ready();

        info!(
            public = inner.public.read().len(),
            internal = inner.internal.read().len(),
            storage = %storage.name(),
            "Webex client composed"
        );

        Ok(Self { inner })
    }

    /// 모든 자식의 `on_load` 실행 (internal → public) 후 `loaded` 발행
    pub async fn load(&self) -> Result<()> {
        let children = self
            .inner
            .children(Namespace::Internal)
            .into_iter()
            .chain(self.inner.children(Namespace::Public));

        for child in children {
            debug!(plugin = %child.name, "Loading plugin");
            if let Err(e) = child.plugin.on_load().await {
                warn!(plugin = %child.name, error = %e, "Plugin failed to load");
                return Err(e);
            }
        }

        self.inner.state.set("loaded", true);
        self.inner.state.trigger("loaded", vec![]);
        self.inner.refresh_ready();

        info!(ready = self.ready(), "Webex client loaded");
        Ok(())
    }

    /// 모든 자식의 `teardown` 실행 (public 역순 → internal 역순)
    ///
    /// 실패해도 나머지를 계속 진행하고 첫 에러를 돌려줍니다.
    pub async fn teardown(&self) -> Result<()> {
        let mut children = self.inner.children(Namespace::Internal);
        children.extend(self.inner.children(Namespace::Public));

        let mut first_error = None;
        for child in children.into_iter().rev() {
            if let Err(e) = child.plugin.teardown().await {
                warn!(plugin = %child.name, error = %e, "Plugin teardown failed");
                first_error.get_or_insert(e);
            }
        }

        self.inner.state.set("loaded", false);
        self.inner.refresh_ready();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ========================================================================
    // 상태 / 이벤트
    // ========================================================================

    /// 집계 상태 (매 호출마다 계산)
    pub fn status(&self) -> PluginStatus {
        self.inner.status()
    }

    /// 모든 직접 자식이 Ready인지
    pub fn ready(&self) -> bool {
        self.status() == PluginStatus::Ready
    }

    /// `load` 완료 여부
    pub fn loaded(&self) -> bool {
        self.inner.state.is_true("loaded")
    }

    pub fn state(&self) -> &Observable {
        &self.inner.state
    }

    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.state.on(event, handler)
    }

    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.state.once(event, handler)
    }

    pub fn off(&self, id: HandlerId) -> bool {
        self.inner.state.off(id)
    }

    // ========================================================================
    // 설정
    // ========================================================================

    /// 현재 병합된 설정 스냅샷
    pub fn config(&self) -> Value {
        self.inner.config.read().clone()
    }

    /// 점(.) 경로로 설정 조회
    pub fn config_value(&self, path: &str) -> Option<Value> {
        get_path(&self.inner.config.read(), path).cloned()
    }

    /// 구성 시 병합된 레이어 출처 (병합 순서)
    pub fn config_sources(&self) -> Vec<String> {
        self.inner.layers.sources()
    }

    /// 설정 패치 병합 후 `change:config` 발행
    pub fn set_config(&self, patch: Value) {
        let snapshot = {
            let mut config = self.inner.config.write();
            deep_merge(&mut config, &patch);
            config.clone()
        };
        if patch.get("services").is_some() {
            self.inner.services.apply_config(snapshot.get("services"));
        }

        debug!("Client config updated");
        self.inner.state.trigger("change:config", vec![snapshot]);
        self.inner.state.trigger("change", vec![]);
    }

    // ========================================================================
    // 자식 플러그인
    // ========================================================================

    /// public 플러그인 (`root.<name>`)
    pub fn plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.inner.child(Namespace::Public, name)
    }

    /// internal 플러그인 (`root.internal.<name>`)
    pub fn internal(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.inner.child(Namespace::Internal, name)
    }

    /// 구체 타입으로 public 플러그인 조회
    pub fn plugin_as<T: Plugin>(&self, name: &str) -> Result<Arc<T>> {
        let plugin = self.plugin(name).ok_or_else(|| not_constructed(name))?;
        downcast(name, plugin)
    }

    /// 구체 타입으로 internal 플러그인 조회
    pub fn internal_as<T: Plugin>(&self, name: &str) -> Result<Arc<T>> {
        let plugin = self.internal(name).ok_or_else(|| not_constructed(name))?;
        downcast(name, plugin)
    }

    /// 네임스페이스의 플러그인 이름 (구성 순서)
    pub fn plugin_names(&self, namespace: Namespace) -> Vec<String> {
        self.inner
            .children(namespace)
            .into_iter()
            .map(|child| child.name)
            .collect()
    }

    // ========================================================================
    // Proxy
    // ========================================================================

    /// 루트에 노출된 proxy 메서드 이름
    pub fn proxies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.proxies.keys().cloned().collect();
        names.sort();
        names
    }

    /// proxy 메서드를 처리할 플러그인
    ///
    /// 선언되지 않은 메서드는 `UnknownMethod`, 소유 플러그인이 아직 없으면 `NotReady`
    pub fn proxy_target(&self, method: &str) -> Result<Arc<dyn Plugin>> {
        let target = self
            .inner
            .proxies
            .get(method)
            .ok_or_else(|| Error::unknown_method("webex", method))?;

        self.inner
            .child(target.namespace, &target.plugin)
            .ok_or_else(|| {
                Error::NotReady(format!(
                    "`{}` forwards to plugin `{}`, which is not constructed yet",
                    method, target.plugin
                ))
            })
    }

    /// proxy 메서드 호출. 인자는 그대로 자식에게 전달됩니다.
    pub async fn call(&self, method: &str, args: Value) -> Result<Value> {
        let plugin = self.proxy_target(method)?;
        plugin.invoke(method, args).await
    }

    // ========================================================================
    // 요청 / 스토리지
    // ========================================================================

    /// 공유 요청 파이프라인으로 요청
    ///
    /// - `Authorization`은 서비스 요청 또는 카탈로그/허용 도메인 URL에만 붙입니다.
    /// - 만료된 토큰은 먼저 갱신하고, 401 응답이면 한 번 갱신 후 재전송합니다.
    /// - 서비스 요청이 네트워크 에러로 실패하면 같은 서비스의 다음 호스트로 전환합니다.
    pub async fn request(&self, options: RequestOptions) -> Result<HttpResponse> {
        let services = &self.inner.services;
        let mut url = resolve_url(services, &options.target)?;
        let resource = match &options.target {
            Target::Service { resource, .. } => Some(resource.clone()),
            Target::Uri(_) => None,
        };

        let attach_auth =
            options.auth && (resource.is_some() || services.requires_credentials(&url));
        let credentials = if attach_auth {
            Some(
                self.plugin_as::<Credentials>("credentials")
                    .map_err(|_| Error::NotReady("credentials".into()))?,
            )
        } else {
            if options.auth {
                debug!(url = %url, "Not sending credentials to a host outside the service catalog");
            }
            None
        };

        let mut replayed = false;
        loop {
            let authorization = match &credentials {
                Some(credentials) => Some(credentials.authorize().await?),
                None => None,
            };

            let error = match self
                .inner
                .pipeline
                .execute(url.clone(), options.clone(), authorization)
                .await
            {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match (&credentials, &resource) {
                (Some(credentials), _)
                    if error.status_code() == Some(401) && !replayed && credentials.can_refresh() =>
                {
                    info!(url = %url, "Unauthorized, refreshing the access token and replaying");
                    replayed = true;
                    credentials.refresh().await?;
                }
                (_, Some(resource)) if matches!(error, Error::Network(_)) => {
                    match services.mark_failed_url(&url) {
                        Some(next) if !url.starts_with(next.as_str()) => {
                            url = join_url(&next, resource);
                        }
                        _ => return Err(error),
                    }
                }
                _ => return Err(error),
            }
        }
    }

    /// 서비스 카탈로그
    pub fn services(&self) -> &ServiceCatalog {
        &self.inner.services
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.inner.pipeline
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.inner.storage
    }
}

impl std::fmt::Debug for WebexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebexClient")
            .field("public", &self.plugin_names(Namespace::Public))
            .field("internal", &self.plugin_names(Namespace::Internal))
            .field("status", &self.status())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn listen_to_child(inner: &Arc<ClientInner>, child: &Child, event: String) {
    let weak: Weak<ClientInner> = Arc::downgrade(inner);
    child.plugin.state().on("change", move |_| {
        if let Some(inner) = weak.upgrade() {
            inner.state.trigger(event.clone(), vec![]);
            inner.refresh_ready();
        }
    });
}

fn not_constructed(name: &str) -> Error {
    Error::NotReady(format!("plugin `{}` is not constructed", name))
}

fn downcast<T: Plugin>(name: &str, plugin: Arc<dyn Plugin>) -> Result<Arc<T>> {
    plugin.into_any().downcast::<T>().map_err(|_| {
        Error::Internal(format!(
            "plugin `{}` is not a {}",
            name,
            std::any::type_name::<T>()
        ))
    })
}

/// 플러그인 스토리지 네임스페이스 (`rooms` → `Rooms`)
fn storage_namespace(prefix: &str, name: &str) -> String {
    let mut chars = name.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{}{}", prefix, capitalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{factory, PluginFactory, RegisterOptions};
    use crate::request::mock::MockTransport;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::any::Any;

    /// 테스트용 플러그인
    struct StubPlugin {
        ctx: PluginContext,
        state: Observable,
    }

    impl StubPlugin {
        fn new(ctx: PluginContext) -> Result<Self> {
            Ok(Self {
                ctx,
                state: Observable::new(),
            })
        }
    }

    #[async_trait]
    impl Plugin for StubPlugin {
        fn state(&self) -> &Observable {
            &self.state
        }

        async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
            match method {
                "echo" => Ok(args),
                "pluginConfig" => Ok(self.ctx.config().clone()),
                other => Err(Error::unknown_method(self.ctx.name(), other)),
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn options() -> ClientOptions {
        ClientOptions::new().transport(Arc::new(MockTransport::new()))
    }

    fn stub_plugin() -> PluginFactory {
        factory(StubPlugin::new)
    }

    #[test]
    fn test_registered_plugin_is_attached() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new())
            .unwrap();
        registry
            .register_internal_plugin("device", stub_plugin(), RegisterOptions::new())
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();

        assert!(client.plugin_as::<StubPlugin>("rooms").is_ok());
        assert!(client.internal_as::<StubPlugin>("device").is_ok());
        assert!(client.plugin("device").is_none());
        assert!(client.plugin_as::<StubPlugin>("people").is_err());
    }

    #[test]
    fn test_config_precedence() {
        let build = |public: bool, user: bool| {
            let registry = PluginRegistry::new();
            registry
                .register_internal_plugin(
                    "internalDefaults",
                    stub_plugin(),
                    RegisterOptions::new().config(json!({"a": 1})),
                )
                .unwrap();
            if public {
                registry
                    .register_plugin(
                        "publicDefaults",
                        stub_plugin(),
                        RegisterOptions::new().config(json!({"a": 2})),
                    )
                    .unwrap();
            }
            let mut opts = options();
            if user {
                opts = opts.config(json!({"a": 3}));
            }
            WebexClient::compose(&registry, opts).unwrap()
        };

        assert_eq!(build(true, true).config_value("a"), Some(json!(3)));
        assert_eq!(build(true, false).config_value("a"), Some(json!(2)));
        assert_eq!(build(false, false).config_value("a"), Some(json!(1)));
    }

    #[test]
    fn test_later_registration_wins_and_sources_order() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("first", stub_plugin(), RegisterOptions::new().config(json!({"k": "first"})))
            .unwrap();
        registry
            .register_plugin("second", stub_plugin(), RegisterOptions::new().config(json!({"k": "second"})))
            .unwrap();
        registry
            .register_internal_plugin("hidden", stub_plugin(), RegisterOptions::new())
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();
        assert_eq!(client.config_value("k"), Some(json!("second")));
        assert_eq!(
            client.config_sources(),
            vec![
                "defaults:core",
                "internal:hidden",
                "public:first",
                "public:second",
                "user:options"
            ]
        );
    }

    #[tokio::test]
    async fn test_plugin_receives_config_subtree() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin(
                "rooms",
                stub_plugin(),
                RegisterOptions::new()
                    .config(json!({"rooms": {"pageSize": 10}}))
                    .proxy("pluginConfig"),
            )
            .unwrap();

        let client = WebexClient::compose(
            &registry,
            options().config(json!({"rooms": {"pageSize": 50}})),
        )
        .unwrap();

        let config = client.call("pluginConfig", Value::Null).await.unwrap();
        assert_eq!(config, json!({"pageSize": 50}));
    }

    #[tokio::test]
    async fn test_proxy_forwards_arguments() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new().proxy("echo"))
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();
        let args = json!({"title": "Example", "nested": [1, 2]});

        assert_eq!(client.call("echo", args.clone()).await.unwrap(), args);
        assert_eq!(client.proxies(), vec!["echo"]);
        assert!(matches!(
            client.call("missing", Value::Null).await,
            Err(Error::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_proxy_before_owner_constructed_is_not_ready() {
        let registry = PluginRegistry::new();
        let observed: Arc<Mutex<Option<bool>>> = Arc::new(Mutex::new(None));

        let seen = Arc::clone(&observed);
        let early: PluginFactory = Arc::new(move |ctx: PluginContext| -> Result<Arc<dyn Plugin>> {
            let result = ctx.client()?.proxy_target("echo");
            *seen.lock() = Some(matches!(result, Err(Error::NotReady(_))));
            Ok(Arc::new(StubPlugin::new(ctx)?) as Arc<dyn Plugin>)
        });

        registry
            .register_internal_plugin("early", early, RegisterOptions::new())
            .unwrap();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new().proxy("echo"))
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();

        assert_eq!(*observed.lock(), Some(true));
        assert!(client.proxy_target("echo").is_ok());
    }

    #[test]
    fn test_construction_failure_aborts_composition() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new())
            .unwrap();
        registry
            .register_plugin(
                "broken",
                Arc::new(|_ctx: PluginContext| -> Result<Arc<dyn Plugin>> {
                    Err(Error::Config("missing hydra".into()))
                }),
                RegisterOptions::new(),
            )
            .unwrap();

        let err = WebexClient::compose(&registry, options()).unwrap_err();
        match err {
            Error::Construction { plugin, source } => {
                assert_eq!(plugin, "broken");
                assert!(matches!(*source, Error::Config(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ready_is_live_and_emits_events() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new())
            .unwrap();
        registry
            .register_internal_plugin("device", stub_plugin(), RegisterOptions::new())
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();
        assert!(client.ready());

        let events = Arc::new(Mutex::new(Vec::new()));
        for name in ["ready", "change:ready", "change:rooms", "change:internal"] {
            let events = Arc::clone(&events);
            client.on(name, move |e| events.lock().push(e.name.clone()));
        }

        let rooms = client.plugin("rooms").unwrap();
        rooms.state().set("ready", false);
        assert!(!client.ready());
        assert_eq!(client.status(), PluginStatus::Initializing);

        rooms.state().set("ready", true);
        assert!(client.ready());

        let device = client.internal("device").unwrap();
        PluginStatus::Failed.apply(device.state());
        assert_eq!(client.status(), PluginStatus::Failed);

        assert_eq!(
            *events.lock(),
            vec![
                "change:rooms",
                "change:ready",
                "change:rooms",
                "change:ready",
                "ready",
                "change:internal",
                "change:ready",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_emits_loaded() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", stub_plugin(), RegisterOptions::new())
            .unwrap();

        let client = WebexClient::compose(&registry, options()).unwrap();
        let loaded = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&loaded);
        client.on("loaded", move |_| *counter.lock() += 1);

        assert!(!client.loaded());
        client.load().await.unwrap();
        assert!(client.loaded());
        assert_eq!(*loaded.lock(), 1);
    }

    #[test]
    fn test_set_config_emits_change_config() {
        let registry = PluginRegistry::new();
        let client = WebexClient::compose(&registry, options()).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        client.on("change:config", move |e| *slot.lock() = e.arg(0).cloned());

        client.set_config(json!({"trackingIdPrefix": "cli"}));

        assert_eq!(client.config_value("trackingIdPrefix"), Some(json!("cli")));
        let snapshot = seen.lock().clone().unwrap();
        assert_eq!(snapshot["trackingIdPrefix"], json!("cli"));
        assert_eq!(snapshot["services"]["hydra"], json!("https://webexapis.com/v1"));
    }

    #[tokio::test]
    async fn test_request_without_credentials_is_not_ready() {
        let registry = PluginRegistry::new();
        let client = WebexClient::compose(&registry, options()).unwrap();

        let err = client
            .request(RequestOptions::service(crate::request::Method::GET, "hydra", "rooms"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotReady(ref what) if what == "credentials"));
    }

    #[test]
    fn test_storage_namespace() {
        assert_eq!(storage_namespace("", "credentials"), "Credentials");
        assert_eq!(storage_namespace("app-", "device"), "app-Device");
    }
}
