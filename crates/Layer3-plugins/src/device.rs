//! Device (internal) - WDM 장치 등록
//!
//! 상태 흐름:
//!
//! ```text
//! Initializing ──register()──▶ Ready ──unregister()──▶ Unconstructed
//!      ▲                        │  ▲
//!      │                        └──┘ register() 재호출 시 PUT 갱신
//!      └──── 갱신이 404 ─────────┘   (등록을 지우고 새로 등록)
//! ```
//!
//! 등록 응답의 `services`는 서비스 카탈로그의 `postauth` 그룹이 됩니다.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webex_core::{
    factory, Method, Plugin, PluginContext, PluginRegistry, PluginStatus, RegisterOptions,
    RequestOptions, ServiceGroup,
};
use webex_foundation::{deep_merge, Error, Observable, Result};

/// 장치 서비스 이름
pub const WDM: &str = "wdm";

const STORAGE_KEY: &str = "@";

/// 장치 플러그인 기본 설정
pub fn device_defaults() -> Value {
    json!({
        "services": {
            "wdm": "https://wdm-a.wbx2.com/wdm/api/v1"
        },
        "device": {
            "defaults": {
                "body": {
                    "name": "webex-rust-sdk",
                    "deviceName": "webex-rust-sdk",
                    "deviceType": "UNKNOWN",
                    "localizedModel": "rust",
                    "model": "rust",
                    "systemName": "webex-rust-sdk",
                    "systemVersion": env!("CARGO_PKG_VERSION")
                }
            },
            "ephemeral": false,
            "ephemeralDeviceTTL": 1800
        }
    })
}

/// 장치 플러그인
pub struct Device {
    ctx: PluginContext,
    state: Observable,

    /// 마지막 WDM 응답 (`url` 포함)
    registration: RwLock<Option<Value>>,
}

impl Device {
    pub const NAME: &'static str = "device";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        let state = Observable::new();
        PluginStatus::Initializing.apply(&state);

        Ok(Self {
            ctx,
            state,
            registration: RwLock::new(None),
        })
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn url(&self) -> Option<String> {
        self.registration
            .read()
            .as_ref()
            .and_then(|r| r.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn is_registered(&self) -> bool {
        self.url().is_some()
    }

    pub fn registration(&self) -> Option<Value> {
        self.registration.read().clone()
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 장치 등록. 이미 등록되어 있으면 갱신합니다
    pub async fn register(&self) -> Result<Value> {
        if self.is_registered() {
            debug!("Device already registered, refreshing");
            return self.refresh().await;
        }
        self.create().await
    }

    /// 등록 갱신. 서버가 장치를 모르면(404) 새로 등록
    pub async fn refresh(&self) -> Result<Value> {
        let Some(url) = self.url() else {
            return self.create().await;
        };

        match self
            .ctx
            .request(RequestOptions::uri(Method::PUT, url).body(self.request_body()))
            .await
        {
            Ok(response) => self.store(response.body).await,
            Err(e) if e.status_code() == Some(404) => {
                info!("Device no longer exists, registering a new one");
                self.clear();
                self.create().await
            }
            Err(e) => Err(e),
        }
    }

    /// 장치 등록 해제. 등록되지 않았으면 아무것도 하지 않음
    pub async fn unregister(&self) -> Result<()> {
        let Some(url) = self.url() else {
            warn!("Device is not registered");
            return Ok(());
        };

        info!("Unregistering device");
        self.ctx
            .request(RequestOptions::uri(Method::DELETE, url))
            .await?;

        self.clear();
        PluginStatus::Unconstructed.apply(&self.state);
        self.ctx.storage().del(STORAGE_KEY).await
    }

    // ========================================================================
    // 내부
    // ========================================================================

    async fn create(&self) -> Result<Value> {
        info!("Registering device");
        let response = self
            .ctx
            .request(
                RequestOptions::service(Method::POST, WDM, "devices").body(self.request_body()),
            )
            .await?;
        self.store(response.body).await
    }

    /// `defaults.body` + `body` 병합, ephemeral이면 `ttl` 추가
    fn request_body(&self) -> Value {
        let mut body = json!({});
        if let Some(defaults) = self.ctx.config_value("defaults.body") {
            deep_merge(&mut body, defaults);
        }
        if let Some(overrides) = self.ctx.config_value("body") {
            deep_merge(&mut body, overrides);
        }

        let ephemeral = self
            .ctx
            .config_value("ephemeral")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if ephemeral {
            if let Some(ttl) = self.ctx.config_value("ephemeralDeviceTTL") {
                body["ttl"] = ttl.clone();
            }
        }
        body
    }

    async fn store(&self, registration: Value) -> Result<Value> {
        let url = registration
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("device registration has no url".into()))?
            .to_string();

        if let Some(services) = registration.get("services") {
            self.ctx
                .client()?
                .services()
                .update_service_urls(ServiceGroup::Postauth, services);
        }

        *self.registration.write() = Some(registration.clone());
        self.state.set("url", url.clone());
        PluginStatus::Ready.apply(&self.state);
        info!(device_url = %url, "Device registered");

        self.ctx
            .storage()
            .put(STORAGE_KEY, json!({ "url": url }))
            .await?;
        Ok(registration)
    }

    /// 등록 제거. 다시 등록될 때까지 Ready가 아님
    fn clear(&self) {
        *self.registration.write() = None;
        self.state.unset("url");
        PluginStatus::Initializing.apply(&self.state);
    }
}

#[async_trait]
impl Plugin for Device {
    fn state(&self) -> &Observable {
        &self.state
    }

    async fn invoke(&self, method: &str, _args: Value) -> Result<Value> {
        match method {
            "register" | "registerDevice" => self.register().await,
            "refresh" => self.refresh().await,
            "unregister" => self.unregister().await.map(|_| Value::Null),
            "isRegistered" => Ok(Value::Bool(self.is_registered())),
            other => Err(Error::unknown_method(Self::NAME, other)),
        }
    }

    /// 저장된 장치 URL이 있으면 등록된 상태로 복원
    async fn on_load(&self) -> Result<()> {
        let stored = self.ctx.storage().get_optional(STORAGE_KEY).await?;
        if let Some(url) = stored.as_ref().and_then(|s| s.get("url")).and_then(Value::as_str) {
            debug!(device_url = %url, "Restored device registration");
            *self.registration.write() = Some(json!({ "url": url }));
            self.state.set("url", url);
            PluginStatus::Ready.apply(&self.state);
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.is_registered() {
            self.unregister().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub fn register(registry: &PluginRegistry) -> Result<()> {
    registry.register_internal_plugin(
        Device::NAME,
        factory(Device::new),
        RegisterOptions::new()
            .config(device_defaults())
            .proxy("registerDevice"),
    )
}
