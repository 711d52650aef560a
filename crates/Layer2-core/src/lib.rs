//! webex-core: Core Runtime for the Webex SDK
//!
//! Layer2 - 플러그인 등록/구성 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: Plugin 트레이트, 선언(Descriptor), Registry
//! - `client`: Composer (`WebexClient`) - 설정 병합, 자식 생성, proxy, 준비 상태 집계
//! - `request`: 공유 요청 파이프라인 (payload transform, TrackingID, 재시도, 전송)
//! - `credentials`: 액세스 토큰 플러그인
//! - `services`: 서비스 카탈로그 (우선순위 호스트, 실패 전환, 허용 도메인)
//! - `batcher`: 짧은 시간 안의 요청을 배치 API 한 번으로 합치는 도구
//!
//! # 사용 예시
//!
//! ```ignore
//! use webex_core::{credentials, ClientOptions, PluginRegistry, WebexClient};
//!
//! let registry = PluginRegistry::new();
//! credentials::register(&registry)?;
//!
//! let webex = WebexClient::init_with(&registry, ClientOptions::new().credentials(token)).await?;
//! let can = webex.call("canAuthorize", json!(null)).await?;
//! ```

pub mod batcher;
pub mod client;
pub mod credentials;
pub mod plugin;
pub mod request;
pub mod services;

// Re-exports: Client
pub use client::{core_defaults, ClientOptions, WebexClient};

// Re-exports: Plugin
pub use plugin::{
    factory, global_registry, register_internal_plugin, register_plugin, Namespace, Plugin,
    PluginContext, PluginDescriptor, PluginFactory, PluginRegistry, PluginStatus, RegisterOptions,
};

// Re-exports: Request
pub use request::{
    Direction, HttpRequest, HttpResponse, HttpTransport, Method, PayloadTransform, RequestOptions,
    ReqwestTransport, Target, TransformContext, WebexHttpError,
};

// Re-exports: Services / Batcher
pub use batcher::{BatchHandler, Batcher, BatcherConfig};
pub use services::{ServiceCatalog, ServiceGroup, ServiceHost};

// Re-exports: Credentials
pub use credentials::{Credentials, Token};

// Re-exports: Foundation
pub use webex_foundation::{Error, Observable, Result};
