//! webex-plugins: Concrete Webex SDK plugins
//!
//! Layer3 - 공유 요청 파이프라인 위에서 동작하는 REST 리소스 플러그인
//!
//! | 이름 | 네임스페이스 | 설명 |
//! |------|-------------|------|
//! | `device` | internal | WDM 장치 등록 (`registerDevice` proxy) |
//! | `credentials` | public | 액세스 토큰 (webex-core) |
//! | `rooms` | public | 스페이스 |
//! | `messages` | public | 메시지 (html 정리 transform) |
//! | `people` | public | 사용자 |
//! | `memberships` | public | 룸 참여자 |
//!
//! 등록은 import 부작용이 아니라 `register_all` 호출로 이루어집니다.
//!
//! ```ignore
//! use webex_core::{ClientOptions, PluginRegistry, WebexClient};
//! use webex_plugins::{register_all, WebexExt};
//!
//! let registry = PluginRegistry::new();
//! register_all(&registry)?;
//!
//! let webex = WebexClient::init_with(&registry, ClientOptions::new().credentials(token)).await?;
//! let room = webex.rooms()?.create(json!({"title": "Example"})).await?;
//! ```

pub mod device;
pub mod memberships;
pub mod messages;
pub mod page;
pub mod people;
mod resource;
pub mod rooms;

pub use device::Device;
pub use memberships::Memberships;
pub use messages::Messages;
pub use page::Page;
pub use people::People;
pub use resource::HYDRA;
pub use rooms::Rooms;

use std::sync::Arc;
use tracing::debug;
use webex_core::{credentials, global_registry, PluginRegistry, WebexClient};
use webex_foundation::Result;

/// 모든 기본 플러그인 등록
///
/// 순서: `device` → `credentials` → `rooms` → `messages` → `people` → `memberships`
pub fn register_all(registry: &PluginRegistry) -> Result<()> {
    device::register(registry)?;
    credentials::register(registry)?;
    rooms::register(registry)?;
    messages::register(registry)?;
    people::register(registry)?;
    memberships::register(registry)?;

    debug!(plugins = registry.len(), "Registered default plugins");
    Ok(())
}

/// 전역 레지스트리에 기본 플러그인 등록
pub fn register_global() -> Result<()> {
    register_all(&global_registry())
}

// ============================================================================
// WebexExt - 타입이 있는 플러그인 접근
// ============================================================================

/// `WebexClient`에서 구체 플러그인을 꺼내는 확장
pub trait WebexExt {
    fn rooms(&self) -> Result<Arc<Rooms>>;
    fn messages(&self) -> Result<Arc<Messages>>;
    fn people(&self) -> Result<Arc<People>>;
    fn memberships(&self) -> Result<Arc<Memberships>>;
    fn device(&self) -> Result<Arc<Device>>;
    fn credentials(&self) -> Result<Arc<credentials::Credentials>>;
}

impl WebexExt for WebexClient {
    fn rooms(&self) -> Result<Arc<Rooms>> {
        self.plugin_as(Rooms::NAME)
    }

    fn messages(&self) -> Result<Arc<Messages>> {
        self.plugin_as(Messages::NAME)
    }

    fn people(&self) -> Result<Arc<People>> {
        self.plugin_as(People::NAME)
    }

    fn memberships(&self) -> Result<Arc<Memberships>> {
        self.plugin_as(Memberships::NAME)
    }

    fn device(&self) -> Result<Arc<Device>> {
        self.internal_as(Device::NAME)
    }

    fn credentials(&self) -> Result<Arc<credentials::Credentials>> {
        self.plugin_as(credentials::Credentials::NAME)
    }
}
