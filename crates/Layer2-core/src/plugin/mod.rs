//! # Plugin System
//!
//! 플러그인 선언, 등록, 인스턴스 인터페이스
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                          │
//! │  ┌──────────────────────────┬──────────────────────────┐    │
//! │  │ public                   │ internal                 │    │
//! │  │  credentials, rooms, ... │  device, ...             │    │
//! │  └──────────────────────────┴──────────────────────────┘    │
//! │                          │ PluginDescriptor                 │
//! │                          ▼ (factory + config + proxies)     │
//! │                     WebexClient (Composer)                  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │     PluginContext                                     │  │
//! │  │  - Weak<client>   - config[name]                      │  │
//! │  │  - BoundStorage   - request pipeline                  │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct Rooms { ctx: PluginContext, state: Observable }
//!
//! impl Plugin for Rooms { ... }
//!
//! registry.register_plugin(
//!     "rooms",
//!     factory(Rooms::new),
//!     RegisterOptions::new().config(json!({"rooms": {"pageSize": 100}})),
//! )?;
//! ```

mod descriptor;
mod registry;
mod traits;

pub use descriptor::{factory, PluginDescriptor, PluginFactory, RegisterOptions};
pub use registry::{global_registry, register_internal_plugin, register_plugin, PluginRegistry};
pub use traits::{Namespace, Plugin, PluginContext, PluginStatus};
