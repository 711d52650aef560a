//! Event System - 이벤트 발행/구독 및 변경 알림
//!
//! 모든 플러그인 인스턴스와 루트 클라이언트가 공유하는 이벤트/상태 믹스인입니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Observable                             │
//! │  ┌──────────────────────┐   set(key, value)                 │
//! │  │  attributes (Map)    │ ──────────────┐                   │
//! │  └──────────────────────┘               ▼                   │
//! │                              ┌────────────────────┐         │
//! │                              │   EventEmitter     │         │
//! │                              │  change:<key>      │         │
//! │                              │  change            │         │
//! │                              └────────────────────┘         │
//! │                                 │        │        │         │
//! │                                 ▼        ▼        ▼         │
//! │                            handler 1  handler 2  handler N  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use webex_foundation::event::Observable;
//!
//! let state = Observable::new();
//! state.on("change:ready", |event| println!("ready -> {:?}", event.arg(0)));
//! state.set("ready", true);
//! ```

pub mod emitter;
pub mod state;

pub use emitter::{Event, EventEmitter, Handler, HandlerId};
pub use state::Observable;
