//! # webex-foundation
//!
//! Foundation layer for the Webex SDK:
//! - Error: 공통 에러 타입 + Exception (메시지 파싱 규칙)
//! - Event: 이름 기반 이벤트 emitter + 관찰 가능한 상태 (Observable)
//! - Config: 레이어 병합 (defaults < internal < public < user) + 파일 설정
//! - Storage: 교체 가능한 namespace/key 저장소 (메모리, JSON 파일)
//! - Html: 메시지 본문용 이스케이프/허용 목록 필터
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  webex-core (Plugin Registry + Composer)                │
//! │                     │                                   │
//! │        ┌────────────┼─────────────┐                     │
//! │        ▼            ▼             ▼                     │
//! │   Observable    ConfigLayers   StorageAdapter           │
//! │   (상태/이벤트)  (설정 병합)     (Memory / JsonFile)       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod html;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Exception, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{deep_merge, get_path, ConfigLayers, LayerKind, WebexConfig, WEBEX_CONFIG_FILE};

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{Event, EventEmitter, Handler, HandlerId, Observable};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{BoundStorage, JsonFileAdapter, JsonStore, MemoryStoreAdapter, StorageAdapter};

// ============================================================================
// Html
// ============================================================================
pub use html::AllowedTags;
