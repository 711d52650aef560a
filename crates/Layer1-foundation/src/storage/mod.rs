//! Storage module for the Webex SDK
//!
//! - `adapter`: StorageAdapter 트레이트 + 네임스페이스 바인딩 핸들
//! - `memory`: 메모리 어댑터 (기본값, 테스트용 preload 지원)
//! - `json`: JSON 파일 저장소 + 파일 기반 어댑터

mod adapter;
mod json;
mod memory;

pub use adapter::{BoundStorage, StorageAdapter};
pub use json::{JsonFileAdapter, JsonStore};
pub use memory::MemoryStoreAdapter;
