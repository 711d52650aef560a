//! Config - 설정 병합 및 로드
//!
//! - `merge.rs` - JSON 설정 트리 깊은 병합 + 레이어 우선순위
//! - `webex.rs` - WebexConfig 파일 설정 (글로벌 + 프로젝트)

mod merge;
mod webex;

pub use merge::{deep_merge, get_path, ConfigLayers, LayerKind};
pub use webex::{WebexConfig, WEBEX_CONFIG_FILE};
