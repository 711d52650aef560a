//! Webex Config - 파일 기반 사용자 설정
//!
//! 글로벌(`<config_dir>/webex/`) + 프로젝트(`.webex/`) 설정을 병합해 로드합니다.
//! 여기서 읽은 `client` 트리는 클라이언트 구성 시 "사용자" 레이어가 됩니다.

use super::merge::deep_merge;
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 설정 파일명
pub const WEBEX_CONFIG_FILE: &str = "config.json";

// ============================================================================
// Webex Config
// ============================================================================

/// Webex SDK 파일 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebexConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 기본 액세스 토큰
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// 로그 레벨 (`RUST_LOG`가 없을 때 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// 클라이언트 설정 트리 (플러그인 기본값보다 우선)
    #[serde(default = "empty_object")]
    pub client: Value,
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            access_token: None,
            log_level: None,
            client: empty_object(),
        }
    }
}

impl WebexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.read::<WebexConfig>(WEBEX_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.read::<WebexConfig>(WEBEX_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 특정 저장소에서 로드
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .read::<WebexConfig>(WEBEX_CONFIG_FILE)?
            .unwrap_or_default())
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: WebexConfig) {
        if other.access_token.is_some() {
            self.access_token = other.access_token;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if !other.client.is_null() {
            deep_merge(&mut self.client, &other.client);
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn client(mut self, client: Value) -> Self {
        deep_merge(&mut self.client, &client);
        self
    }
}

fn default_version() -> u32 {
    1
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = WebexConfig::new()
            .access_token("global-token")
            .client(json!({"rooms": {"pageSize": 10}, "trackingIdPrefix": "cli"}));
        let project = WebexConfig::new().client(json!({"rooms": {"pageSize": 50}}));

        base.merge(project);

        assert_eq!(base.access_token.as_deref(), Some("global-token"));
        assert_eq!(base.client["rooms"]["pageSize"], json!(50));
        assert_eq!(base.client["trackingIdPrefix"], json!("cli"));
    }

    #[test]
    fn test_round_trip_through_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        let config = WebexConfig::new().access_token("abc");
        store.write(WEBEX_CONFIG_FILE, &config).unwrap();

        let loaded = WebexConfig::load_from(&store).unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("abc"));
        assert!(loaded.client.is_object());
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("nope"));

        let loaded = WebexConfig::load_from(&store).unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.access_token.is_none());
    }
}
