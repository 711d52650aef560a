//! Client Options - 클라이언트 생성 옵션과 코어 기본 설정

use crate::request::HttpTransport;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use webex_foundation::{deep_merge, StorageAdapter};

/// 코어 기본 설정 (가장 낮은 우선순위 레이어)
pub fn core_defaults() -> Value {
    json!({
        "trackingIdPrefix": "webex-js-sdk",
        "services": {
            "hydra": "https://webexapis.com/v1"
        },
        "request": {
            "retry": {
                "maxRetries": 3,
                "initialDelayMs": 1000,
                "maxDelayMs": 30000
            }
        },
        "storage": {
            "namespacePrefix": ""
        }
    })
}

/// 클라이언트 생성 옵션 (`{credentials, config}` + 스토리지/전송 선택)
#[derive(Clone)]
pub struct ClientOptions {
    pub(crate) credentials: Option<Value>,
    pub(crate) config: Value,
    pub(crate) storage: Option<Arc<dyn StorageAdapter>>,
    pub(crate) transport: Option<Arc<dyn HttpTransport>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            config: Value::Object(Map::new()),
            storage: None,
            transport: None,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 자격 증명 (토큰 문자열 또는 객체)
    pub fn credentials(mut self, credentials: impl Into<Value>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    /// 사용자 설정 (가장 높은 우선순위). 여러 번 호출하면 깊은 병합
    pub fn config(mut self, config: Value) -> Self {
        deep_merge(&mut self.config, &config);
        self
    }

    /// 스토리지 어댑터 (기본: 메모리)
    pub fn storage(mut self, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(adapter);
        self
    }

    /// HTTP 전송 (기본: reqwest)
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 플러그인 컨텍스트에 전달할 초기 속성
    pub(crate) fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        if let Some(credentials) = &self.credentials {
            attributes.insert("credentials".to_string(), credentials.clone());
        }
        attributes
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("config", &self.config)
            .field("storage", &self.storage.as_ref().map(|s| s.name().to_string()))
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_calls_merge() {
        let options = ClientOptions::new()
            .config(json!({"rooms": {"pageSize": 10}}))
            .config(json!({"rooms": {"sort": "lastactivity"}}));

        assert_eq!(options.config["rooms"]["pageSize"], json!(10));
        assert_eq!(options.config["rooms"]["sort"], json!("lastactivity"));
    }

    #[test]
    fn test_attributes_carry_credentials() {
        let options = ClientOptions::new().credentials("AT");
        assert_eq!(options.attributes()["credentials"], json!("AT"));
        assert!(ClientOptions::new().attributes().is_empty());
        assert!(format!("{:?}", options).contains("<redacted>"));
    }
}
