//! Request Options - 플러그인이 공유 파이프라인에 넘기는 요청 기술

use reqwest::Method;
use serde_json::Value;

/// 요청 대상
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// 완전한 URI
    Uri(String),

    /// `config.services.<service>` + `/` + `resource`
    Service { service: String, resource: String },
}

/// 요청 옵션
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub target: Target,
    pub body: Option<Value>,
    pub qs: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,

    /// Authorization 헤더 첨부 여부 (기본 true)
    pub auth: bool,
}

impl RequestOptions {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            body: None,
            qs: Vec::new(),
            headers: Vec::new(),
            auth: true,
        }
    }

    /// 서비스 기반 요청
    pub fn service(method: Method, service: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::new(
            method,
            Target::Service {
                service: service.into(),
                resource: resource.into(),
            },
        )
    }

    /// URI 기반 요청
    pub fn uri(method: Method, uri: impl Into<String>) -> Self {
        Self::new(method, Target::Uri(uri.into()))
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qs.push((key.into(), value.into()));
        self
    }

    /// 객체의 스칼라 필드를 쿼리스트링으로 추가 (null은 건너뜀)
    pub fn qs(mut self, params: &Value) -> Self {
        if let Value::Object(map) = params {
            for (key, value) in map {
                let value = match value {
                    Value::Null => continue,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.qs.push((key.clone(), value));
            }
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    /// 로그용 대상 표기
    pub fn describe(&self) -> String {
        match &self.target {
            Target::Uri(uri) => format!("{} {}", self.method, uri),
            Target::Service { service, resource } => {
                format!("{} {}:{}", self.method, service, resource)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qs_skips_null_and_stringifies() {
        let options = RequestOptions::service(Method::GET, "hydra", "rooms").qs(&json!({
            "max": 50,
            "type": "group",
            "teamId": null
        }));

        assert!(options.qs.contains(&("max".to_string(), "50".to_string())));
        assert!(options.qs.contains(&("type".to_string(), "group".to_string())));
        assert_eq!(options.qs.len(), 2);
    }

    #[test]
    fn test_defaults() {
        let options = RequestOptions::uri(Method::POST, "https://example.com/x");
        assert!(options.auth);
        assert!(options.body.is_none());
        assert_eq!(options.describe(), "POST https://example.com/x");
    }
}
