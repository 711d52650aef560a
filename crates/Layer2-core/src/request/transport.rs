//! HTTP Transport - 실제 전송 계층 추상화

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;
use webex_foundation::{Error, Result};

/// 전송 직전의 요청
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    /// 헤더 조회 (대소문자 무시)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// 응답 (`{body, statusCode, headers}`)
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,

    /// 헤더 이름은 소문자
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// HTTP 전송 트레이트
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 요청 전송. 상태 코드와 무관하게 응답을 돌려주고, 전송 실패만 에러입니다.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// reqwest 기반 전송
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        trace!(status_code, bytes = text.len(), "Received response");

        Ok(HttpResponse {
            status_code,
            headers,
            body: parse_body(&text),
        })
    }
}

/// 응답 본문 파싱 (JSON이 아니면 문자열, 비어있으면 null)
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"id":"r1"}"#), json!({"id": "r1"}));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn test_response_headers_case_insensitive() {
        let response = HttpResponse::new(429, Value::Null).with_header("Retry-After", "2");
        assert_eq!(response.header("retry-after"), Some("2"));
        assert_eq!(response.header("RETRY-AFTER"), Some("2"));
        assert!(!response.is_success());
    }
}
