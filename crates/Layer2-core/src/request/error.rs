//! WebexHttpError - 4xx/5xx 응답 에러

use super::transport::HttpResponse;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use webex_foundation::{Error, Exception};

/// 서비스가 돌려준 HTTP 에러
#[derive(Debug, Clone, Error)]
#[error("{status_code} {reason}: {message}")]
pub struct WebexHttpError {
    pub status_code: u16,
    pub reason: String,
    pub message: String,
    pub tracking_id: Option<String>,
    pub body: Value,
}

impl Exception for WebexHttpError {
    type Source = HttpResponse;

    const NAME: &'static str = "WebexHttpError";
    const DEFAULT_MESSAGE: &'static str = "An unknown error was received from the service";

    /// 본문의 `message` → `error` → `errors[].description` 순으로 메시지 추출
    fn parse(response: &HttpResponse) -> Option<String> {
        let body = &response.body;

        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }

        match body.get("error") {
            Some(Value::String(error)) => return Some(error.clone()),
            Some(Value::Object(error)) => {
                if let Some(message) = error.get("message").and_then(Value::as_str) {
                    return Some(message.to_string());
                }
            }
            _ => {}
        }

        let descriptions: Vec<&str> = body
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("description").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();
        if !descriptions.is_empty() {
            return Some(descriptions.join("; "));
        }

        body.as_str().map(str::to_string)
    }
}

impl WebexHttpError {
    /// 응답으로부터 생성
    pub fn from_response(response: &HttpResponse) -> Self {
        let reason = StatusCode::from_u16(response.status_code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();

        Self {
            status_code: response.status_code,
            reason,
            message: Self::message_for(response),
            tracking_id: response.header("trackingid").map(str::to_string),
            body: response.body.clone(),
        }
    }
}

impl From<WebexHttpError> for Error {
    fn from(e: WebexHttpError) -> Self {
        Error::Http {
            status_code: e.status_code,
            reason: e.reason,
            message: e.message,
        }
    }
}
