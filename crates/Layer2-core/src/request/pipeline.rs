//! Request Pipeline - 모든 플러그인이 공유하는 요청 처리
//!
//! ```text
//! RequestOptions ─▶ outbound transforms ─▶ TrackingID / Authorization
//!                ─▶ transport (재시도: 429, 5xx, 네트워크) ─▶ 상태 ≥ 400 → WebexHttpError
//!                ─▶ inbound transforms ─▶ HttpResponse
//! ```

use super::error::WebexHttpError;
use super::options::{RequestOptions, Target};
use super::retry::{with_retry, RetryClassification, RetryConfig, RetryableError};
use super::tracking::{TrackingId, TRACKING_ID_HEADER};
use super::transform::{Direction, TransformChain, TransformContext};
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::ServiceCatalog;
use std::sync::Arc;
use tracing::debug;
use webex_foundation::{Error, Result};

/// 서비스 이름/리소스를 URL로 변환
///
/// 서비스가 카탈로그에 없으면 `NotFound`
pub fn resolve_url(services: &ServiceCatalog, target: &Target) -> Result<String> {
    match target {
        Target::Uri(uri) => Ok(uri.clone()),
        Target::Service { service, resource } => {
            let base = services
                .get(service, None)
                .ok_or_else(|| Error::NotFound(format!("service `{}` is not configured", service)))?;
            Ok(join_url(&base, resource))
        }
    }
}

/// 서비스 기본 URL과 리소스 경로 결합
pub fn join_url(base: &str, resource: &str) -> String {
    let base = base.trim_end_matches('/');
    let resource = resource.trim_start_matches('/');
    if resource.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, resource)
    }
}

// ============================================================================
// 시도 단위 실패
// ============================================================================

/// 한 번의 전송 시도 실패 (`Retry-After` 보존)
struct AttemptFailure {
    error: Error,
    retry_after_ms: Option<u64>,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl RetryableError for AttemptFailure {
    fn classify(&self) -> RetryClassification {
        if self.error.status_code() == Some(429) || self.retry_after_ms.is_some() {
            return RetryClassification::RateLimited {
                retry_after_ms: self.retry_after_ms,
            };
        }
        if self.error.is_retryable() {
            RetryClassification::Retry
        } else {
            RetryClassification::NoRetry
        }
    }
}

async fn attempt(
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
) -> std::result::Result<HttpResponse, AttemptFailure> {
    let response = transport.send(request).await.map_err(|error| AttemptFailure {
        error,
        retry_after_ms: None,
    })?;

    if response.is_success() {
        return Ok(response);
    }

    let retry_after_ms = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000));

    Err(AttemptFailure {
        error: WebexHttpError::from_response(&response).into(),
        retry_after_ms,
    })
}

// ============================================================================
// RequestPipeline
// ============================================================================

/// 공유 요청 파이프라인
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    transforms: TransformChain,
    tracking: TrackingId,
    retry: RetryConfig,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        transforms: TransformChain,
        tracking: TrackingId,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            transforms,
            tracking,
            retry,
        }
    }

    pub fn tracking(&self) -> &TrackingId {
        &self.tracking
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.transforms
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// 요청 실행
    ///
    /// `url`은 이미 해석된 주소, `authorization`은 첨부할 헤더 값입니다.
    pub async fn execute(
        &self,
        url: String,
        options: RequestOptions,
        authorization: Option<String>,
    ) -> Result<HttpResponse> {
        let description = options.describe();
        let method = options.method.to_string();

        let outbound = TransformContext {
            direction: Direction::Outbound,
            method: method.clone(),
            uri: url.clone(),
            status_code: None,
        };
        let body = match options.body {
            Some(body) => Some(self.transforms.run(&outbound, body)?),
            None => None,
        };

        let tracking_id = self.tracking.next();
        let mut headers = options.headers;
        headers.push((TRACKING_ID_HEADER.to_string(), tracking_id.clone()));
        if let Some(authorization) = authorization {
            headers.push(("Authorization".to_string(), authorization));
        }

        let request = HttpRequest {
            method: options.method,
            url: url.clone(),
            headers,
            query: options.qs,
            body,
        };

        debug!(tracking_id = %tracking_id, request = %description, "Sending request");

        let mut response = with_retry(&self.retry, &description, || {
            attempt(Arc::clone(&self.transport), request.clone())
        })
        .await
        .map_err(|failure| failure.error)?;

        debug!(
            tracking_id = %tracking_id,
            status_code = response.status_code,
            "Request completed"
        );

        let inbound = TransformContext {
            direction: Direction::Inbound,
            method,
            uri: url,
            status_code: Some(response.status_code),
        };
        let body = std::mem::take(&mut response.body);
        response.body = self.transforms.run(&inbound, body)?;

        Ok(response)
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("transforms", &self.transforms)
            .field("tracking", &self.tracking)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::mock::MockTransport;
    use crate::request::PayloadTransform;
    use reqwest::Method;
    use serde_json::json;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
            jitter: false,
            ..Default::default()
        }
    }

    fn pipeline(transport: Arc<MockTransport>, transforms: TransformChain) -> RequestPipeline {
        RequestPipeline::new(transport, transforms, TrackingId::new("test"), fast_retry())
    }

    #[test]
    fn test_resolve_url() {
        let services = ServiceCatalog::from_config(Some(&json!({
            "hydra": "https://webexapis.com/v1/"
        })));

        let url = resolve_url(
            &services,
            &Target::Service {
                service: "hydra".into(),
                resource: "/rooms".into(),
            },
        )
        .unwrap();
        assert_eq!(url, "https://webexapis.com/v1/rooms");

        let missing = resolve_url(
            &services,
            &Target::Service {
                service: "wdm".into(),
                resource: "devices".into(),
            },
        );
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_headers_and_transforms() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(200, json!({"id": "r1"})));

        let mut transforms = TransformChain::new();
        transforms.push(PayloadTransform::outbound("stamp", |_, _| true, |_, mut body| {
            body["stamped"] = json!(true);
            Ok(body)
        }));
        transforms.push(PayloadTransform::inbound("mark", |_, _| true, |ctx, mut body| {
            body["status"] = json!(ctx.status_code);
            Ok(body)
        }));

        let pipeline = pipeline(Arc::clone(&transport), transforms);
        let response = pipeline
            .execute(
                "https://webexapis.com/v1/rooms".into(),
                RequestOptions::uri(Method::POST, "unused").body(json!({"title": "x"})),
                Some("Bearer AT".into()),
            )
            .await
            .unwrap();

        assert_eq!(response.body, json!({"id": "r1", "status": 200}));

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.body, Some(json!({"title": "x", "stamped": true})));
        assert_eq!(sent.header("authorization"), Some("Bearer AT"));
        assert!(sent.header("trackingid").unwrap().starts_with("test_"));
        assert!(sent.header("trackingid").unwrap().ends_with("_1"));
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(
            HttpResponse::new(429, json!({"message": "slow down"})).with_header("Retry-After", "0"),
        );
        transport.push_response(HttpResponse::new(200, json!({"ok": true})));

        let pipeline = pipeline(Arc::clone(&transport), TransformChain::new());
        let response = pipeline
            .execute(
                "https://webexapis.com/v1/rooms".into(),
                RequestOptions::uri(Method::GET, "unused"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.body["ok"], json!(true));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_huge_retry_after_is_capped() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(
            HttpResponse::new(429, json!({})).with_header("Retry-After", "18446744073709552"),
        );
        transport.push_response(
            HttpResponse::new(429, json!({})).with_header("Retry-After", "86400"),
        );
        transport.push_response(HttpResponse::new(200, json!({"ok": true})));

        let pipeline = RequestPipeline::new(
            Arc::<MockTransport>::clone(&transport),
            TransformChain::new(),
            TrackingId::new("test"),
            RetryConfig {
                max_delay_ms: 5,
                ..fast_retry()
            },
        );
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            pipeline.execute(
                "https://webexapis.com/v1/rooms".into(),
                RequestOptions::uri(Method::GET, "unused"),
                None,
            ),
        )
        .await
        .expect("Retry-After should be capped by maxDelayMs")
        .unwrap();

        assert_eq!(response.body["ok"], json!(true));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(404, json!({"message": "Room not found"})));

        let pipeline = pipeline(Arc::clone(&transport), TransformChain::new());
        let err = pipeline
            .execute(
                "https://webexapis.com/v1/rooms/nope".into(),
                RequestOptions::uri(Method::GET, "unused"),
                None,
            )
            .await
            .unwrap_err();

        match err {
            Error::Http {
                status_code,
                message,
                ..
            } => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "Room not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let transport = Arc::new(MockTransport::with_handler(|_| {
            Ok(HttpResponse::new(503, json!({})))
        }));

        let pipeline = pipeline(Arc::clone(&transport), TransformChain::new());
        let err = pipeline
            .execute(
                "https://webexapis.com/v1/rooms".into(),
                RequestOptions::uri(Method::GET, "unused"),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(503));
        assert_eq!(transport.request_count(), 3);
    }
}
