//! Retry logic with exponential backoff

use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 재시도 설정 (`config.request.retry`)
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (첫 시도 제외)
    pub max_retries: u32,

    /// 첫 재시도 대기 (밀리초)
    pub initial_delay_ms: u64,

    /// 지수 백오프 배수
    pub backoff_multiplier: f64,

    /// 최대 대기 (밀리초)
    pub max_delay_ms: u64,

    /// 지터 추가 여부
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// 재시도 없음
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// 설정 트리에서 읽기 (없는 키는 기본값)
    pub fn from_config(value: Option<&Value>) -> Self {
        let mut config = Self::default();
        let Some(value) = value else {
            return config;
        };

        if let Some(n) = value.get("maxRetries").and_then(Value::as_u64) {
            config.max_retries = n as u32;
        }
        if let Some(n) = value.get("initialDelayMs").and_then(Value::as_u64) {
            config.initial_delay_ms = n;
        }
        if let Some(n) = value.get("maxDelayMs").and_then(Value::as_u64) {
            config.max_delay_ms = n;
        }
        if let Some(n) = value.get("backoffMultiplier").and_then(Value::as_f64) {
            config.backoff_multiplier = n;
        }
        if let Some(b) = value.get("jitter").and_then(Value::as_bool) {
            config.jitter = b;
        }
        config
    }

    /// 시도 번호(0부터)에 대한 대기 시간
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);

        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let final_delay = if self.jitter {
            // 20% 지터 (0.8 ~ 1.2)
            let jitter_factor = 0.8 + rand_jitter() * 0.4;
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }

    /// 서버가 요구한 대기 시간. `max_delay_ms`를 넘지 않음
    pub fn retry_after_delay(&self, retry_after_ms: u64) -> Duration {
        Duration::from_millis(retry_after_ms.min(self.max_delay_ms))
    }
}

/// 간단한 의사 난수 (0.0 ~ 1.0)
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// 재시도 판단을 위한 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClassification {
    /// 일시적 에러
    Retry,

    /// 영구적 에러
    NoRetry,

    /// 속도 제한 - `Retry-After`가 있으면 그 값을 사용
    RateLimited { retry_after_ms: Option<u64> },
}

/// 재시도 분류가 가능한 에러
pub trait RetryableError {
    fn classify(&self) -> RetryClassification;
}

/// 재시도 로직으로 비동기 작업 실행
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                match classification {
                    RetryClassification::NoRetry => {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            error = %e,
                            "Non-retryable failure"
                        );
                        return Err(e);
                    }
                    RetryClassification::Retry | RetryClassification::RateLimited { .. } => {
                        if attempt >= config.max_retries {
                            warn!(
                                operation = operation_name,
                                max_retries = config.max_retries,
                                error = %e,
                                "Retries exhausted"
                            );
                            return Err(e);
                        }

                        let delay = match classification {
                            RetryClassification::RateLimited {
                                retry_after_ms: Some(ms),
                            } => config.retry_after_delay(ms),
                            _ => config.delay_for_attempt(attempt),
                        };

                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Request failed, retrying"
                        );

                        sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
