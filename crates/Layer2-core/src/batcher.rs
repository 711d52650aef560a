//! Batcher - 짧은 시간 안의 단건 요청을 배치 API 요청 하나로 합침
//!
//! ```text
//! request(item) ─▶ fingerprint ─▶ (대기 중인 같은 항목이 있으면 그 결과 공유)
//!               ─▶ queue ─▶ debounce (wait / maxWait / maxCalls) ─▶ submit(batch)
//!               ─▶ 응답 항목 fingerprint ─▶ 대기자 완료
//! ```

use crate::request::HttpResponse;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};
use webex_foundation::{Error, Result};

/// 배치 API 어댑터
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    /// 요청 항목 식별자 (같은 값이면 하나의 요청으로 합침)
    fn fingerprint_request(&self, item: &Value) -> Result<String>;

    /// 응답 항목 식별자 (`fingerprint_request`와 같은 값이어야 함)
    fn fingerprint_response(&self, item: &Value) -> Result<String>;

    /// 모인 항목을 한 번에 전송
    async fn submit(&self, items: Vec<Value>) -> Result<HttpResponse>;

    /// 응답 본문의 항목들 (`items` 또는 배열 본문)
    fn response_items(&self, body: &Value) -> Vec<Value> {
        match body.get("items").unwrap_or(body) {
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// 응답 항목이 실패를 뜻하는지
    fn did_item_fail(&self, _item: &Value) -> bool {
        false
    }
}

/// 배치 타이밍 설정 (플러그인 설정의 `batcherWait`/`batcherMaxWait`/`batcherMaxCalls`)
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// 마지막 요청 후 대기
    pub wait: Duration,

    /// 첫 요청 후 최대 대기
    pub max_wait: Duration,

    /// 한 배치의 최대 항목 수
    pub max_calls: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(100),
            max_wait: Duration::from_millis(1500),
            max_calls: 50,
        }
    }
}

impl BatcherConfig {
    pub fn from_config(value: &Value) -> Self {
        let mut config = Self::default();
        if let Some(ms) = value.get("batcherWait").and_then(Value::as_u64) {
            config.wait = Duration::from_millis(ms);
        }
        if let Some(ms) = value.get("batcherMaxWait").and_then(Value::as_u64) {
            config.max_wait = Duration::from_millis(ms);
        }
        if let Some(n) = value.get("batcherMaxCalls").and_then(Value::as_u64) {
            config.max_calls = usize::try_from(n).unwrap_or(usize::MAX).max(1);
        }
        config
    }
}

// ============================================================================
// Batcher
// ============================================================================

type Waiter = oneshot::Sender<Result<Value>>;

#[derive(Default)]
struct BatchState {
    queue: Vec<Value>,
    waiters: HashMap<String, Vec<Waiter>>,
    /// 현재 배치 창이 열린 시각
    window: Option<Instant>,
    /// 큐에 항목이 들어올 때마다 증가
    generation: u64,
}

struct BatcherInner<H> {
    handler: H,
    config: BatcherConfig,
    state: Mutex<BatchState>,
}

/// 요청 병합기
///
/// 복제는 같은 큐를 공유합니다. 타이머는 tokio 런타임에서 실행됩니다.
pub struct Batcher<H: BatchHandler> {
    inner: Arc<BatcherInner<H>>,
}

impl<H: BatchHandler> Clone for Batcher<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: BatchHandler> Batcher<H> {
    pub fn new(handler: H, config: BatcherConfig) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                handler,
                config,
                state: Mutex::new(BatchState::default()),
            }),
        }
    }

    pub fn handler(&self) -> &H {
        &self.inner.handler
    }

    /// 큐에서 전송을 기다리는 항목 수
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// 항목 하나 요청. 같은 배치 응답의 해당 항목으로 완료
    pub async fn request(&self, item: Value) -> Result<Value> {
        let fingerprint = self.inner.handler.fingerprint_request(&item)?;
        let (tx, rx) = oneshot::channel();

        let schedule = {
            let mut state = self.inner.state.lock();
            match state.waiters.get_mut(&fingerprint) {
                Some(waiters) => {
                    debug!(fingerprint = %fingerprint, "Joining pending batch request");
                    waiters.push(tx);
                    None
                }
                None => {
                    state.waiters.insert(fingerprint, vec![tx]);
                    state.queue.push(item);
                    state.generation += 1;
                    let window = *state.window.get_or_insert_with(Instant::now);
                    let full = state.queue.len() >= self.inner.config.max_calls;
                    Some((full, state.generation, window))
                }
            }
        };

        match schedule {
            Some((true, _, _)) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.flush().await });
            }
            Some((false, generation, window)) => self.inner.schedule(generation, window),
            None => {}
        }

        rx.await
            .map_err(|_| Error::Internal("batch was dropped before completing".into()))?
    }
}

impl<H: BatchHandler> BatcherInner<H> {
    /// debounce 타이머: 마지막 요청 후 `wait`, 창이 열린 후 최대 `max_wait`
    fn schedule(self: &Arc<Self>, generation: u64, window: Instant) {
        let cap = window + self.config.max_wait;
        let deadline = (Instant::now() + self.config.wait).min(cap);
        let inner = Arc::clone(self);

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let due = {
                let state = inner.state.lock();
                state.window == Some(window)
                    && (state.generation == generation || Instant::now() >= cap)
            };
            if due {
                inner.flush().await;
            }
        });
    }

    /// 큐에서 최대 `max_calls`개를 꺼내 전송
    async fn flush(self: &Arc<Self>) {
        let (batch, leftover) = {
            let mut state = self.state.lock();
            let count = state.queue.len().min(self.config.max_calls);
            let batch: Vec<Value> = state.queue.drain(..count).collect();

            state.window = None;
            let leftover = if state.queue.is_empty() {
                None
            } else {
                let window = Instant::now();
                state.window = Some(window);
                Some((state.generation, window))
            };
            (batch, leftover)
        };

        if let Some((generation, window)) = leftover {
            self.schedule(generation, window);
        }
        if batch.is_empty() {
            return;
        }

        debug!(items = batch.len(), "Submitting batch");
        let fingerprints: Vec<String> = batch
            .iter()
            .filter_map(|item| self.handler.fingerprint_request(item).ok())
            .collect();

        match self.handler.submit(batch).await {
            Ok(response) => {
                for item in self.handler.response_items(&response.body) {
                    let fingerprint = match self.handler.fingerprint_response(&item) {
                        Ok(fingerprint) => fingerprint,
                        Err(e) => {
                            warn!(error = %e, "Could not fingerprint batch response item");
                            continue;
                        }
                    };
                    let result = if self.handler.did_item_fail(&item) {
                        Err(Error::NotFound(format!("batch item `{}` failed", fingerprint)))
                    } else {
                        Ok(item)
                    };
                    self.complete(&fingerprint, result);
                }

                // 응답에 없던 항목
                for fingerprint in fingerprints {
                    let missing =
                        Error::NotFound(format!("batch response has no item `{}`", fingerprint));
                    self.complete(&fingerprint, Err(missing));
                }
            }
            Err(e) => {
                warn!(error = %e, "Batch request failed");
                for fingerprint in fingerprints {
                    self.complete(&fingerprint, Err(e.replicate()));
                }
            }
        }
    }

    /// 대기자 모두에게 결과 전달
    fn complete(&self, fingerprint: &str, result: Result<Value>) {
        let Some(waiters) = self.state.lock().waiters.remove(fingerprint) else {
            return;
        };

        for waiter in waiters {
            let copy = match &result {
                Ok(value) => Ok(value.clone()),
                Err(e) => Err(e.replicate()),
            };
            let _ = waiter.send(copy);
        }
    }
}
