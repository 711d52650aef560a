//! MockTransport - 테스트용 메모리 전송
//!
//! 큐에 넣은 응답을 순서대로 돌려주고, 큐가 비면 핸들러를 호출합니다.
//! 보낸 요청은 모두 기록됩니다.

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use webex_foundation::{Error, Result};

type MockHandler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync>;

/// 테스트용 전송
#[derive(Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<Result<HttpResponse>>>,
    handler: Option<MockHandler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 큐가 비었을 때 사용할 핸들러 지정
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Default::default()
        }
    }

    /// 응답 예약
    pub fn push_response(&self, response: HttpResponse) {
        self.queue.lock().push_back(Ok(response));
    }

    /// 전송 실패 예약
    pub fn push_error(&self, error: Error) {
        self.queue.lock().push_back(Err(error));
    }

    /// 기록된 요청
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());

        if let Some(queued) = self.queue.lock().pop_front() {
            return queued;
        }

        match &self.handler {
            Some(handler) => handler(&request),
            None => Err(Error::Network(format!(
                "no mock response for {} {}",
                request.method, request.url
            ))),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &self.queue.lock().len())
            .field("has_handler", &self.handler.is_some())
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}
