//! # Request Pipeline
//!
//! 플러그인이 공유하는 HTTP 요청 처리
//!
//! - `RequestOptions`: method + (uri | service/resource) + body/qs/headers/auth
//! - `PayloadTransform`: 이름이 있는 inbound/outbound 본문 재작성 규칙
//! - `HttpTransport`: 교체 가능한 전송 (`ReqwestTransport`, 테스트용 `mock::MockTransport`)
//! - `WebexHttpError`: 상태 ≥ 400 응답
//! - `retry`: 429/5xx/네트워크 에러 지수 백오프

mod error;
pub mod mock;
mod options;
mod pipeline;
pub mod retry;
mod tracking;
mod transform;
mod transport;

pub use error::WebexHttpError;
pub use options::{RequestOptions, Target};
pub use pipeline::{join_url, resolve_url, RequestPipeline};
pub use retry::RetryConfig;
pub use reqwest::Method;
pub use tracking::{TrackingId, TRACKING_ID_HEADER};
pub use transform::{Direction, PayloadTransform, Predicate, TransformChain, TransformContext, TransformFn};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
