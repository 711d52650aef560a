//! TrackingID - 요청 추적 헤더 생성

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// 요청 추적 ID 헤더 이름
pub const TRACKING_ID_HEADER: &str = "TrackingID";

/// `<prefix>_<base>_<count>` 형식의 추적 ID 생성기
///
/// `base`는 클라이언트마다 한 번 생성되고, `count`는 요청마다 1씩 증가합니다.
#[derive(Debug)]
pub struct TrackingId {
    prefix: String,
    base: String,
    count: AtomicU64,
}

impl TrackingId {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            base: Uuid::new_v4().to_string(),
            count: AtomicU64::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// 지금까지 발급한 수
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// 다음 추적 ID
    pub fn next(&self) -> String {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}_{}_{}", self.prefix, self.base, count)
    }
}
