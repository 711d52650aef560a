//! # Services
//!
//! 서비스 이름 → 호스트 URL 해석
//!
//! - `ServiceGroup`: 카탈로그 그룹 (`override` > `postauth` > `signin` > `preauth` > `discovery`)
//! - `ServiceHost`: 클러스터 호스트 하나 (우선순위, 실패/교체 상태)
//! - `ServiceCatalog`: 그룹별 호스트, `mark_failed_url` 실패 전환, 허용 도메인

mod catalog;
mod host;

pub use catalog::{ServiceCatalog, DEFAULT_ALLOWED_DOMAINS};
pub use host::ServiceHost;

/// 서비스 카탈로그 그룹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceGroup {
    /// 정적 설정 (`config.services`)
    Discovery,
    /// 인증 전 카탈로그
    Preauth,
    /// 로그인 카탈로그
    Signin,
    /// 인증 후 카탈로그 (장치 등록 응답 등)
    Postauth,
    /// 사용자 지정 (`config.services.override`)
    Override,
}

impl ServiceGroup {
    /// 이름 조회 순서 (앞이 우선)
    pub const LOOKUP_ORDER: [ServiceGroup; 5] = [
        ServiceGroup::Override,
        ServiceGroup::Postauth,
        ServiceGroup::Signin,
        ServiceGroup::Preauth,
        ServiceGroup::Discovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Preauth => "preauth",
            Self::Signin => "signin",
            Self::Postauth => "postauth",
            Self::Override => "override",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::LOOKUP_ORDER
            .into_iter()
            .find(|group| group.as_str() == s)
    }
}

impl std::fmt::Display for ServiceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
