//! Service Host - 클러스터 호스트 하나와 실패/교체 상태

use super::ServiceGroup;
use reqwest::Url;
use webex_foundation::{Error, Result};

/// 정적 URL에서 만든 호스트의 클러스터 ID 접두사
const STATIC_CLUSTER: &str = "static:static:static";

/// 서비스 호스트
///
/// `id`는 `<head>:<group>:<cluster>:<service>` 형태이고,
/// `priority`는 작을수록 우선합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceHost {
    pub group: ServiceGroup,
    pub default_url: String,
    pub host_group: String,
    pub id: String,
    pub priority: u32,
    pub host: String,
    failed: bool,
    replaced: bool,
}

impl ServiceHost {
    pub fn new(
        group: ServiceGroup,
        default_url: impl Into<String>,
        host_group: impl Into<String>,
        id: impl Into<String>,
        priority: u32,
        host: impl Into<String>,
    ) -> Result<Self> {
        let default_url = default_url.into();
        let id = id.into();

        if id.split(':').count() != 4 {
            return Err(Error::InvalidInput(format!(
                "service host id `{}` must contain three `:` separators",
                id
            )));
        }
        Url::parse(&default_url).map_err(|e| {
            Error::InvalidInput(format!("invalid service url `{}`: {}", default_url, e))
        })?;

        Ok(Self {
            group,
            default_url,
            host_group: host_group.into(),
            id,
            priority,
            host: host.into(),
            failed: false,
            replaced: false,
        })
    }

    /// 서비스 이름과 URL만으로 호스트 생성
    pub fn from_url(group: ServiceGroup, name: &str, url: &str) -> Result<Self> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| Error::InvalidInput(format!("service `{}` has no host: {}", name, url)))?;

        Self::new(
            group,
            url,
            host.clone(),
            format!("{}:{}", STATIC_CLUSTER, name),
            1,
            host,
        )
    }

    /// 실패하거나 교체되지 않은 호스트
    pub fn active(&self) -> bool {
        !self.failed && !self.replaced
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    pub fn set_replaced(&mut self, replaced: bool) {
        self.replaced = replaced;
    }

    /// 사용자 홈 클러스터의 호스트인지
    pub fn local(&self) -> bool {
        self.default_url.contains(&self.host_group)
    }

    /// 클러스터 ID의 서비스 이름
    pub fn service(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or_default()
    }

    /// 기본 URL의 호스트 부분을 이 호스트로 바꾼 주소 (포트 유지)
    pub fn url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.default_url) else {
            return self.default_url.clone();
        };
        if url.host_str() == Some(self.host.as_str()) {
            return self.default_url.clone();
        }
        match url.set_host(Some(&self.host)) {
            Ok(()) => url.to_string().trim_end_matches('/').to_string(),
            Err(_) => self.default_url.clone(),
        }
    }

    /// 주어진 요청 URL이 이 호스트를 가리키는지
    pub fn serves(&self, url: &str) -> bool {
        let base = self.url();
        url == base
            || url
                .strip_prefix(base.as_str())
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    }
}
