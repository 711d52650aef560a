//! Service Catalog - 서비스 그룹별 호스트, 우선순위 선택, 실패 전환, 허용 도메인

use super::{ServiceGroup, ServiceHost};
use parking_lot::{Mutex, RwLock};
use reqwest::Url;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use webex_foundation::{Error, Observable, Result};

/// 기본 허용 도메인
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] =
    &["wbx2.com", "ciscospark.com", "webex.com", "webexapis.com"];

/// 서비스 카탈로그
///
/// 같은 서비스가 여러 그룹에 있으면 `ServiceGroup::LOOKUP_ORDER` 순서로 선택하고,
/// 그룹 안에서는 활성 호스트 중 `priority`가 가장 작은 호스트를 씁니다.
#[derive(Default)]
pub struct ServiceCatalog {
    hosts: RwLock<Vec<ServiceHost>>,
    allowed_domains: RwLock<Vec<String>>,
    state: Observable,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `services` 설정에서 생성
    ///
    /// - 문자열 값: `discovery` 그룹의 `<name>: <url>`
    /// - `override`: `override` 그룹의 `<name>: <url>`
    /// - `allowedDomains`: 인증 헤더를 붙일 수 있는 도메인
    pub fn from_config(services: Option<&Value>) -> Self {
        let catalog = Self::new();
        catalog.apply_config(services);
        catalog
    }

    /// 설정 다시 적용 (`discovery`/`override` 교체)
    pub fn apply_config(&self, services: Option<&Value>) {
        let empty = Value::Null;
        let services = services.unwrap_or(&empty);

        self.update_service_urls(ServiceGroup::Discovery, services);
        if let Some(overrides) = services.get("override") {
            self.update_service_urls(ServiceGroup::Override, overrides);
        }

        let domains = match services.get("allowedDomains").and_then(Value::as_array) {
            Some(domains) => domains
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        };
        self.set_allowed_domains(domains);
    }

    // ========================================================================
    // 로드
    // ========================================================================

    /// 호스트 추가
    pub fn load(&self, hosts: impl IntoIterator<Item = ServiceHost>) {
        self.hosts.write().extend(hosts);
    }

    /// 그룹의 호스트를 `{name: url}` 맵으로 교체하고 그룹 준비 완료 표시
    ///
    /// 문자열이 아니거나 잘못된 URL은 건너뜁니다.
    pub fn update_service_urls(&self, group: ServiceGroup, links: &Value) {
        let mut hosts = Vec::new();
        if let Some(links) = links.as_object() {
            for (name, url) in links {
                let Some(url) = url.as_str() else { continue };
                match ServiceHost::from_url(group, name, url) {
                    Ok(host) => hosts.push(host),
                    Err(e) => warn!(service = %name, error = %e, "Skipping service url"),
                }
            }
        }

        self.replace_group(group, hosts);
    }

    /// 원격 카탈로그 응답(`serviceLinks` + `hostCatalog`)을 그룹에 적용
    ///
    /// `hostCatalog`는 `{<hostGroup>: [{host, priority, id}]}` 형태입니다.
    pub fn load_remote_catalog(
        &self,
        group: ServiceGroup,
        service_links: &Value,
        host_catalog: &Value,
    ) -> Result<()> {
        let mut hosts = Vec::new();

        for (host_group, entries) in host_catalog.as_object().into_iter().flatten() {
            for entry in entries.as_array().into_iter().flatten() {
                let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
                let service = id.rsplit(':').next().unwrap_or_default();
                let Some(default_url) = service_links.get(service).and_then(Value::as_str) else {
                    debug!(cluster = %id, "No service link for host, skipping");
                    continue;
                };
                let host = entry
                    .get("host")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidInput(format!("host entry `{}` has no host", id)))?;
                let priority = entry
                    .get("priority")
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::from(u32::MAX));

                hosts.push(ServiceHost::new(
                    group,
                    default_url,
                    host_group.clone(),
                    id,
                    u32::try_from(priority).unwrap_or(u32::MAX),
                    host,
                )?);
            }
        }

        // hostCatalog에 없는 서비스는 기본 URL로 등록
        for (name, url) in service_links.as_object().into_iter().flatten() {
            let Some(url) = url.as_str() else { continue };
            if !hosts.iter().any(|host| host.service() == name) {
                hosts.push(ServiceHost::from_url(group, name, url)?);
            }
        }

        self.replace_group(group, hosts);
        Ok(())
    }

    fn replace_group(&self, group: ServiceGroup, hosts: Vec<ServiceHost>) {
        {
            let mut all = self.hosts.write();
            all.retain(|host| host.group != group);
            all.extend(hosts);
        }

        debug!(group = %group, "Service catalog group updated");
        self.state.set(group.as_str(), true);
        self.state.trigger(group.as_str(), vec![]);
    }

    /// 인증 이후 그룹 초기화 (`preauth`/`signin`/`postauth`)
    pub fn clean(&self) {
        let cleaned = [
            ServiceGroup::Preauth,
            ServiceGroup::Signin,
            ServiceGroup::Postauth,
        ];
        self.hosts.write().retain(|host| !cleaned.contains(&host.group));
        for group in cleaned {
            self.state.set(group.as_str(), false);
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn is_ready(&self, group: ServiceGroup) -> bool {
        self.state.is_true(group.as_str())
    }

    /// 그룹이 채워질 때까지 대기
    pub async fn wait_for_catalog(&self, group: ServiceGroup, timeout: Duration) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let handler = self.state.once(group.as_str(), move |_| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(());
            }
        });

        if self.is_ready(group) {
            self.state.off(handler);
            return Ok(());
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            _ => {
                self.state.off(handler);
                Err(Error::NotReady(format!(
                    "timed out waiting for the `{}` service catalog",
                    group
                )))
            }
        }
    }

    /// 서비스 URL. `group`이 없으면 모든 그룹을 우선순위대로 검색
    ///
    /// 그룹의 모든 호스트가 실패했으면 기본 URL을 돌려줍니다.
    pub fn get(&self, name: &str, group: Option<ServiceGroup>) -> Option<String> {
        let hosts = self.hosts.read();
        let groups: &[ServiceGroup] = match &group {
            Some(group) => std::slice::from_ref(group),
            None => &ServiceGroup::LOOKUP_ORDER,
        };

        groups.iter().find_map(|group| {
            let mut candidates = hosts
                .iter()
                .filter(|host| host.group == *group && host.service() == name)
                .peekable();
            let fallback = candidates.peek().map(|host| host.default_url.clone())?;

            candidates
                .filter(|host| host.active())
                .min_by_key(|host| host.priority)
                .map(ServiceHost::url)
                .or(Some(fallback))
        })
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.get(name, None).is_some()
    }

    /// `{name: url}` 목록. 같은 이름은 우선순위가 높은 그룹이 이김
    pub fn list(&self, group: Option<ServiceGroup>) -> BTreeMap<String, String> {
        let names: Vec<String> = self
            .hosts
            .read()
            .iter()
            .filter(|host| group.map_or(true, |g| host.group == g))
            .map(|host| host.service().to_string())
            .collect();

        names
            .into_iter()
            .filter_map(|name| self.get(&name, group).map(|url| (name, url)))
            .collect()
    }

    /// 요청 URL을 제공하는 서비스 이름
    pub fn find_service_name(&self, url: &str) -> Option<String> {
        self.hosts
            .read()
            .iter()
            .find(|host| host.serves(url) || host.default_url == url)
            .map(|host| host.service().to_string())
    }

    /// 요청 URL의 호스트를 실패로 표시하고 같은 서비스의 다음 URL 반환
    pub fn mark_failed_url(&self, url: &str) -> Option<String> {
        let service = {
            let mut hosts = self.hosts.write();
            let mut service = None;
            for host in hosts.iter_mut().filter(|host| host.active() && host.serves(url)) {
                host.set_failed(true);
                service.get_or_insert_with(|| host.service().to_string());
            }
            service?
        };

        let next = self.get(&service, None);
        warn!(service = %service, failed = %url, next = ?next, "Marked service host as failed");
        next
    }

    /// 실패 표시 초기화
    pub fn reset_failed(&self) {
        for host in self.hosts.write().iter_mut() {
            host.set_failed(false);
        }
    }

    // ========================================================================
    // 허용 도메인
    // ========================================================================

    pub fn set_allowed_domains(&self, domains: Vec<String>) {
        *self.allowed_domains.write() = domains;
    }

    pub fn allowed_domains(&self) -> Vec<String> {
        self.allowed_domains.read().clone()
    }

    /// URL 호스트가 허용 도메인이거나 그 하위 도메인인지
    pub fn is_allowed_domain_url(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };

        self.allowed_domains.read().iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }

    /// 이 URL로 가는 요청에 자격 증명을 붙여도 되는지
    pub fn requires_credentials(&self, url: &str) -> bool {
        self.find_service_name(url).is_some() || self.is_allowed_domain_url(url)
    }
}

impl std::fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("hosts", &self.hosts.read().len())
            .field("allowed_domains", &self.allowed_domains.read())
            .finish()
    }
}
