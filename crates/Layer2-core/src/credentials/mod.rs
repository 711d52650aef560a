//! # Credentials
//!
//! 액세스 토큰을 보관하고 공유 요청 파이프라인에 `Authorization` 헤더를 제공합니다.
//!
//! - 초기 토큰: `ClientOptions::credentials` (문자열 또는 중첩 객체)
//! - 영속화: 스토리지 네임스페이스 `Credentials`, 키 `@`
//! - 루트 proxy: `refresh`, `logout`, `canAuthorize`

mod token;

pub use token::{Token, DEFAULT_TOKEN_TYPE};

use crate::plugin::{factory, Plugin, PluginContext, PluginRegistry, RegisterOptions};
use crate::request::{Method, RequestOptions};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info};
use webex_foundation::{Error, Observable, Result};

/// 토큰 저장 키
const STORAGE_KEY: &str = "@";

/// 자격 증명 플러그인
pub struct Credentials {
    ctx: PluginContext,
    state: Observable,
    supertoken: RwLock<Option<Token>>,
}

impl Credentials {
    pub const NAME: &'static str = "credentials";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        let supertoken = match ctx.attribute("credentials") {
            Some(value) => Some(Token::parse(value).ok_or_else(|| {
                Error::InvalidInput("credentials must contain an access token".into())
            })?),
            None => None,
        };

        let credentials = Self {
            ctx,
            state: Observable::new(),
            supertoken: RwLock::new(supertoken),
        };
        credentials.sync_state();
        Ok(credentials)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn supertoken(&self) -> Option<Token> {
        self.supertoken.read().clone()
    }

    /// 현재 상태로 인증 헤더를 만들 수 있는지 (유효한 토큰 또는 갱신 가능)
    pub fn can_authorize(&self) -> bool {
        match &*self.supertoken.read() {
            Some(token) => !token.is_expired() || token.can_refresh(),
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.supertoken
            .read()
            .as_ref()
            .is_some_and(Token::can_refresh)
    }

    /// 요청에 붙일 `Authorization` 값. 만료된 토큰은 먼저 갱신
    pub async fn authorize(&self) -> Result<String> {
        let expired = self
            .supertoken
            .read()
            .as_ref()
            .is_some_and(|token| token.is_expired() && token.can_refresh());
        if expired {
            info!("Access token expired, refreshing before the request");
            self.refresh().await?;
        }
        self.authorization_header()
    }

    /// `Authorization` 헤더 값. 유효한 토큰이 없으면 `NotReady`
    pub fn authorization_header(&self) -> Result<String> {
        match &*self.supertoken.read() {
            Some(token) if !token.is_expired() => Ok(token.authorization()),
            _ => Err(Error::NotReady(Self::NAME.into())),
        }
    }

    // ========================================================================
    // 변경
    // ========================================================================

    /// 토큰 설정 후 저장
    pub async fn set_token(&self, value: &Value) -> Result<()> {
        let token = Token::parse(value)
            .ok_or_else(|| Error::InvalidInput("value does not contain an access token".into()))?;

        *self.supertoken.write() = Some(token);
        self.sync_state();
        self.persist().await
    }

    /// refresh token으로 새 액세스 토큰 요청
    pub async fn refresh(&self) -> Result<()> {
        let refresh_token = self
            .supertoken()
            .and_then(|token| token.refresh_token)
            .ok_or_else(|| Error::NotReady("no refresh token available".into()))?;

        let url = self
            .ctx
            .config_value("idbroker.url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Config("credentials.idbroker.url is not set".into()))?;

        info!("Refreshing access token");

        let mut body = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        for key in ["client_id", "client_secret"] {
            if let Some(value) = self.ctx.config().get(key) {
                body[key] = value.clone();
            }
        }

        let response = Box::pin(
            self.ctx.request(
                RequestOptions::uri(
                    Method::POST,
                    format!("{}/idb/oauth2/v1/access_token", url.trim_end_matches('/')),
                )
                .body(body)
                .auth(false),
            ),
        )
        .await?;

        let mut token = Token::parse(&response.body)
            .ok_or_else(|| Error::InvalidInput("refresh response has no access token".into()))?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token);
        }

        *self.supertoken.write() = Some(token);
        self.sync_state();
        self.persist().await
    }

    /// 토큰과 저장된 자격 증명 제거
    pub async fn logout(&self) -> Result<()> {
        *self.supertoken.write() = None;
        self.sync_state();
        self.ctx.storage().clear().await?;

        info!("Logged out");
        self.state.trigger("logout", vec![]);
        Ok(())
    }

    // ========================================================================
    // 내부
    // ========================================================================

    fn sync_state(&self) {
        self.state.set("canAuthorize", self.can_authorize());
    }

    async fn persist(&self) -> Result<()> {
        match self.supertoken() {
            Some(token) => {
                self.ctx
                    .storage()
                    .put(STORAGE_KEY, json!({ "supertoken": token }))
                    .await
            }
            None => self.ctx.storage().del(STORAGE_KEY).await,
        }
    }
}

#[async_trait]
impl Plugin for Credentials {
    fn state(&self) -> &Observable {
        &self.state
    }

    async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        match method {
            "canAuthorize" => Ok(Value::Bool(self.can_authorize())),
            "refresh" => self.refresh().await.map(|_| Value::Null),
            "logout" => self.logout().await.map(|_| Value::Null),
            "setToken" => self.set_token(&args).await.map(|_| Value::Null),
            other => Err(Error::unknown_method(Self::NAME, other)),
        }
    }

    /// 생성 시 토큰이 없었다면 저장소에서 복원
    async fn on_load(&self) -> Result<()> {
        if self.supertoken.read().is_some() {
            return self.persist().await;
        }

        if let Some(stored) = self.ctx.storage().get_optional(STORAGE_KEY).await? {
            if let Some(token) = Token::parse(&stored) {
                debug!("Restored access token from storage");
                *self.supertoken.write() = Some(token);
                self.sync_state();
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 자격 증명 플러그인 등록
pub fn register(registry: &PluginRegistry) -> Result<()> {
    registry.register_plugin(
        Credentials::NAME,
        factory(Credentials::new),
        RegisterOptions::new()
            .config(json!({
                "credentials": {
                    "idbroker": {
                        "url": "https://idbroker.webex.com"
                    }
                }
            }))
            .proxies(["refresh", "logout", "canAuthorize"]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientOptions, WebexClient};
    use crate::request::mock::MockTransport;
    use crate::request::HttpResponse;
    use webex_foundation::{MemoryStoreAdapter, StorageAdapter};

    fn registry() -> PluginRegistry {
        let registry = PluginRegistry::new();
        register(&registry).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_authorization_header_from_options() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(200, json!({"items": []})));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials(" Bearer  1234 ")
                .transport(transport.clone()),
        )
        .await
        .unwrap();

        client
            .request(RequestOptions::service(Method::GET, "hydra", "rooms"))
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://webexapis.com/v1/rooms");
        assert_eq!(sent.header("authorization"), Some("Bearer 1234"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_fail_construction() {
        let err = WebexClient::compose(
            &registry(),
            ClientOptions::new()
                .credentials(json!({"nothing": true}))
                .transport(Arc::new(MockTransport::new())),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Construction { ref plugin, .. } if plugin == "credentials"));
    }

    #[tokio::test]
    async fn test_restores_from_storage_and_logout_clears() {
        let storage = Arc::new(MemoryStoreAdapter::preload(json!({
            "Credentials": {"@": {"supertoken": {"access_token": "STORED"}}}
        })));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .storage(storage.clone())
                .transport(Arc::new(MockTransport::new())),
        )
        .await
        .unwrap();

        assert_eq!(client.call("canAuthorize", Value::Null).await.unwrap(), json!(true));
        let credentials = client.plugin_as::<Credentials>("credentials").unwrap();
        assert_eq!(credentials.authorization_header().unwrap(), "Bearer STORED");

        client.call("logout", Value::Null).await.unwrap();
        assert_eq!(client.call("canAuthorize", Value::Null).await.unwrap(), json!(false));
        assert!(storage.get("Credentials", "@").await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_posts_to_idbroker() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(
            200,
            json!({"access_token": "NEW", "expires_in": 3600}),
        ));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials(json!({"access_token": "OLD", "refresh_token": "RT"}))
                .config(json!({"credentials": {"client_id": "C123"}}))
                .transport(transport.clone()),
        )
        .await
        .unwrap();

        client.call("refresh", Value::Null).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(
            sent.url,
            "https://idbroker.webex.com/idb/oauth2/v1/access_token"
        );
        assert!(sent.header("authorization").is_none());
        let body = sent.body.unwrap();
        assert_eq!(body["grant_type"], json!("refresh_token"));
        assert_eq!(body["refresh_token"], json!("RT"));
        assert_eq!(body["client_id"], json!("C123"));

        let credentials = client.plugin_as::<Credentials>("credentials").unwrap();
        let token = credentials.supertoken().unwrap();
        assert_eq!(token.access_token, "NEW");
        assert_eq!(token.refresh_token.as_deref(), Some("RT"));
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_before_request() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(
            200,
            json!({"access_token": "NEW", "expires_in": 3600}),
        ));
        transport.push_response(HttpResponse::new(200, json!({"items": []})));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials(json!({
                    "access_token": "OLD",
                    "refresh_token": "RT",
                    "expires_in": -10
                }))
                .transport(transport.clone()),
        )
        .await
        .unwrap();
        assert_eq!(client.call("canAuthorize", Value::Null).await.unwrap(), json!(true));

        client
            .request(RequestOptions::service(Method::GET, "hydra", "rooms"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.ends_with("/idb/oauth2/v1/access_token"));
        assert_eq!(requests[1].header("authorization"), Some("Bearer NEW"));
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_once_and_replays() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(HttpResponse::new(401, json!({"message": "expired"})));
        transport.push_response(HttpResponse::new(200, json!({"access_token": "ST2"})));
        transport.push_response(HttpResponse::new(200, json!({"id": "r1"})));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials(json!({"access_token": "ST1", "refresh_token": "RT1"}))
                .transport(transport.clone()),
        )
        .await
        .unwrap();

        let response = client
            .request(RequestOptions::service(Method::GET, "hydra", "rooms/r1"))
            .await
            .unwrap();
        assert_eq!(response.body["id"], json!("r1"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header("authorization"), Some("Bearer ST1"));
        assert_eq!(requests[2].header("authorization"), Some("Bearer ST2"));
        assert_eq!(requests[0].url, requests[2].url);
    }

    #[tokio::test]
    async fn test_unauthorized_without_refresh_token_fails() {
        let transport = Arc::new(MockTransport::with_handler(|_| {
            Ok(HttpResponse::new(401, json!({"message": "expired"})))
        }));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials("ST1")
                .transport(transport.clone()),
        )
        .await
        .unwrap();

        let err = client
            .request(RequestOptions::service(Method::GET, "hydra", "rooms"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_credentials_stay_inside_allowed_domains() {
        let transport = Arc::new(MockTransport::with_handler(|_| {
            Ok(HttpResponse::new(200, json!({})))
        }));

        let client = WebexClient::init_with(
            &registry(),
            ClientOptions::new()
                .credentials("AT")
                .transport(transport.clone()),
        )
        .await
        .unwrap();

        client
            .request(RequestOptions::uri(Method::GET, "https://attacker.test/v1/rooms"))
            .await
            .unwrap();
        assert!(transport.last_request().unwrap().header("authorization").is_none());

        client
            .request(RequestOptions::uri(Method::GET, "https://webexapis.com/v1/rooms?cursor=2"))
            .await
            .unwrap();
        assert_eq!(
            transport.last_request().unwrap().header("authorization"),
            Some("Bearer AT")
        );
    }

    #[test]
    fn test_refresh_without_refresh_token() {
        let client = WebexClient::compose(
            &registry(),
            ClientOptions::new()
                .credentials("AT")
                .transport(Arc::new(MockTransport::new())),
        )
        .unwrap();

        let result = tokio_test::block_on(client.call("refresh", Value::Null));
        assert!(matches!(result, Err(Error::NotReady(_))));
    }
}
