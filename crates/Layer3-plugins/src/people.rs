//! People - 사용자 조회
//!
//! ID로 조회하는 요청은 잠깐 모았다가 `GET people?id=a,b,...` 한 번으로 보냅니다.

use crate::page::Page;
use crate::resource::{resource_id, Resource, HYDRA};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use webex_core::{
    factory, BatchHandler, Batcher, BatcherConfig, HttpResponse, Method, Plugin, PluginContext,
    PluginRegistry, RegisterOptions, RequestOptions,
};
use webex_foundation::{Error, Observable, Result};

/// 현재 사용자를 가리키는 ID
pub const ME: &str = "me";

/// ID 목록 조회 배치
struct PersonBatch {
    resource: Resource,
}

#[async_trait]
impl BatchHandler for PersonBatch {
    fn fingerprint_request(&self, item: &Value) -> Result<String> {
        resource_id(item)
    }

    fn fingerprint_response(&self, item: &Value) -> Result<String> {
        resource_id(item)
    }

    async fn submit(&self, items: Vec<Value>) -> Result<HttpResponse> {
        let ids = items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.resource
            .send(
                RequestOptions::service(Method::GET, HYDRA, "people")
                    .qs(&json!({ "id": ids, "showAllTypes": true })),
            )
            .await
    }
}

/// 사용자 플러그인
pub struct People {
    resource: Resource,
    batcher: Batcher<PersonBatch>,
    state: Observable,
}

impl People {
    pub const NAME: &'static str = "people";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        let config = BatcherConfig::from_config(ctx.config());
        let resource = Resource::new(ctx, "people");

        Ok(Self {
            batcher: Batcher::new(
                PersonBatch {
                    resource: resource.clone(),
                },
                config,
            ),
            resource,
            state: Observable::new(),
        })
    }

    /// 사용자 조회. 인자가 없으면 현재 사용자
    ///
    /// 다른 사용자는 배치로 조회하며, 응답에 없으면 `NotFound`
    pub async fn get(&self, person: &Value) -> Result<Value> {
        let id = match person {
            Value::Null => return self.me().await,
            other => resource_id(other)?,
        };
        if id == ME {
            return self.me().await;
        }
        self.batcher.request(Value::String(id)).await
    }

    pub async fn me(&self) -> Result<Value> {
        self.resource.get(ME).await
    }

    /// 사용자 목록 (`{email?, displayName?, id?, orgId?, max?}`)
    ///
    /// `id`는 배열로도 줄 수 있고 쉼표로 합쳐 보냅니다.
    pub async fn list(&self, query: &Value) -> Result<Page> {
        let mut query = query.clone();
        if let Some(Value::Array(ids)) = query.get("id") {
            let joined = ids
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",");
            query["id"] = Value::String(joined);
        }
        self.resource.list(&query).await
    }
}

#[async_trait]
impl Plugin for People {
    fn state(&self) -> &Observable {
        &self.state
    }

    async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        match method {
            "get" => self.get(&args).await,
            "me" => self.me().await,
            "list" => self.list(&args).await.map(|page| page.to_value()),
            other => Err(Error::unknown_method(Self::NAME, other)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub fn register(registry: &PluginRegistry) -> Result<()> {
    registry.register_plugin(
        People::NAME,
        factory(People::new),
        RegisterOptions::new().config(json!({
            "people": {
                "batcherWait": 100,
                "batcherMaxCalls": 50,
                "batcherMaxWait": 1500
            }
        })),
    )
}
