//! Memberships - 룸 참여자 관리

use crate::page::Page;
use crate::resource::{require_field, resource_id, Resource};
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::info;
use webex_core::{factory, Plugin, PluginContext, PluginRegistry, RegisterOptions};
use webex_foundation::{Error, Observable, Result};

/// 멤버십 플러그인
pub struct Memberships {
    resource: Resource,
    state: Observable,
}

impl Memberships {
    pub const NAME: &'static str = "memberships";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        Ok(Self {
            resource: Resource::new(ctx, "memberships"),
            state: Observable::new(),
        })
    }

    /// 룸에 사용자 추가 (`{roomId, personId | personEmail, isModerator?}`)
    pub async fn create(&self, membership: Value) -> Result<Value> {
        require_field(&membership, "roomId")?;
        if require_field(&membership, "personId").is_err()
            && require_field(&membership, "personEmail").is_err()
        {
            return Err(Error::InvalidInput(
                "`personId` or `personEmail` is required".into(),
            ));
        }

        let created = self.resource.create(membership).await?;
        info!(membership_id = ?created.get("id"), "Membership created");
        Ok(created)
    }

    pub async fn get(&self, membership: &Value) -> Result<Value> {
        self.resource.get(&resource_id(membership)?).await
    }

    /// 멤버십 목록 (`{roomId?, personId?, personEmail?, max?}`)
    pub async fn list(&self, query: &Value) -> Result<Page> {
        self.resource.list(query).await
    }

    /// 모더레이터 여부 등 수정
    pub async fn update(&self, membership: Value) -> Result<Value> {
        let id = resource_id(&membership)?;
        self.resource.update(&id, membership).await
    }

    pub async fn remove(&self, membership: &Value) -> Result<Option<Value>> {
        self.resource.remove(&resource_id(membership)?).await
    }
}

#[async_trait]
impl Plugin for Memberships {
    fn state(&self) -> &Observable {
        &self.state
    }

    async fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        match method {
            "create" => self.create(args).await,
            "get" => self.get(&args).await,
            "list" => self.list(&args).await.map(|page| page.to_value()),
            "update" => self.update(args).await,
            "remove" => self.remove(&args).await.map(Option::unwrap_or_default),
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
        Memberships::NAME,
        factory(Memberships::new),
        RegisterOptions::new(),
    )
}
