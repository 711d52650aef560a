//! Rooms - 스페이스 생성/조회/수정/삭제

use crate::page::Page;
use crate::resource::{resource_id, Resource};
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::info;
use webex_core::{factory, Plugin, PluginContext, PluginRegistry, RegisterOptions};
use webex_foundation::{Error, Observable, Result};

/// 룸 플러그인
pub struct Rooms {
    resource: Resource,
    state: Observable,
}

impl Rooms {
    pub const NAME: &'static str = "rooms";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        Ok(Self {
            resource: Resource::new(ctx, "rooms"),
            state: Observable::new(),
        })
    }

    /// 룸 생성 (`{title, teamId?}`)
    pub async fn create(&self, room: Value) -> Result<Value> {
        let room = self.resource.create(room).await?;
        info!(room_id = ?room.get("id"), "Room created");
        Ok(room)
    }

    pub async fn get(&self, room: &Value) -> Result<Value> {
        self.resource.get(&resource_id(room)?).await
    }

    /// 룸 목록 (`{teamId?, type?, sortBy?, max?}`)
    pub async fn list(&self, query: &Value) -> Result<Page> {
        self.resource.list(query).await
    }

    /// 룸 수정. 인자에 `id`가 있어야 합니다
    pub async fn update(&self, room: Value) -> Result<Value> {
        let id = resource_id(&room)?;
        self.resource.update(&id, room).await
    }

    pub async fn remove(&self, room: &Value) -> Result<Option<Value>> {
        self.resource.remove(&resource_id(room)?).await
    }
}

#[async_trait]
impl Plugin for Rooms {
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
    registry.register_plugin(Rooms::NAME, factory(Rooms::new), RegisterOptions::new())
}
