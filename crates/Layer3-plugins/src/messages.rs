//! Messages - 메시지 전송/조회/수정/삭제
//!
//! 송신 본문의 `html`은 outbound transform에서 허용 태그만 남기고 이스케이프합니다.

use crate::page::Page;
use crate::resource::{require_field, resource_id, Resource};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use tracing::{info, warn};
use webex_core::{
    factory, PayloadTransform, Plugin, PluginContext, PluginRegistry, RegisterOptions,
    TransformContext,
};
use webex_foundation::html::{filter_escape, AllowedTags};
use webex_foundation::{Error, Observable, Result};

/// html transform 이름
pub const HTML_TRANSFORM: &str = "sanitize-message-html";

/// 메시지 html에서 유지하는 태그와 속성
pub fn default_allowed_tags() -> AllowedTags {
    let mut tags = AllowedTags::new();
    for tag in [
        "b", "blockquote", "br", "code", "em", "h1", "h2", "h3", "i", "li", "ol", "p", "pre",
        "strong", "ul",
    ] {
        tags.insert(tag.to_string(), Vec::new());
    }
    tags.insert("a".to_string(), vec!["href".to_string()]);
    tags.insert("spark-mention".to_string(), vec![
        "data-object-type".to_string(),
        "data-object-id".to_string(),
    ]);
    tags
}

/// 메시지 플러그인
pub struct Messages {
    resource: Resource,
    state: Observable,
}

impl Messages {
    pub const NAME: &'static str = "messages";

    pub fn new(ctx: PluginContext) -> Result<Self> {
        Ok(Self {
            resource: Resource::new(ctx, "messages"),
            state: Observable::new(),
        })
    }

    /// 메시지 전송 (`{roomId | toPersonId | toPersonEmail, text?, markdown?, files?}`)
    ///
    /// `file`은 `files`의 이전 이름이며 변환 후 경고를 남깁니다.
    pub async fn create(&self, message: Value) -> Result<Value> {
        let message = normalize_files(message)?;
        let created = self.resource.create(message).await?;
        info!(message_id = ?created.get("id"), "Message sent");
        Ok(created)
    }

    pub async fn get(&self, message: &Value) -> Result<Value> {
        let mut body = self.resource.get(&resource_id(message)?).await?;
        match body.get_mut("items") {
            Some(items) => Ok(items.take()),
            None => Ok(body),
        }
    }

    /// 룸의 메시지 목록 (`{roomId, mentionedPeople?, before?, beforeMessage?, max?}`)
    pub async fn list(&self, query: &Value) -> Result<Page> {
        require_field(query, "roomId")?;
        self.resource.list(query).await
    }

    /// 메시지 수정. `id`와 `roomId`가 필요합니다
    pub async fn update(&self, message: Value) -> Result<Value> {
        let id = resource_id(&message)?;
        require_field(&message, "roomId")?;

        let mut body = message;
        if let Value::Object(map) = &mut body {
            map.remove("id");
        }
        self.resource.update(&id, body).await
    }

    pub async fn remove(&self, message: &Value) -> Result<Option<Value>> {
        self.resource.remove(&resource_id(message)?).await
    }
}

/// `file` → `files` 변환
fn normalize_files(message: Value) -> Result<Value> {
    let Value::Object(mut map) = message else {
        return Err(Error::InvalidInput("message must be an object".into()));
    };

    if let Some(file) = map.remove("file") {
        warn!("Message `file` is deprecated, use `files` instead");
        let files = match file {
            Value::Array(files) => files,
            other => vec![other],
        };
        map.insert("files".to_string(), Value::Array(files));
    }

    Ok(Value::Object(map))
}

fn is_message_write(ctx: &TransformContext, body: &Value) -> bool {
    let path = ctx.uri.split('?').next().unwrap_or_default();
    let targets_messages = path.ends_with("/messages") || path.contains("/messages/");

    targets_messages
        && matches!(ctx.method.as_str(), "POST" | "PUT")
        && body.get("html").map(Value::is_string).unwrap_or(false)
}

fn sanitize_html(allowed: &AllowedTags, mut body: Value) -> Value {
    if let Some(Value::String(html)) = body.get_mut("html") {
        *html = filter_escape(allowed, html);
    }
    body
}

/// 송신 html 정리 transform
pub fn html_transform(allowed: AllowedTags) -> PayloadTransform {
    PayloadTransform::outbound(HTML_TRANSFORM, is_message_write, move |_, body| {
        Ok(sanitize_html(&allowed, body))
    })
}

#[async_trait]
impl Plugin for Messages {
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
        Messages::NAME,
        factory(Messages::new),
        RegisterOptions::new().transform(html_transform(default_allowed_tags())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webex_core::Direction;

    fn ctx(method: &str, uri: &str) -> TransformContext {
        TransformContext {
            direction: Direction::Outbound,
            method: method.to_string(),
            uri: uri.to_string(),
            status_code: None,
        }
    }

    #[test]
    fn test_file_alias_becomes_files() {
        let message = normalize_files(json!({"roomId": "r1", "file": "https://x/a.png"})).unwrap();
        assert_eq!(message["files"], json!(["https://x/a.png"]));
        assert!(message.get("file").is_none());

        let untouched = normalize_files(json!({"roomId": "r1", "files": ["f"]})).unwrap();
        assert_eq!(untouched["files"], json!(["f"]));

        assert!(normalize_files(json!("text")).is_err());
    }

    #[test]
    fn test_html_predicate() {
        let body = json!({"html": "<b>hi</b>"});
        assert!(is_message_write(&ctx("POST", "https://webexapis.com/v1/messages"), &body));
        assert!(is_message_write(&ctx("PUT", "https://webexapis.com/v1/messages/m1"), &body));
        assert!(!is_message_write(&ctx("GET", "https://webexapis.com/v1/messages"), &body));
        assert!(!is_message_write(&ctx("POST", "https://webexapis.com/v1/rooms"), &body));
        assert!(!is_message_write(
            &ctx("POST", "https://webexapis.com/v1/messages"),
            &json!({"text": "hi"})
        ));
    }

    #[test]
    fn test_sanitize_html_keeps_allowed_tags() {
        let body = sanitize_html(
            &default_allowed_tags(),
            json!({"html": "<b onclick=\"x()\">hi</b><script>alert(1)</script>"}),
        );
        let html = body["html"].as_str().unwrap();

        assert!(html.starts_with("<b>hi</b>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("onclick"));
    }
}
