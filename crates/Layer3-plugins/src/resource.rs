//! Resource - hydra 리소스에 대한 공통 CRUD 요청

use crate::page::Page;
use serde_json::Value;
use tracing::debug;
use webex_core::{HttpResponse, Method, PluginContext, RequestOptions};
use webex_foundation::{Error, Result};

/// REST 리소스 서비스 이름
pub const HYDRA: &str = "hydra";

/// `hydra/<path>` 리소스
#[derive(Clone)]
pub(crate) struct Resource {
    ctx: PluginContext,
    path: &'static str,
}

impl Resource {
    pub fn new(ctx: PluginContext, path: &'static str) -> Self {
        Self { ctx, path }
    }

    pub fn ctx(&self) -> &PluginContext {
        &self.ctx
    }

    fn item(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn send(&self, options: RequestOptions) -> Result<HttpResponse> {
        debug!(plugin = %self.ctx.name(), request = %options.describe(), "Resource request");
        self.ctx.request(options).await
    }

    pub async fn create(&self, body: Value) -> Result<Value> {
        let response = self
            .send(RequestOptions::service(Method::POST, HYDRA, self.path).body(body))
            .await?;
        Ok(response.body)
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        let response = self
            .send(RequestOptions::service(Method::GET, HYDRA, self.item(id)))
            .await?;
        Ok(response.body)
    }

    pub async fn list(&self, query: &Value) -> Result<Page> {
        let response = self
            .send(RequestOptions::service(Method::GET, HYDRA, self.path).qs(query))
            .await?;
        Ok(Page::from_response(self.ctx.client()?, &response))
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Value> {
        let response = self
            .send(RequestOptions::service(Method::PUT, HYDRA, self.item(id)).body(body))
            .await?;
        Ok(response.body)
    }

    /// 삭제. 204는 `None`
    pub async fn remove(&self, id: &str) -> Result<Option<Value>> {
        let response = self
            .send(RequestOptions::service(Method::DELETE, HYDRA, self.item(id)))
            .await?;

        if response.status_code == 204 {
            Ok(None)
        } else {
            Ok(Some(response.body))
        }
    }
}

/// 인자에서 리소스 ID 추출 (문자열 또는 `{id}` 객체)
pub fn resource_id(value: &Value) -> Result<String> {
    let id = match value {
        Value::String(id) => Some(id.as_str()),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    };

    match id {
        Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        _ => Err(Error::InvalidInput("an id is required".into())),
    }
}

/// 인자에서 필수 문자열 필드 확인
pub fn require_field<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("`{}` is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id() {
        assert_eq!(resource_id(&json!("r1")).unwrap(), "r1");
        assert_eq!(resource_id(&json!({"id": " r2 "})).unwrap(), "r2");
        assert!(resource_id(&json!({"title": "x"})).is_err());
        assert!(resource_id(&json!("")).is_err());
        assert!(resource_id(&Value::Null).is_err());
    }

    #[test]
    fn test_require_field() {
        let body = json!({"roomId": "r1", "empty": ""});
        assert_eq!(require_field(&body, "roomId").unwrap(), "r1");
        assert!(require_field(&body, "empty").is_err());
        assert!(require_field(&body, "personId").is_err());
    }
}
