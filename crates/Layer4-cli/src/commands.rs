//! 서브커맨드 구현

use anyhow::Context;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use webex_core::{ClientOptions, Namespace, PluginRegistry, WebexClient};
use webex_foundation::{JsonFileAdapter, JsonStore, WebexConfig};
use webex_plugins::{register_all, WebexExt};

/// 기본 플러그인을 등록한 레지스트리
fn registry() -> anyhow::Result<PluginRegistry> {
    let registry = PluginRegistry::new();
    register_all(&registry)?;
    Ok(registry)
}

/// 설정/토큰/파일 스토리지로 클라이언트 구성
pub async fn connect(config: &WebexConfig, token: Option<String>) -> anyhow::Result<WebexClient> {
    let store = JsonStore::data().context("Failed to locate the data directory")?;
    debug!(storage = %store.base_dir().display(), "Using file storage");

    let mut options = ClientOptions::new()
        .config(config.client.clone())
        .storage(Arc::new(JsonFileAdapter::new(store)));
    if let Some(token) = token {
        options = options.credentials(token);
    }

    let webex = WebexClient::init_with(&registry()?, options)
        .await
        .context("Failed to initialize the Webex client")?;
    Ok(webex)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// 등록된 플러그인 목록
pub fn list_plugins() -> anyhow::Result<()> {
    let registry = registry()?;

    println!("{:<10} {:<14} {:<36} {}", "NAMESPACE", "NAME", "PROXIES", "TRANSFORMS");
    println!("{}", "-".repeat(80));

    for namespace in [Namespace::Internal, Namespace::Public] {
        for descriptor in registry.registered_plugins(namespace) {
            let transforms: Vec<&str> = descriptor.transforms().iter().map(|t| t.name()).collect();
            println!(
                "{:<10} {:<14} {:<36} {}",
                namespace.to_string(),
                descriptor.name(),
                descriptor.proxies().join(", "),
                transforms.join(", ")
            );
        }
    }
    Ok(())
}

pub async fn create_room(webex: &WebexClient, title: &str) -> anyhow::Result<()> {
    let room = webex.rooms()?.create(json!({ "title": title })).await?;
    print_json(&room)
}

pub async fn list_rooms(webex: &WebexClient, max: Option<u32>, all: bool) -> anyhow::Result<()> {
    let query = match max {
        Some(max) => json!({ "max": max }),
        None => json!({}),
    };
    let page = webex.rooms()?.list(&query).await?;

    let items = if all {
        page.collect_all().await?
    } else {
        page.into_items()
    };

    for room in &items {
        println!(
            "{:<40} {}",
            room["id"].as_str().unwrap_or_default(),
            room["title"].as_str().unwrap_or_default()
        );
    }
    info!(count = items.len(), "Listed rooms");
    Ok(())
}

pub async fn send_message(
    webex: &WebexClient,
    room: &str,
    text: &str,
    markdown: bool,
) -> anyhow::Result<()> {
    let body = if markdown {
        json!({ "roomId": room, "markdown": text })
    } else {
        json!({ "roomId": room, "text": text })
    };
    let message = webex.messages()?.create(body).await?;
    print_json(&message)
}

pub async fn whoami(webex: &WebexClient) -> anyhow::Result<()> {
    let me = webex.people()?.me().await?;
    print_json(&me)
}

pub async fn register_device(webex: &WebexClient) -> anyhow::Result<()> {
    let registration = webex.call("registerDevice", Value::Null).await?;
    println!("Registered device: {}", registration["url"].as_str().unwrap_or_default());
    Ok(())
}

pub async fn unregister_device(webex: &WebexClient) -> anyhow::Result<()> {
    webex.device()?.unregister().await?;
    println!("Device unregistered");
    Ok(())
}

pub async fn logout(webex: &WebexClient) -> anyhow::Result<()> {
    webex.call("logout", Value::Null).await?;
    println!("Logged out");
    Ok(())
}
