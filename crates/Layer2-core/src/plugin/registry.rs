//! Plugin Registry - 플러그인 선언 저장소
//!
//! public / internal 두 네임스페이스를 별도 테이블로 관리합니다.
//! 등록은 내부 잠금으로 직렬화되므로 여러 스레드에서 동시에 호출해도 안전합니다.

use super::descriptor::{PluginDescriptor, PluginFactory, RegisterOptions};
use super::traits::Namespace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use webex_foundation::{Error, Result};

/// 등록 항목
struct Entry {
    descriptor: PluginDescriptor,

    /// 로드 순서 (교체 시 유지)
    load_order: usize,
}

#[derive(Default)]
struct Tables {
    public: HashMap<String, Entry>,
    internal: HashMap<String, Entry>,
    load_counter: usize,
}

impl Tables {
    fn table(&self, namespace: Namespace) -> &HashMap<String, Entry> {
        match namespace {
            Namespace::Public => &self.public,
            Namespace::Internal => &self.internal,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut HashMap<String, Entry> {
        match namespace {
            Namespace::Public => &mut self.public,
            Namespace::Internal => &mut self.internal,
        }
    }
}

/// 플러그인 레지스트리 - 모든 플러그인 선언 관리
#[derive(Default)]
pub struct PluginRegistry {
    tables: RwLock<Tables>,
}

impl PluginRegistry {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// public 플러그인 등록
    pub fn register_plugin(
        &self,
        name: impl Into<String>,
        factory: PluginFactory,
        options: RegisterOptions,
    ) -> Result<()> {
        self.register(Namespace::Public, name, factory, options)
    }

    /// internal 플러그인 등록
    pub fn register_internal_plugin(
        &self,
        name: impl Into<String>,
        factory: PluginFactory,
        options: RegisterOptions,
    ) -> Result<()> {
        self.register(Namespace::Internal, name, factory, options)
    }

    /// 네임스페이스를 지정해 등록
    ///
    /// 같은 이름이 이미 있으면 `replace`가 설정된 경우에만 덮어씁니다.
    pub fn register(
        &self,
        namespace: Namespace,
        name: impl Into<String>,
        factory: PluginFactory,
        options: RegisterOptions,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("plugin name must not be empty".into()));
        }

        let replace = options.replace;
        let descriptor = PluginDescriptor::new(name.clone(), namespace, factory, options);

        let mut tables = self.tables.write();

        if let Some(existing) = tables.table_mut(namespace).get_mut(&name) {
            if !replace {
                return Err(Error::duplicate(namespace.to_string(), name));
            }
            existing.descriptor = descriptor;
            warn!(plugin = %name, %namespace, "Replaced registered plugin");
            return Ok(());
        }

        tables.load_counter += 1;
        let load_order = tables.load_counter;
        tables.table_mut(namespace).insert(
            name.clone(),
            Entry {
                descriptor,
                load_order,
            },
        );

        info!(plugin = %name, %namespace, load_order, "Registered plugin");
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 네임스페이스의 선언 목록 (등록 순서)
    ///
    /// 호출 시점의 스냅샷을 순회합니다.
    pub fn registered_plugins(&self, namespace: Namespace) -> impl Iterator<Item = PluginDescriptor> {
        let tables = self.tables.read();
        let mut ordered: Vec<_> = tables.table(namespace).values().collect();
        ordered.sort_by_key(|entry| entry.load_order);

        let snapshot: Vec<PluginDescriptor> = ordered
            .into_iter()
            .map(|entry| entry.descriptor.clone())
            .collect();
        snapshot.into_iter()
    }

    /// 선언 조회
    pub fn get(&self, namespace: Namespace, name: &str) -> Option<PluginDescriptor> {
        self.tables
            .read()
            .table(namespace)
            .get(name)
            .map(|entry| entry.descriptor.clone())
    }

    /// 등록 여부 확인
    pub fn contains(&self, namespace: Namespace, name: &str) -> bool {
        self.tables.read().table(namespace).contains_key(name)
    }

    /// 전체 등록 수
    pub fn len(&self) -> usize {
        let tables = self.tables.read();
        tables.public.len() + tables.internal.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 모든 등록 제거 (테스트 격리용)
    pub fn reset(&self) {
        let mut tables = self.tables.write();
        *tables = Tables::default();
        debug!("Plugin registry reset");
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("PluginRegistry")
            .field("public", &tables.public.keys().collect::<Vec<_>>())
            .field("internal", &tables.internal.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// 전역 Registry
// ============================================================================

static GLOBAL_REGISTRY: OnceLock<Arc<PluginRegistry>> = OnceLock::new();

/// 전역 레지스트리 가져오기
pub fn global_registry() -> Arc<PluginRegistry> {
    GLOBAL_REGISTRY
        .get_or_init(|| Arc::new(PluginRegistry::new()))
        .clone()
}

/// 전역 레지스트리에 public 플러그인 등록 (편의 함수)
pub fn register_plugin(
    name: impl Into<String>,
    factory: PluginFactory,
    options: RegisterOptions,
) -> Result<()> {
    global_registry().register_plugin(name, factory, options)
}

/// 전역 레지스트리에 internal 플러그인 등록 (편의 함수)
pub fn register_internal_plugin(
    name: impl Into<String>,
    factory: PluginFactory,
    options: RegisterOptions,
) -> Result<()> {
    global_registry().register_internal_plugin(name, factory, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{factory, Plugin, PluginContext};
    use async_trait::async_trait;
    use serde_json::json;
    use std::any::Any;
    use webex_foundation::Observable;

    struct Noop {
        state: Observable,
    }

    impl Noop {
        fn new(_ctx: PluginContext) -> Result<Self> {
            Ok(Self {
                state: Observable::new(),
            })
        }
    }

    #[async_trait]
    impl Plugin for Noop {
        fn state(&self) -> &Observable {
            &self.state
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[test]
    fn test_register_plugin() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", factory(Noop::new), RegisterOptions::new())
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(Namespace::Public, "rooms"));
        assert!(!registry.contains(Namespace::Internal, "rooms"));
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", factory(Noop::new), RegisterOptions::new())
            .unwrap();

        let err = registry
            .register_plugin("rooms", factory(Noop::new), RegisterOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRegistration { ref name, .. } if name == "rooms"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_replace_overwrites_and_keeps_order() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin(
                "rooms",
                factory(Noop::new),
                RegisterOptions::new().config(json!({"rooms": {"v": 1}})),
            )
            .unwrap();
        registry
            .register_plugin("people", factory(Noop::new), RegisterOptions::new())
            .unwrap();
        registry
            .register_plugin(
                "rooms",
                factory(Noop::new),
                RegisterOptions::new()
                    .config(json!({"rooms": {"v": 2}}))
                    .replace(true),
            )
            .unwrap();

        let names: Vec<_> = registry
            .registered_plugins(Namespace::Public)
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["rooms", "people"]);

        let rooms = registry.get(Namespace::Public, "rooms").unwrap();
        assert_eq!(rooms.config()["rooms"]["v"], json!(2));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("device", factory(Noop::new), RegisterOptions::new())
            .unwrap();
        registry
            .register_internal_plugin("device", factory(Noop::new), RegisterOptions::new())
            .unwrap();

        assert_eq!(registry.registered_plugins(Namespace::Public).count(), 1);
        assert_eq!(registry.registered_plugins(Namespace::Internal).count(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = PluginRegistry::new();
        let err = registry
            .register_plugin("  ", factory(Noop::new), RegisterOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_reset() {
        let registry = PluginRegistry::new();
        registry
            .register_plugin("rooms", factory(Noop::new), RegisterOptions::new())
            .unwrap();
        registry.reset();

        assert!(registry.is_empty());
        registry
            .register_plugin("rooms", factory(Noop::new), RegisterOptions::new())
            .unwrap();
    }
}
