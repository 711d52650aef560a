//! Observable State - 변경 알림을 가진 속성 저장소
//!
//! `set(key, value)`로 값이 실제로 바뀌면 두 개의 알림을 순서대로 발행합니다:
//! 1. `change:<key>` (인자: 새 값, 이전 값)
//! 2. `change` (인자 없음)
//!
//! 값이 같으면 아무 이벤트도 발행하지 않습니다.

use super::emitter::{Event, EventEmitter, HandlerId};
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// 관찰 가능한 속성 저장소
#[derive(Debug, Default)]
pub struct Observable {
    attributes: RwLock<Map<String, Value>>,
    emitter: EventEmitter,
}

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 속성으로 생성 (이벤트 없음)
    pub fn with_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            attributes: RwLock::new(attributes),
            emitter: EventEmitter::new(),
        }
    }

    // ========================================================================
    // 속성
    // ========================================================================

    /// 속성 조회
    pub fn get(&self, key: &str) -> Option<Value> {
        self.attributes.read().get(key).cloned()
    }

    /// 속성이 `true`인지 확인
    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// 속성 설정. 값이 바뀌었으면 `true`
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();

        let previous = {
            let mut attributes = self.attributes.write();
            if attributes.get(key) == Some(&value) {
                return false;
            }
            attributes.insert(key.to_string(), value.clone())
        };

        self.emitter.trigger(
            format!("change:{}", key),
            vec![value, previous.unwrap_or(Value::Null)],
        );
        self.emitter.trigger("change", vec![]);
        true
    }

    /// 속성 제거. 제거된 값이 있었으면 `true`
    pub fn unset(&self, key: &str) -> bool {
        let previous = self.attributes.write().remove(key);

        match previous {
            Some(previous) => {
                self.emitter
                    .trigger(format!("change:{}", key), vec![Value::Null, previous]);
                self.emitter.trigger("change", vec![]);
                true
            }
            None => false,
        }
    }

    /// 전체 속성 스냅샷
    pub fn attributes(&self) -> Map<String, Value> {
        self.attributes.read().clone()
    }

    // ========================================================================
    // 이벤트
    // ========================================================================

    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.emitter.on(event, handler)
    }

    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.emitter.once(event, handler)
    }

    pub fn off(&self, id: HandlerId) -> bool {
        self.emitter.off(id)
    }

    pub fn trigger(&self, name: impl Into<String>, args: Vec<Value>) {
        self.emitter.trigger(name, args)
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn track(state: &Observable, events: &[&str]) -> Arc<Mutex<Vec<Event>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in events {
            let log = Arc::clone(&log);
            state.on(*name, move |e| log.lock().push(e.clone()));
        }
        log
    }

    #[test]
    fn test_changed_value_fires_key_then_generic() {
        let state = Observable::new();
        state.set("title", "before");
        let log = track(&state, &["change:title", "change"]);

        assert!(state.set("title", "after"));

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].name, "change:title");
        assert_eq!(log[0].args, vec![json!("after"), json!("before")]);
        assert_eq!(log[1].name, "change");
        assert!(log[1].args.is_empty());
    }

    #[test]
    fn test_unchanged_value_fires_nothing() {
        let state = Observable::new();
        state.set("ready", false);
        let log = track(&state, &["change:ready", "change"]);

        assert!(!state.set("ready", false));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_first_set_reports_null_previous() {
        let state = Observable::new();
        let log = track(&state, &["change:ready"]);

        state.set("ready", true);
        assert_eq!(log.lock()[0].args, vec![json!(true), Value::Null]);
        assert!(state.is_true("ready"));
    }

    #[test]
    fn test_unset_notifies() {
        let state = Observable::new();
        state.set("token", "abc");
        let log = track(&state, &["change:token", "change"]);

        assert!(state.unset("token"));
        assert!(!state.unset("token"));
        assert_eq!(log.lock().len(), 2);
        assert_eq!(state.get("token"), None);
    }

    #[test]
    fn test_handler_can_read_new_value() {
        let state = Arc::new(Observable::new());
        let seen = Arc::new(Mutex::new(None));
        {
            let state2 = Arc::clone(&state);
            let seen = Arc::clone(&seen);
            state.on("change", move |_| *seen.lock() = state2.get("n"));
        }

        state.set("n", 3);
        assert_eq!(*seen.lock(), Some(json!(3)));
    }
}
