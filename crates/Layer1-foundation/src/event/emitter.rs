//! Event Emitter - 이름 기반 이벤트 발행/구독
//!
//! 같은 이벤트의 핸들러는 구독 순서(FIFO)대로 호출됩니다.
//! 발행 시점의 핸들러 목록을 스냅샷으로 떠서 락 밖에서 호출하므로,
//! 핸들러가 호출 도중 자신(또는 다른 핸들러)을 해제해도 현재 발행 패스는 영향받지 않습니다.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

// ============================================================================
// Event / HandlerId
// ============================================================================

/// 발행된 이벤트
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// 이벤트 이름 (예: `change:ready`)
    pub name: String,

    /// 이벤트 인자
    pub args: Vec<Value>,
}

impl Event {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// n번째 인자
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// 핸들러 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// 이벤트 핸들러
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Registered {
    id: HandlerId,
    event: String,
    handler: Handler,
    once: bool,
}

// ============================================================================
// EventEmitter
// ============================================================================

/// 이벤트 발행기
#[derive(Default)]
pub struct EventEmitter {
    /// 구독 순서대로 정렬된 핸들러
    handlers: Mutex<Vec<Registered>>,

    /// 핸들러 ID 카운터
    counter: AtomicU64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸들러 등록
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(event.into(), Arc::new(handler), false)
    }

    /// 한 번만 호출되는 핸들러 등록
    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(event.into(), Arc::new(handler), true)
    }

    fn register(&self, event: String, handler: Handler, once: bool) -> HandlerId {
        let id = HandlerId(self.counter.fetch_add(1, Ordering::SeqCst));
        trace!(handler_id = %id, event = %event, once, "Registering event handler");

        self.handlers.lock().push(Registered {
            id,
            event,
            handler,
            once,
        });
        id
    }

    /// 핸들러 해제
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        handlers.len() != before
    }

    /// 이벤트의 모든 핸들러 해제
    pub fn off_event(&self, event: &str) -> usize {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|r| r.event != event);
        before - handlers.len()
    }

    /// 이벤트 발행
    pub fn trigger(&self, name: impl Into<String>, args: Vec<Value>) {
        let event = Event::new(name, args);

        let queued: Vec<Handler> = {
            let mut handlers = self.handlers.lock();
            let queued = handlers
                .iter()
                .filter(|r| r.event == event.name)
                .map(|r| Arc::clone(&r.handler))
                .collect();
            handlers.retain(|r| !(r.once && r.event == event.name));
            queued
        };

        if queued.is_empty() {
            return;
        }

        trace!(event = %event.name, handlers = queued.len(), "Dispatching event");
        for handler in queued {
            handler(&event);
        }
    }

    /// 이벤트의 핸들러 수
    pub fn listener_count(&self, event: &str) -> usize {
        self.handlers
            .lock()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Handler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log2 = Arc::clone(&log);
        let make = move |tag: &'static str| -> Handler {
            let log = Arc::clone(&log2);
            Arc::new(move |_e: &Event| log.lock().push(tag.to_string()))
        };
        (log, make)
    }

    #[test]
    fn test_handlers_fire_in_subscription_order() {
        let emitter = EventEmitter::new();
        let (log, make) = recorder();

        let first = make("first");
        let second = make("second");
        emitter.on("created", move |e| first(e));
        emitter.on("created", move |e| second(e));

        emitter.trigger("created", vec![json!({"id": "r1"})]);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_off_removes_handler() {
        let emitter = EventEmitter::new();
        let (log, make) = recorder();

        let h = make("a");
        let id = emitter.on("x", move |e| h(e));
        assert!(emitter.off(id));
        assert!(!emitter.off(id));

        emitter.trigger("x", vec![]);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_self_unsubscribe_does_not_break_current_pass() {
        let emitter = Arc::new(EventEmitter::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let self_id = Arc::new(Mutex::new(None::<HandlerId>));

        {
            let emitter2 = Arc::clone(&emitter);
            let log = Arc::clone(&log);
            let self_id2 = Arc::clone(&self_id);
            let id = emitter.on("tick", move |_| {
                log.lock().push("self-removing");
                if let Some(id) = *self_id2.lock() {
                    emitter2.off(id);
                }
            });
            *self_id.lock() = Some(id);
        }
        {
            let log = Arc::clone(&log);
            emitter.on("tick", move |_| log.lock().push("after"));
        }

        emitter.trigger("tick", vec![]);
        assert_eq!(*log.lock(), vec!["self-removing", "after"]);

        emitter.trigger("tick", vec![]);
        assert_eq!(*log.lock(), vec!["self-removing", "after", "after"]);
    }

    #[test]
    fn test_handler_removing_later_handler_keeps_current_pass() {
        let emitter = Arc::new(EventEmitter::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = Arc::new(Mutex::new(None::<HandlerId>));

        {
            let emitter2 = Arc::clone(&emitter);
            let victim = Arc::clone(&victim);
            emitter.on("tick", move |_| {
                if let Some(id) = *victim.lock() {
                    emitter2.off(id);
                }
            });
        }
        {
            let log = Arc::clone(&log);
            let id = emitter.on("tick", move |_| log.lock().push("victim"));
            *victim.lock() = Some(id);
        }

        emitter.trigger("tick", vec![]);
        emitter.trigger("tick", vec![]);
        assert_eq!(*log.lock(), vec!["victim"]);
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let emitter = EventEmitter::new();
        let (log, make) = recorder();

        let h = make("loaded");
        emitter.once("loaded", move |e| h(e));
        assert_eq!(emitter.listener_count("loaded"), 1);

        emitter.trigger("loaded", vec![]);
        emitter.trigger("loaded", vec![]);
        assert_eq!(*log.lock(), vec!["loaded"]);
        assert_eq!(emitter.listener_count("loaded"), 0);
    }

    #[test]
    fn test_off_event_clears_only_that_event() {
        let emitter = EventEmitter::new();
        emitter.on("created", |_| {});
        emitter.on("created", |_| {});
        emitter.on("deleted", |_| {});

        assert_eq!(emitter.off_event("created"), 2);
        assert_eq!(emitter.listener_count("created"), 0);
        assert_eq!(emitter.listener_count("deleted"), 1);
    }
}
