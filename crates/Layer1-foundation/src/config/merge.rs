//! Config Merge - JSON 설정 트리 병합
//!
//! 객체는 재귀적으로 병합하고, 스칼라/배열/null은 나중 값이 덮어씁니다.
//! 명시적인 `null`로 하위 레이어의 기본값을 끌 수 있습니다.

use serde_json::{Map, Value};

/// `source`를 `target`에 깊은 병합 (`source`가 우선)
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// 점(.)으로 구분된 경로로 값 조회
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| current.get(segment))
}

// ============================================================================
// ConfigLayers
// ============================================================================

/// 설정 레이어 종류 (낮은 우선순위 → 높은 우선순위)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// 코어 기본값
    Defaults,
    /// 내부(internal) 플러그인 기본값
    Internal,
    /// 공개(public) 플러그인 기본값
    Public,
    /// 사용자 지정 값
    User,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::Internal => write!(f, "internal"),
            Self::Public => write!(f, "public"),
            Self::User => write!(f, "user"),
        }
    }
}

/// 순서가 있는 설정 레이어 모음
///
/// 레이어는 종류별 우선순위로, 같은 종류 안에서는 추가된 순서로 병합됩니다.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    layers: Vec<(LayerKind, String, Value)>,
}

impl ConfigLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레이어 추가
    pub fn push(&mut self, kind: LayerKind, source: impl Into<String>, value: Value) {
        self.layers.push((kind, source.into(), value));
    }

    /// 빌더 스타일 레이어 추가
    pub fn with(mut self, kind: LayerKind, source: impl Into<String>, value: Value) -> Self {
        self.push(kind, source, value);
        self
    }

    /// 모든 레이어를 빈 객체에서부터 병합
    pub fn fold(&self) -> Value {
        let mut ordered: Vec<_> = self.layers.iter().enumerate().collect();
        ordered.sort_by_key(|(index, (kind, _, _))| (*kind, *index));

        let mut merged = Value::Object(Map::new());
        for (_, (_, _, value)) in ordered {
            deep_merge(&mut merged, value);
        }
        merged
    }

    /// 레이어 출처 목록 (병합 순서)
    pub fn sources(&self) -> Vec<String> {
        let mut ordered: Vec<_> = self.layers.iter().enumerate().collect();
        ordered.sort_by_key(|(index, (kind, _, _))| (*kind, *index));
        ordered
            .into_iter()
            .map(|(_, (kind, source, _))| format!("{}:{}", kind, source))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
