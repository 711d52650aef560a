//! Payload Transforms - 요청/응답 본문 재작성 규칙
//!
//! 각 transform은 이름, 방향, predicate, 변환 함수로 이루어집니다.
//! 같은 이름이 여러 개여도 모두 유지되며, 일치하는 transform은 등록 순서대로 모두 실행됩니다.

use serde_json::Value;
use std::sync::Arc;
use tracing::trace;
use webex_foundation::Result;

/// transform 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// 응답 본문 (수신 후)
    Inbound,

    /// 요청 본문 (송신 전)
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

/// transform에 전달되는 요청 정보
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub direction: Direction,
    pub method: String,
    pub uri: String,

    /// 응답 상태 코드 (inbound에서만)
    pub status_code: Option<u16>,
}

pub type Predicate = Arc<dyn Fn(&TransformContext, &Value) -> bool + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(&TransformContext, Value) -> Result<Value> + Send + Sync>;

/// 이름이 있는 predicate + transform 쌍
#[derive(Clone)]
pub struct PayloadTransform {
    name: String,
    direction: Direction,
    predicate: Predicate,
    transform: TransformFn,
}

impl PayloadTransform {
    pub fn new<P, T>(name: impl Into<String>, direction: Direction, predicate: P, transform: T) -> Self
    where
        P: Fn(&TransformContext, &Value) -> bool + Send + Sync + 'static,
        T: Fn(&TransformContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            direction,
            predicate: Arc::new(predicate),
            transform: Arc::new(transform),
        }
    }

    /// 요청 본문 transform
    pub fn outbound<P, T>(name: impl Into<String>, predicate: P, transform: T) -> Self
    where
        P: Fn(&TransformContext, &Value) -> bool + Send + Sync + 'static,
        T: Fn(&TransformContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, Direction::Outbound, predicate, transform)
    }

    /// 응답 본문 transform
    pub fn inbound<P, T>(name: impl Into<String>, predicate: P, transform: T) -> Self
    where
        P: Fn(&TransformContext, &Value) -> bool + Send + Sync + 'static,
        T: Fn(&TransformContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, Direction::Inbound, predicate, transform)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn applies(&self, ctx: &TransformContext, body: &Value) -> bool {
        self.direction == ctx.direction && (self.predicate)(ctx, body)
    }
}

impl std::fmt::Debug for PayloadTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadTransform")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .finish()
    }
}

// ============================================================================
// TransformChain
// ============================================================================

/// 등록 순서를 유지하는 transform 목록
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    transforms: Vec<PayloadTransform>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transform: PayloadTransform) {
        self.transforms.push(transform);
    }

    pub fn extend(&mut self, transforms: impl IntoIterator<Item = PayloadTransform>) {
        self.transforms.extend(transforms);
    }

    /// 일치하는 모든 transform을 순서대로 적용
    pub fn run(&self, ctx: &TransformContext, mut body: Value) -> Result<Value> {
        for transform in &self.transforms {
            if transform.applies(ctx, &body) {
                trace!(transform = %transform.name, direction = %ctx.direction, "Applying payload transform");
                body = (transform.transform)(ctx, body)?;
            }
        }
        Ok(body)
    }

    /// 방향별 transform 이름 (등록 순서)
    pub fn names(&self, direction: Direction) -> Vec<&str> {
        self.transforms
            .iter()
            .filter(|t| t.direction == direction)
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webex_foundation::Error;

    fn outbound_ctx() -> TransformContext {
        TransformContext {
            direction: Direction::Outbound,
            method: "POST".into(),
            uri: "https://webexapis.com/v1/messages".into(),
            status_code: None,
        }
    }

    fn append(tag: &'static str) -> impl Fn(&TransformContext, Value) -> Result<Value> {
        move |_, mut body| {
            let trail = body["trail"].as_str().unwrap_or_default().to_string();
            body["trail"] = json!(format!("{}{}", trail, tag));
            Ok(body)
        }
    }

    #[test]
    fn test_duplicate_names_all_run_in_order() {
        let mut chain = TransformChain::new();
        chain.push(PayloadTransform::outbound("normalize", |_, _| true, append("a")));
        chain.push(PayloadTransform::outbound("normalize", |_, _| true, append("b")));

        let body = chain.run(&outbound_ctx(), json!({})).unwrap();
        assert_eq!(body["trail"], json!("ab"));
        assert_eq!(chain.names(Direction::Outbound), vec!["normalize", "normalize"]);
    }

    #[test]
    fn test_predicate_and_direction_filter() {
        let mut chain = TransformChain::new();
        chain.push(PayloadTransform::outbound(
            "only-html",
            |_, body| body.get("html").is_some(),
            append("h"),
        ));
        chain.push(PayloadTransform::inbound("decrypt", |_, _| true, append("i")));

        let untouched = chain.run(&outbound_ctx(), json!({"text": "hi"})).unwrap();
        assert!(untouched.get("trail").is_none());

        let touched = chain.run(&outbound_ctx(), json!({"html": "<b>hi</b>"})).unwrap();
        assert_eq!(touched["trail"], json!("h"));
    }

    #[test]
    fn test_error_stops_chain() {
        let mut chain = TransformChain::new();
        chain.push(PayloadTransform::outbound("fail", |_, _| true, |_, _| {
            Err(Error::InvalidInput("bad payload".into()))
        }));
        chain.push(PayloadTransform::outbound("after", |_, _| true, append("x")));

        assert!(chain.run(&outbound_ctx(), json!({})).is_err());
    }
}
