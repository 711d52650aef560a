//! Token - 액세스 토큰 정규화

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 기본 토큰 타입
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// 액세스 토큰 (supertoken)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// 만료 시각 (epoch 밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl Token {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            refresh_token: None,
            expires: None,
        }
    }

    /// `Authorization` 헤더 형태의 문자열에서 생성
    ///
    /// `" Bearer  1234 "` → (`Bearer`, `1234`), `"1234"` → (`Bearer`, `1234`)
    pub fn from_header(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let first = parts.next()?;

        match parts.next() {
            Some(token) if first.eq_ignore_ascii_case(DEFAULT_TOKEN_TYPE) => {
                Some(Self::new(token, DEFAULT_TOKEN_TYPE))
            }
            Some(token) => Some(Self::new(token, first)),
            None => Some(Self::new(first, DEFAULT_TOKEN_TYPE)),
        }
    }

    /// 문자열 또는 객체에서 토큰 추출
    ///
    /// 객체는 `access_token`을 직접 갖거나 `supertoken`, `authorization`,
    /// `credentials` 아래에 중첩될 수 있습니다.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Self::from_header(raw),
            Value::Object(map) => {
                if let Some(raw) = map.get("access_token").and_then(Value::as_str) {
                    let mut token = Self::from_header(raw)?;
                    if let Some(token_type) = map.get("token_type").and_then(Value::as_str) {
                        token.token_type = token_type.to_string();
                    }
                    token.refresh_token = map
                        .get("refresh_token")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    token.expires = map.get("expires").and_then(Value::as_i64).or_else(|| {
                        map.get("expires_in")
                            .and_then(Value::as_i64)
                            .map(|secs| {
                                Utc::now()
                                    .timestamp_millis()
                                    .saturating_add(secs.saturating_mul(1000))
                            })
                    });
                    return Some(token);
                }

                ["supertoken", "authorization", "credentials"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Self::parse))
            }
            _ => None,
        }
    }

    /// `Authorization` 헤더 값
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub fn is_expired(&self) -> bool {
        self.expires
            .map(|expires| expires <= Utc::now().timestamp_millis())
            .unwrap_or(false)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// 사용자 토큰(`<a>_<b>_<orgId>`)에서 조직 ID 추출
    pub fn org_id(&self) -> Option<&str> {
        let fields: Vec<&str> = self.access_token.split('_').collect();
        match fields.as_slice() {
            [_, _, org] if !org.is_empty() => Some(*org),
            _ => None,
        }
    }
}
