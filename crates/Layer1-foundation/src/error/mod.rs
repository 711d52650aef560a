//! Error types for the Webex SDK
//!
//! 모든 에러를 중앙에서 관리
//!
//! - `Error`: SDK 전체에서 사용하는 단일 에러 열거형
//! - `Exception`: 기본 메시지 + `parse` 훅을 가진 예외 패턴

mod exception;

pub use exception::Exception;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Webex SDK 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 플러그인 등록/구성 관련
    // ========================================================================
    #[error("Plugin `{name}` is already registered in the {namespace} namespace")]
    DuplicateRegistration { namespace: String, name: String },

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Plugin `{plugin}` failed to construct: {source}")]
    Construction {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Unknown method `{method}` on `{target}`")]
    UnknownMethod { target: String, method: String },

    // ========================================================================
    // HTTP 관련
    // ========================================================================
    #[error("HTTP {status_code} {reason}: {message}")]
    Http {
        status_code: u16,
        reason: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::InvalidInput(_)
                | Error::NotReady(_)
                | Error::Http { .. }
        )
    }

    /// HTTP 에러의 상태 코드
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status_code, .. } => Some(*status_code),
            Error::Construction { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// 중복 등록 에러 생성 헬퍼
    pub fn duplicate(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Error::DuplicateRegistration {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// 플러그인 생성 실패 에러 생성 헬퍼
    pub fn construction(plugin: impl Into<String>, source: Error) -> Self {
        Error::Construction {
            plugin: plugin.into(),
            source: Box::new(source),
        }
    }

    /// 알 수 없는 메서드 에러 생성 헬퍼
    pub fn unknown_method(target: impl Into<String>, method: impl Into<String>) -> Self {
        Error::UnknownMethod {
            target: target.into(),
            method: method.into(),
        }
    }

    /// 여러 대기자에게 같은 실패를 전달하기 위한 복제
    ///
    /// `Io`/`Json`은 원본을 복제할 수 없어 메시지만 `Internal`로 옮깁니다.
    pub fn replicate(&self) -> Self {
        match self {
            Error::DuplicateRegistration { namespace, name } => Error::duplicate(namespace, name),
            Error::NotReady(s) => Error::NotReady(s.clone()),
            Error::Construction { plugin, source } => {
                Error::construction(plugin.clone(), source.replicate())
            }
            Error::UnknownMethod { target, method } => Error::unknown_method(target, method),
            Error::Http {
                status_code,
                reason,
                message,
            } => Error::Http {
                status_code: *status_code,
                reason: reason.clone(),
                message: message.clone(),
            },
            Error::Network(s) => Error::Network(s.clone()),
            Error::Storage(s) => Error::Storage(s.clone()),
            Error::Config(s) => Error::Config(s.clone()),
            Error::NotFound(s) => Error::NotFound(s.clone()),
            Error::InvalidInput(s) => Error::InvalidInput(s.clone()),
            Error::Io(e) => Error::Internal(e.to_string()),
            Error::Json(e) => Error::Internal(e.to_string()),
            Error::Internal(s) => Error::Internal(s.clone()),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let rate_limited = Error::Http {
            status_code: 429,
            reason: "Too Many Requests".into(),
            message: "slow down".into(),
        };
        let not_found = Error::Http {
            status_code: 404,
            reason: "Not Found".into(),
            message: "no such room".into(),
        };

        assert!(rate_limited.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(!Error::NotReady("device".into()).is_retryable());
    }

    #[test]
    fn test_construction_keeps_source() {
        let err = Error::construction("rooms", Error::Config("missing hydra".into()));
        assert!(err.to_string().contains("rooms"));
        assert!(err.to_string().contains("missing hydra"));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_replicate_keeps_http_details() {
        let err = Error::Http {
            status_code: 503,
            reason: "Service Unavailable".into(),
            message: "try later".into(),
        };
        let copy = err.replicate();
        assert_eq!(copy.status_code(), Some(503));
        assert_eq!(copy.to_string(), err.to_string());

        let io = Error::Io(std::io::Error::other("disk"));
        assert!(matches!(io.replicate(), Error::Internal(ref m) if m == "disk"));
    }
}
