//! Exception - 기본 메시지와 `parse` 훅을 가진 명명된 예외 패턴
//!
//! 각 예외 타입은 정적 기본 메시지를 가지며, 생성 인자(`Source`)로부터
//! 메시지를 계산하는 `parse` 훅을 재정의할 수 있습니다.
//! 훅이 아무것도 돌려주지 않으면 기본 메시지를 사용합니다.

/// 명명된 예외 트레이트
pub trait Exception {
    /// 생성 인자 타입
    type Source: ?Sized;

    /// 예외 이름 (로그/디버깅용)
    const NAME: &'static str;

    /// `parse`가 메시지를 만들지 못했을 때 사용하는 기본 메시지
    const DEFAULT_MESSAGE: &'static str;

    /// 생성 인자로부터 메시지 계산
    fn parse(_source: &Self::Source) -> Option<String> {
        None
    }

    /// 최종 메시지 (`parse` 결과 → 기본 메시지 순)
    fn message_for(source: &Self::Source) -> String {
        Self::parse(source)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeyFetchError;

    impl Exception for KeyFetchError {
        type Source = str;
        const NAME: &'static str = "KeyFetchError";
        const DEFAULT_MESSAGE: &'static str = "An unknown error occurred while fetching a key";

        fn parse(source: &str) -> Option<String> {
            source
                .strip_prefix("reason=")
                .map(|reason| format!("Key fetch failed: {}", reason))
        }
    }

    struct PlainError;

    impl Exception for PlainError {
        type Source = ();
        const NAME: &'static str = "PlainError";
        const DEFAULT_MESSAGE: &'static str = "plain";
    }

    #[test]
    fn test_parse_hook_builds_message() {
        assert_eq!(
            KeyFetchError::message_for("reason=timeout"),
            "Key fetch failed: timeout"
        );
    }

    #[test]
    fn test_falls_back_to_default_message() {
        assert_eq!(
            KeyFetchError::message_for("garbage"),
            KeyFetchError::DEFAULT_MESSAGE
        );
        assert_eq!(PlainError::message_for(&()), "plain");
    }

    #[test]
    fn test_blank_parse_result_uses_default() {
        assert_eq!(
            KeyFetchError::message_for("reason=   "),
            "Key fetch failed:"
        );

        struct Blank;
        impl Exception for Blank {
            type Source = ();
            const NAME: &'static str = "Blank";
            const DEFAULT_MESSAGE: &'static str = "fallback";
            fn parse(_: &()) -> Option<String> {
                Some("  ".to_string())
            }
        }
        assert_eq!(Blank::message_for(&()), "fallback");
    }
}
