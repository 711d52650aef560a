//! HTML Utilities - 이스케이프 및 허용 목록 기반 필터링
//!
//! - `escape`: 모든 HTML 특수 문자를 엔티티로 변환
//! - `filter_escape`: 허용된 태그/속성만 남기고, 허용되지 않은 태그는 텍스트로 이스케이프

use std::collections::HashMap;

/// 태그 이름 → 허용 속성 목록
pub type AllowedTags = HashMap<String, Vec<String>>;

/// 모든 HTML 특수 문자 이스케이프
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 텍스트 노드용 이스케이프 (따옴표는 유지)
fn escape_text(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// 허용 목록 밖의 태그를 이스케이프하고, 허용된 태그에서는 허용 속성만 남김
///
/// `href`/`src`의 `javascript:`/`vbscript:` 값은 항상 제거합니다.
pub fn filter_escape(allowed: &AllowedTags, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(&['<', '>', '&'][..]) {
        escape_text(&rest[..start], &mut out);
        let tail = &rest[start..];

        if !tail.starts_with('<') {
            escape_text(&tail[..1], &mut out);
            rest = &tail[1..];
            continue;
        }

        match parse_tag(tail) {
            Some((tag, consumed)) => {
                match allowed.get(&tag.name) {
                    Some(attrs) => out.push_str(&tag.render(attrs)),
                    None => escape_text(&tail[..consumed], &mut out),
                }
                rest = &tail[consumed..];
            }
            None => {
                out.push_str("&lt;");
                rest = &tail[1..];
            }
        }
    }

    escape_text(rest, &mut out);
    out
}

// ============================================================================
// Tag parsing
// ============================================================================

struct Tag {
    name: String,
    closing: bool,
    attributes: Vec<(String, Option<String>)>,
}

impl Tag {
    fn render(&self, allowed_attrs: &[String]) -> String {
        if self.closing {
            return format!("</{}>", self.name);
        }

        let mut rendered = format!("<{}", self.name);
        for (name, value) in &self.attributes {
            if !allowed_attrs.iter().any(|a| a.eq_ignore_ascii_case(name)) {
                continue;
            }
            match value {
                Some(value) if is_script_url(name, value) => {}
                Some(value) => {
                    rendered.push_str(&format!(" {}=\"", name));
                    escape_attribute(&decode_entities(value), &mut rendered);
                    rendered.push('"');
                }
                None => rendered.push_str(&format!(" {}", name)),
            }
        }
        rendered.push('>');
        rendered
    }
}

/// 속성 값 이스케이프 (큰따옴표 포함)
fn escape_attribute(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// 스킴 검사 전 정규화: 엔티티 디코딩 후 공백/제어 문자 제거
fn is_script_url(name: &str, value: &str) -> bool {
    if !(name.eq_ignore_ascii_case("href") || name.eq_ignore_ascii_case("src")) {
        return false;
    }
    let normalized: String = decode_entities(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    normalized.starts_with("javascript:") || normalized.starts_with("vbscript:")
}

/// 숫자(10진/16진) 및 자주 쓰이는 이름 엔티티 디코딩
///
/// 브라우저처럼 숫자 엔티티의 `;`는 생략될 수 있습니다.
/// 알 수 없는 엔티티는 그대로 둡니다.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        match decode_entity(tail) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// `&` 다음 입력에서 엔티티 하나를 디코딩. (문자, 소비한 바이트 수)
fn decode_entity(input: &str) -> Option<(char, usize)> {
    if let Some(numeric) = input.strip_prefix('#') {
        let hex = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X'));
        let (radix, digits, prefix) = match hex {
            Some(hex) => (16, hex, 2),
            None => (10, numeric, 1),
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return None;
        }
        let code = u32::from_str_radix(&digits[..len], radix).unwrap_or(u32::MAX);
        let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        let semicolon = usize::from(digits[len..].starts_with(';'));
        return Some((c, prefix + len + semicolon));
    }

    let len = input.find(';')?;
    let c = match input[..len].to_ascii_lowercase().as_str() {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "colon" => ':',
        "tab" => '\t',
        "newline" => '\n',
        "nbsp" => '\u{a0}',
        _ => return None,
    };
    Some((c, len + 1))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '_'
}

/// `<`로 시작하는 입력에서 태그 하나를 파싱. (태그, 소비한 바이트 수)
fn parse_tag(input: &str) -> Option<(Tag, usize)> {
    let end = input.find('>')?;
    let inner = &input[1..end];

    let (closing, inner) = match inner.strip_prefix('/') {
        Some(stripped) => (true, stripped),
        None => (false, inner),
    };

    if !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let name_len = inner.find(|c: char| !is_name_char(c)).unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();
    let attributes = parse_attributes(inner[name_len..].trim_end_matches('/'));

    Some((
        Tag {
            name,
            closing,
            attributes,
        },
        end + 1,
    ))
}

fn parse_attributes(mut input: &str) -> Vec<(String, Option<String>)> {
    let mut attributes = Vec::new();

    loop {
        input = input.trim_start();
        if input.is_empty() {
            break;
        }

        let name_len = input.find(|c: char| !is_name_char(c)).unwrap_or(input.len());
        if name_len == 0 {
            // 알 수 없는 문자는 건너뜀
            let skip = input.chars().next().map(char::len_utf8).unwrap_or(1);
            input = &input[skip..];
            continue;
        }

        let name = input[..name_len].to_string();
        input = input[name_len..].trim_start();

        let Some(after_eq) = input.strip_prefix('=') else {
            attributes.push((name, None));
            continue;
        };
        let after_eq = after_eq.trim_start();

        let (value, consumed) = match after_eq.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after_eq[1..];
                match body.find(quote) {
                    Some(close) => (body[..close].to_string(), close + 2),
                    None => (body.to_string(), after_eq.len()),
                }
            }
            _ => {
                let len = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                (after_eq[..len].to_string(), len)
            }
        };

        attributes.push((name, Some(value)));
        input = &after_eq[consumed..];
    }

    attributes
}
