//! Page - 목록 응답과 `Link` 헤더 기반 다음 페이지

use futures::stream::{self, Stream, TryStreamExt};
use serde_json::{json, Value};
use webex_core::{HttpResponse, Method, RequestOptions, WebexClient};
use webex_foundation::Result;

/// 목록 응답 한 페이지
///
/// `items`와 함께 응답의 `Link: <...>; rel="next"` 주소를 보관합니다.
#[derive(Clone)]
pub struct Page {
    items: Vec<Value>,
    next: Option<String>,
    client: WebexClient,
}

impl Page {
    pub fn from_response(client: WebexClient, response: &HttpResponse) -> Self {
        let items = match response.body.get("items") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let next = response.header("link").and_then(next_link);

        Self {
            items,
            next,
            client,
        }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// 다음 페이지 요청. 없으면 `None`
    pub async fn next_page(&self) -> Result<Option<Page>> {
        let Some(url) = &self.next else {
            return Ok(None);
        };

        let response = self
            .client
            .request(RequestOptions::uri(Method::GET, url.clone()))
            .await?;
        Ok(Some(Page::from_response(self.client.clone(), &response)))
    }

    /// 이 페이지부터 마지막 페이지까지의 스트림
    pub fn pages(self) -> impl Stream<Item = Result<Page>> {
        stream::unfold(Some(Ok(self)), |state: Option<Result<Page>>| async move {
            match state? {
                Ok(page) => {
                    let next = page.next_page().await.transpose();
                    Some((Ok(page), next))
                }
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// 남은 모든 페이지의 항목 수집
    pub async fn collect_all(self) -> Result<Vec<Value>> {
        let pages: Vec<Page> = self.pages().try_collect().await?;
        Ok(pages.into_iter().flat_map(Page::into_items).collect())
    }

    /// `{items, next}` 형태의 값
    pub fn to_value(&self) -> Value {
        json!({
            "items": self.items,
            "next": self.next,
        })
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("items", &self.items.len())
            .field("next", &self.next)
            .finish()
    }
}

/// `Link` 헤더에서 `rel="next"` 주소 추출
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut fields = part.split(';');
        let url = fields.next()?.trim();
        let is_next = fields.any(|field| {
            let field = field.trim();
            field == "rel=\"next\"" || field == "rel=next"
        });

        if is_next && url.starts_with('<') && url.ends_with('>') {
            Some(url[1..url.len() - 1].to_string())
        } else {
            None
        }
    })
}
