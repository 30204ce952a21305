//! The `{code, status, ...}` wrappers every response is sent in.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::{StatusCode, Uri};
use serde::Serialize;

use crate::listing::Page;

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// `{code, status, data}`: a single record or a list.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub code: u16,
    pub status: &'static str,
    pub data: T,
}

/// `{code, status, message}`: action acknowledgement or plain error.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageEnvelope {
    #[schema(example = 200)]
    pub code: u16,
    #[schema(example = "OK")]
    pub status: &'static str,
    #[schema(example = "Product saved successfully")]
    pub message: String,
}

impl MessageEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            status: reason(status),
            message: message.into(),
        }
    }
}

/// `{code, status, error: {field: [messages]}}`: field validation failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FieldErrorEnvelope {
    #[schema(example = 400)]
    pub code: u16,
    #[schema(example = "Bad Request")]
    pub status: &'static str,
    #[schema(example = json!({"category": ["The category field is required"]}))]
    pub error: BTreeMap<String, Vec<String>>,
}

impl FieldErrorEnvelope {
    pub fn new(status: StatusCode, error: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            code: status.as_u16(),
            status: reason(status),
            error,
        }
    }
}

/// Wrap `data` in a 200 envelope.
pub fn ok<T: Serialize>(data: T) -> Json<DataEnvelope<T>> {
    Json(DataEnvelope {
        code: StatusCode::OK.as_u16(),
        status: reason(StatusCode::OK),
        data,
    })
}

/// 200 acknowledgement carrying only a message.
pub fn message(message: impl Into<String>) -> Json<MessageEnvelope> {
    Json(MessageEnvelope::new(StatusCode::OK, message))
}

/// Paginated payload placed under `data` by datatable endpoints.
#[derive(Debug, Serialize, PartialEq)]
pub struct Datatable<T> {
    pub current_page: u64,
    pub first_page_url: String,
    pub from: u64,
    pub last_page: u64,
    pub last_page_url: String,
    pub next_page_url: String,
    pub prev_page_url: String,
    pub to: u64,
    pub total: u64,
    pub data: Vec<T>,
}

impl<T> Datatable<T> {
    /// Shape a fetched page. Page links point back at the request `uri`,
    /// keeping its other query parameters, and are empty when the target page
    /// does not exist.
    pub fn from_page<M>(page: Page<M>, uri: &Uri, convert: impl FnMut(M) -> T) -> Self {
        let kept = retained_query(uri);
        let link = |n: u64| format!("{}?{kept}page={n}&limit={}", uri.path(), page.per_page);
        let last_page = page.total_pages.max(1);
        let offset = (page.page - 1).saturating_mul(page.per_page);
        let count = page.items.len() as u64;

        Self {
            current_page: page.page,
            first_page_url: link(1),
            from: if count == 0 { 0 } else { offset.saturating_add(1) },
            last_page,
            last_page_url: link(last_page),
            next_page_url: if page.page < page.total_pages {
                link(page.page + 1)
            } else {
                String::new()
            },
            prev_page_url: if page.page > 1 {
                link(page.page - 1)
            } else {
                String::new()
            },
            to: offset.saturating_add(count),
            total: page.total,
            data: page.items.into_iter().map(convert).collect(),
        }
    }
}

/// Query pairs of `uri` other than `page` and `limit`, still encoded, each
/// followed by `&`.
fn retained_query(uri: &Uri) -> String {
    uri.query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !pair.is_empty() && key != "page" && key != "limit"
        })
        .map(|pair| format!("{pair}&"))
        .collect()
}
