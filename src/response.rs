//! JSON envelope shared by every non-auth endpoint.
//!
//! Successful and failed responses use the same shape:
//! `{success, message?, meta?, data?, error?}`. Listing endpoints attach a
//! [`PageMeta`] describing the page that was returned.

use serde::{Deserialize, Serialize};

use crate::models::PageParams;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            meta: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    /// A successful response that carries no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            meta: None,
            data: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            meta: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Pagination details for a listing response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub limit: i64,
    pub page: i64,
    /// Number of items actually present in this page.
    pub per_page: i64,
    pub page_count: i64,
    pub total: i64,
}

impl PageMeta {
    pub fn new(params: &PageParams, per_page: usize, total: i64) -> Self {
        Self {
            limit: params.limit,
            page: params.page,
            per_page: per_page as i64,
            page_count: page_count(total, params.limit),
            total,
        }
    }
}

/// `ceil(total / limit)`, or zero when `limit` is not positive.
pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 || total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
