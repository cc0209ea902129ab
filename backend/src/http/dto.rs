//! Data Transfer Objects for the HTTP API.
//!
//! Request payloads are the `*Draft` types from [`crate::models`]; this module holds the
//! response envelope and the query-string shapes.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    CardBox, CardBoxDraft, CardBoxWithItems, IssuedToken, Item, ItemDraft, ItemUpdateDraft,
    LoginDraft, Page, Post, PostDraft, RegisterDraft, ReviewDraft, User,
};

/// Success envelope: `{"status": "success", "message": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            data,
        }
    }

    /// Envelope without a message.
    pub fn data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data,
        }
    }
}

/// `?page=&per_page=` for paginated listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Query parameters for the item listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemListQuery {
    /// Restrict to one of the caller's boxes
    #[serde(default)]
    pub box_id: Option<i64>,
    /// Only items due for review now
    #[serde(default)]
    pub due: Option<bool>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// `{"box": {...}}` wrapper used by the box endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct BoxEnvelope<T> {
    #[serde(rename = "box")]
    pub card_box: T,
}

/// Success without a payload, as returned by deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}
