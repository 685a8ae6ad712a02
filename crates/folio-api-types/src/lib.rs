//! Wire types for the Folio posts API.
//!
//! These mirror the JSON bodies exchanged with the portfolio backend. They
//! carry no behaviour beyond (de)serialisation so that both the client core
//! and test doubles can share them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single post as returned by the listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_name: String,
    #[serde(default)]
    pub contents: String,
}

/// One server-side page of posts plus pagination metadata.
///
/// `page` is 1-based and clamped by the server. `data` is kept in the order
/// the server returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    pub data: Vec<Post>,
    pub page: u32,
    pub page_size: u32,
    pub page_total: u32,
    pub total: u64,
}

impl PostPage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Envelope used by single-resource endpoints: `{ "data": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Body of a post as returned by `GET /api/posts/{id}`.
///
/// Only `contents` is guaranteed; other fields are kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(default)]
    pub contents: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body for both `POST /api/posts` and `PUT /api/posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContentsRequest {
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub account_name: String,
    pub email: String,
    pub password: String,
}

/// Error body shape. The backend uses `error`; some paths use `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}
