//! Port traits describing the remote posts API.

use async_trait::async_trait;
use folio_api_types::{LoginRequest, LoginResponse, PostDetail, PostPage, RegisterRequest};
use uuid::Uuid;

use crate::application::error::FetchError;
use crate::domain::query::QueryState;

#[async_trait]
pub trait PostsApi: Send + Sync {
    /// `GET /api/posts` for the page described by `query`.
    async fn list_posts(&self, query: &QueryState) -> Result<PostPage, FetchError>;

    async fn get_post(&self, token: &str, id: Uuid) -> Result<PostDetail, FetchError>;

    async fn create_post(&self, token: &str, contents: &str)
    -> Result<serde_json::Value, FetchError>;

    async fn update_post(
        &self,
        token: &str,
        id: Uuid,
        contents: &str,
    ) -> Result<serde_json::Value, FetchError>;

    async fn delete_post(&self, token: &str, id: Uuid) -> Result<(), FetchError>;
}

#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, FetchError>;

    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, FetchError>;
}
