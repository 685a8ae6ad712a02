use async_trait::async_trait;
use folio_api_types::{
    DataEnvelope, LoginRequest, LoginResponse, PostContentsRequest, PostDetail, PostPage,
    RegisterRequest,
};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::application::api::{AccountsApi, PostsApi};
use crate::application::error::FetchError;
use crate::domain::query::QueryState;
use crate::infra::error::InfraError;

/// reqwest-backed implementation of the posts and accounts API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: &Url) -> Result<Self, InfraError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| FetchError::Transport(format!("invalid URL: {err}")))
    }

    fn bearer(token: &str) -> Result<HeaderValue, FetchError> {
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| FetchError::Transport(format!("invalid token header: {err}")))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, FetchError> {
        let mut url = self.url(path)?;
        if let Some(q) = query {
            url.set_query(None);
            let mut qp = url.query_pairs_mut();
            for (k, v) in q {
                qp.append_pair(k, v);
            }
        }

        debug!(target = "folio::http", %method, %url, "sending request");
        let mut req = self.client.request(method, url);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, Self::bearer(token)?);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await.map_err(FetchError::transport)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(FetchError::transport)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(FetchError::status(status.as_u16(), text));
        }
        Ok(bytes.to_vec())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<T, FetchError> {
        let bytes = self.send(method, path, query, token, body).await?;
        serde_json::from_slice(&bytes).map_err(FetchError::decode)
    }

    /// Like [`Self::request`] but tolerates an empty body.
    async fn request_value(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, FetchError> {
        let bytes = self.send(method, path, None, token, body).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(FetchError::decode)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, FetchError> {
    serde_json::to_value(value).map_err(FetchError::decode)
}

fn post_path(id: Uuid) -> String {
    format!("api/posts/{id}")
}

#[async_trait]
impl PostsApi for ApiClient {
    async fn list_posts(&self, query: &QueryState) -> Result<PostPage, FetchError> {
        let params = query.list_params();
        self.request(Method::GET, "api/posts", Some(&params), None, None)
            .await
    }

    async fn get_post(&self, token: &str, id: Uuid) -> Result<PostDetail, FetchError> {
        let envelope: DataEnvelope<PostDetail> = self
            .request(Method::GET, &post_path(id), None, Some(token), None)
            .await?;
        Ok(envelope.data)
    }

    async fn create_post(
        &self,
        token: &str,
        contents: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let body = to_value(&PostContentsRequest {
            contents: contents.to_string(),
        })?;
        self.request_value(Method::POST, "api/posts", Some(token), Some(body))
            .await
    }

    async fn update_post(
        &self,
        token: &str,
        id: Uuid,
        contents: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let body = to_value(&PostContentsRequest {
            contents: contents.to_string(),
        })?;
        self.request_value(Method::PUT, &post_path(id), Some(token), Some(body))
            .await
    }

    async fn delete_post(&self, token: &str, id: Uuid) -> Result<(), FetchError> {
        self.send(Method::DELETE, &post_path(id), None, Some(token), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountsApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, FetchError> {
        let body = to_value(request)?;
        self.request(Method::POST, "api/login", None, None, Some(body))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, FetchError> {
        let body = to_value(request)?;
        self.request_value(Method::POST, "api/accounts", None, Some(body))
            .await
    }
}

#[cfg(test)]
mod tests;
