//! Create and edit flows for a signed-in account's posts.
//!
//! Contents are opaque markup; this layer only moves them to and from the
//! API and decides where to navigate afterwards.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::api::PostsApi;
use crate::application::error::AppError;
use crate::application::session::{AuthContext, Identity};
use crate::domain::error::DomainError;
use crate::domain::query::Location;

pub const SAVE_FAILURE: &str = "Failed to save post";
pub const LOAD_FAILURE: &str = "Failed to fetch post";

/// What a successful save produced and where the listing should go next.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub response: serde_json::Value,
    pub next: Location,
}

pub struct PostEditor<A: PostsApi + ?Sized> {
    api: Arc<A>,
    auth: Arc<AuthContext>,
}

impl<A: PostsApi + ?Sized> PostEditor<A> {
    pub fn new(api: Arc<A>, auth: Arc<AuthContext>) -> Self {
        Self { api, auth }
    }

    fn identity(&self) -> Result<Identity, AppError> {
        self.auth.current().ok_or(AppError::Unauthenticated)
    }

    pub async fn create(&self, contents: &str) -> Result<Saved, AppError> {
        let identity = self.identity()?;
        ensure_contents(contents)?;
        let response = self
            .api
            .create_post(identity.token(), contents)
            .await
            .map_err(|err| AppError::request(SAVE_FAILURE, err))?;
        info!(target = "folio::editor", "post created");
        Ok(Saved {
            response,
            next: Location::posts(),
        })
    }

    /// Load the current contents of `id` for editing.
    pub async fn load(&self, id: Uuid) -> Result<String, AppError> {
        let identity = self.identity()?;
        let detail = self
            .api
            .get_post(identity.token(), id)
            .await
            .map_err(|err| AppError::request(LOAD_FAILURE, err))?;
        Ok(detail.contents)
    }

    pub async fn save(&self, id: Uuid, contents: &str) -> Result<Saved, AppError> {
        let identity = self.identity()?;
        ensure_contents(contents)?;
        let response = self
            .api
            .update_post(identity.token(), id, contents)
            .await
            .map_err(|err| AppError::request(SAVE_FAILURE, err))?;
        info!(target = "folio::editor", post = %id, "post updated");
        Ok(Saved {
            response,
            next: Location::posts(),
        })
    }
}

fn ensure_contents(contents: &str) -> Result<(), DomainError> {
    if contents.trim().is_empty() {
        return Err(DomainError::validation("post contents must not be empty"));
    }
    Ok(())
}
