//! Post list controller: fetch-on-change, stale-response guard, ownership
//! gating and post-mutation navigation for the paginated listing.
//!
//! Each fetch is tagged with a monotonically increasing generation. Only the
//! completion whose generation matches the most recently issued fetch may
//! update what is displayed; anything older is dropped and counted.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use folio_api_types::{Post, PostPage};
use metrics::{counter, histogram};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::api::PostsApi;
use crate::application::confirm::{Confirmation, ConfirmationGate, Gated};
use crate::application::error::FetchError;
use crate::application::session::AuthContext;
use crate::domain::posts::{PostActions, actions_for};
use crate::domain::query::{Location, PostQuery, QueryState, SearchInput, ViewKey};

pub const METRIC_FETCH_TOTAL: &str = "folio_posts_fetch_total";
pub const METRIC_FETCH_STALE_TOTAL: &str = "folio_posts_fetch_stale_total";
pub const METRIC_FETCH_ERROR_TOTAL: &str = "folio_posts_fetch_error_total";
pub const METRIC_FETCH_MS: &str = "folio_posts_fetch_ms";

pub const GENERIC_FETCH_FAILURE: &str = "Failed to load posts";
pub const DELETE_FAILURE: &str = "Failed to delete post";
pub const EMPTY_LISTING: &str = "No posts available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Loading,
    Success(PostPage),
    Error(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListingOptions {
    /// After a delete leaves the current page empty and beyond the last page,
    /// move to the last page. Off unless configured.
    pub clamp_empty_page: bool,
}

/// A fetch that has been issued but not yet applied. Consumed by
/// [`PostListController::complete`], so each fetch applies at most once.
#[derive(Debug)]
pub struct PendingFetch {
    generation: u64,
    request: QueryState,
}

impl PendingFetch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &QueryState {
        &self.request
    }
}

/// A displayed post together with the affordances the viewer may use.
#[derive(Debug, Clone, Copy)]
pub struct PostRow<'a> {
    pub post: &'a Post,
    pub actions: PostActions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    Failed,
}

pub struct PostListController<A: PostsApi + ?Sized> {
    api: Arc<A>,
    auth: Arc<AuthContext>,
    options: ListingOptions,
    query: PostQuery,
    search: SearchInput,
    state: FetchState,
    displayed: Option<PostPage>,
    banner: Option<String>,
    generation: u64,
    issued: Option<ViewKey>,
}

impl<A: PostsApi + ?Sized> PostListController<A> {
    pub fn new(
        api: Arc<A>,
        auth: Arc<AuthContext>,
        query: PostQuery,
        options: ListingOptions,
    ) -> Self {
        let search = SearchInput::new(query.state().contents_filter.clone());
        Self {
            api,
            auth,
            options,
            query,
            search,
            state: FetchState::Idle,
            displayed: None,
            banner: None,
            generation: 0,
            issued: None,
        }
    }

    pub fn query(&self) -> &QueryState {
        self.query.state()
    }

    pub fn location(&self) -> &Location {
        self.query.location()
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// The page currently on screen. Kept while a newer fetch is loading.
    pub fn displayed(&self) -> Option<&PostPage> {
        self.displayed.as_ref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn search(&self) -> &SearchInput {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchInput {
        &mut self.search
    }

    /// Total pages for the pagination control, as reported by the server.
    pub fn page_total(&self) -> u32 {
        self.displayed.as_ref().map_or(0, |page| page.page_total)
    }

    /// True when the listing loaded fine but has nothing to show.
    pub fn is_empty(&self) -> bool {
        matches!(&self.state, FetchState::Success(page) if page.is_empty())
    }

    pub fn can_create(&self) -> bool {
        self.auth.is_signed_in()
    }

    pub fn rows(&self) -> Vec<PostRow<'_>> {
        let claims = self.auth.claims();
        self.displayed
            .iter()
            .flat_map(|page| page.data.iter())
            .map(|post| PostRow {
                post,
                actions: actions_for(claims.as_ref(), post),
            })
            .collect()
    }

    /// Issue a fetch for the current query. The previous page stays displayed.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.generation += 1;
        let request = self.query.state().clone();
        self.issued = Some(request.view_key());
        self.state = FetchState::Loading;
        self.banner = None;
        counter!(METRIC_FETCH_TOTAL).increment(1);
        debug!(
            target = "folio::listing",
            generation = self.generation,
            page = request.page.get(),
            filter = %request.contents_filter,
            "fetch issued"
        );
        PendingFetch {
            generation: self.generation,
            request,
        }
    }

    /// Apply a completed fetch. Returns `false` when it was superseded.
    pub fn complete(&mut self, pending: PendingFetch, result: Result<PostPage, FetchError>) -> bool {
        if pending.generation != self.generation {
            counter!(METRIC_FETCH_STALE_TOTAL).increment(1);
            debug!(
                target = "folio::listing",
                generation = pending.generation,
                latest = self.generation,
                "discarding stale fetch"
            );
            return false;
        }

        match result {
            Ok(page) => {
                self.displayed = Some(page.clone());
                self.state = FetchState::Success(page);
            }
            Err(err) => {
                counter!(METRIC_FETCH_ERROR_TOTAL).increment(1);
                let message = fetch_failure_message(&err);
                warn!(target = "folio::listing", error = %err, "fetch failed");
                self.banner = Some(message.clone());
                self.state = FetchState::Error(message);
            }
        }
        true
    }

    /// Fetch the current query unconditionally.
    pub async fn refresh(&mut self) {
        let pending = self.begin_fetch();
        let started = Instant::now();
        let result = self.api.list_posts(pending.request()).await;
        histogram!(METRIC_FETCH_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        self.complete(pending, result);
    }

    /// Fetch only if page or filter changed since the last issued fetch.
    pub async fn sync(&mut self) -> bool {
        let key = self.query.state().view_key();
        if self.issued.as_ref() == Some(&key) {
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn set_page(&mut self, page: NonZeroU32) {
        self.query.set_page(page);
        self.sync().await;
    }

    /// Commit the staged search text, restarting at page 1.
    pub async fn submit_search(&mut self) {
        self.search.submit(&mut self.query);
        self.sync().await;
    }

    pub async fn navigate(&mut self, location: Location) {
        self.query.navigate(location);
        self.search.set(self.query.state().contents_filter.clone());
        self.sync().await;
    }

    pub async fn back(&mut self) -> bool {
        let moved = self.query.back();
        self.search.set(self.query.state().contents_filter.clone());
        self.sync().await;
        moved
    }

    pub async fn forward(&mut self) -> bool {
        let moved = self.query.forward();
        self.search.set(self.query.state().contents_filter.clone());
        self.sync().await;
        moved
    }

    /// Re-read the current location and fetch it again.
    pub async fn reload(&mut self) {
        self.query.reload();
        self.refresh().await;
    }

    /// Delete `id` behind the confirmation gate, then re-fetch the current view.
    ///
    /// A failure leaves the displayed list untouched and raises the banner.
    pub async fn delete_post(&mut self, gate: &ConfirmationGate, id: Uuid) -> DeleteOutcome {
        let Some(identity) = self.auth.current() else {
            warn!(target = "folio::listing", post = %id, "delete without a session");
            self.banner = Some(DELETE_FAILURE.to_string());
            return DeleteOutcome::Failed;
        };

        let api = Arc::clone(&self.api);
        let outcome = gate
            .run(&Confirmation::delete_post(), || async move {
                api.delete_post(identity.token(), id).await
            })
            .await;

        match outcome {
            Gated::Cancelled => DeleteOutcome::Cancelled,
            Gated::Confirmed(Err(err)) => {
                warn!(target = "folio::listing", post = %id, error = %err, "delete failed");
                self.banner = Some(DELETE_FAILURE.to_string());
                DeleteOutcome::Failed
            }
            Gated::Confirmed(Ok(())) => {
                info!(target = "folio::listing", post = %id, "post deleted");
                self.refresh().await;
                if self.options.clamp_empty_page {
                    self.clamp_to_last_page().await;
                }
                DeleteOutcome::Deleted
            }
        }
    }

    async fn clamp_to_last_page(&mut self) {
        let FetchState::Success(page) = &self.state else {
            return;
        };
        let current = self.query.state().page.get();
        if !page.is_empty() || current <= page.page_total {
            return;
        }
        if let Some(last) = NonZeroU32::new(page.page_total) {
            debug!(target = "folio::listing", from = current, to = last.get(), "clamping to last page");
            self.set_page(last).await;
        }
    }
}

impl<A: PostsApi + ?Sized> std::fmt::Debug for PostListController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostListController")
            .field("location", self.query.location())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn fetch_failure_message(err: &FetchError) -> String {
    match err.status_code() {
        Some(status) => format!("Failed to fetch posts: {status}"),
        None => GENERIC_FETCH_FAILURE.to_string(),
    }
}
