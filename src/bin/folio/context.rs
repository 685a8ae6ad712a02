use std::sync::Arc;

use folio::application::accounts::AccountService;
use folio::application::confirm::{AssumeYes, ConfirmationGate, Prompter};
use folio::application::editor::PostEditor;
use folio::application::error::AppError;
use folio::application::listing::{ListingOptions, PostListController};
use folio::application::session::AuthContext;
use folio::config::{ListingSettings, Settings};
use folio::domain::query::{Location, PostQuery};
use folio::infra::http::ApiClient;
use folio::infra::token_store::FileTokenStore;

use crate::io::Console;
use crate::prompt::TerminalPrompter;

/// Everything a command handler needs, wired from resolved settings.
pub struct Ctx {
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthContext>,
    pub gate: ConfirmationGate,
    pub console: Arc<Console>,
    pub listing: ListingSettings,
}

impl Ctx {
    pub fn from_settings(
        settings: &Settings,
        assume_yes: bool,
        console: Arc<Console>,
    ) -> Result<Self, AppError> {
        let api = Arc::new(ApiClient::new(&settings.api.base_url)?);
        let store = Arc::new(FileTokenStore::new(settings.session.token_file.clone()));
        let auth = Arc::new(AuthContext::load(store)?);
        let prompter: Arc<dyn Prompter> = if assume_yes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(TerminalPrompter::new(Arc::clone(&console)))
        };

        Ok(Self {
            api,
            auth,
            gate: ConfirmationGate::new(prompter),
            console,
            listing: settings.listing,
        })
    }

    pub fn open_query(&self, location: Location) -> PostQuery {
        PostQuery::open(location, self.listing.page_size)
    }

    pub fn controller(&self, query: PostQuery) -> PostListController<ApiClient> {
        PostListController::new(
            Arc::clone(&self.api),
            Arc::clone(&self.auth),
            query,
            ListingOptions {
                clamp_empty_page: self.listing.clamp_empty_page,
            },
        )
    }

    pub fn editor(&self) -> PostEditor<ApiClient> {
        PostEditor::new(Arc::clone(&self.api), Arc::clone(&self.auth))
    }

    pub fn accounts(&self) -> AccountService<ApiClient> {
        AccountService::new(Arc::clone(&self.api), Arc::clone(&self.auth))
    }
}
