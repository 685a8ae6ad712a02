//! Login, registration and logout.

use std::sync::Arc;

use folio_api_types::{LoginRequest, RegisterRequest};
use tracing::warn;

use crate::application::api::AccountsApi;
use crate::application::confirm::{Confirmation, ConfirmationGate, Gated};
use crate::application::error::AppError;
use crate::application::session::{AuthContext, Identity};

pub const LOGIN_FAILURE: &str = "Login failed";
pub const REGISTER_FAILURE: &str = "Registration failed";

pub struct AccountService<A: AccountsApi + ?Sized> {
    api: Arc<A>,
    auth: Arc<AuthContext>,
}

impl<A: AccountsApi + ?Sized> AccountService<A> {
    pub fn new(api: Arc<A>, auth: Arc<AuthContext>) -> Self {
        Self { api, auth }
    }

    /// Exchange credentials for a token and make it the current identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await.map_err(|err| {
            let message = err
                .server_message()
                .unwrap_or_else(|| LOGIN_FAILURE.to_string());
            AppError::request(message, err)
        })?;

        let Some(token) = response.token.filter(|token| !token.trim().is_empty()) else {
            warn!(target = "folio::accounts", "login response carried no token");
            return Err(AppError::unexpected(LOGIN_FAILURE));
        };
        Ok(self.auth.sign_in(token)?)
    }

    pub async fn register(
        &self,
        account_name: &str,
        email: &str,
        password: &str,
    ) -> Result<serde_json::Value, AppError> {
        let request = RegisterRequest {
            account_name: account_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.register(&request).await.map_err(|err| {
            let message = err
                .server_message()
                .unwrap_or_else(|| REGISTER_FAILURE.to_string());
            AppError::request(message, err)
        })
    }

    /// Sign out behind the confirmation gate.
    pub async fn logout(&self, gate: &ConfirmationGate) -> Result<Gated<()>, AppError> {
        let outcome = gate
            .run(&Confirmation::logout(), || async { self.auth.sign_out() })
            .await;
        match outcome {
            Gated::Confirmed(result) => {
                result?;
                Ok(Gated::Confirmed(()))
            }
            Gated::Cancelled => Ok(Gated::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use folio_api_types::LoginResponse;
    use serde_json::json;

    use super::*;
    use crate::application::confirm::Decision;
    use crate::application::confirm::testing::ScriptedPrompter;
    use crate::application::error::FetchError;
    use crate::application::session::{AUTH_TOKEN_KEY, MemoryTokenStore, TokenStore};
    use crate::domain::claims::token_with_payload;

    struct FakeAccounts {
        login: Result<LoginResponse, FetchError>,
        registered: Mutex<Vec<RegisterRequest>>,
    }

    impl FakeAccounts {
        fn answering(login: Result<LoginResponse, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                login,
                registered: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AccountsApi for FakeAccounts {
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, FetchError> {
            self.login.clone()
        }

        async fn register(
            &self,
            request: &RegisterRequest,
        ) -> Result<serde_json::Value, FetchError> {
            self.registered.lock().expect("lock").push(request.clone());
            Ok(json!({ "data": { "account_name": request.account_name } }))
        }
    }

    fn service(
        api: Arc<FakeAccounts>,
        store: Arc<MemoryTokenStore>,
    ) -> (AccountService<FakeAccounts>, Arc<AuthContext>) {
        let auth = Arc::new(AuthContext::load(store).expect("ctx"));
        (AccountService::new(api, auth.clone()), auth)
    }

    #[tokio::test]
    async fn login_stores_token_under_fixed_key() {
        let token = token_with_payload(&json!({ "sub": "acct", "email": "me@example.com" }));
        let store = Arc::new(MemoryTokenStore::default());
        let (svc, auth) = service(
            FakeAccounts::answering(Ok(LoginResponse {
                token: Some(token.clone()),
            })),
            store.clone(),
        );

        let identity = svc.login("me@example.com", "secret").await.expect("login");

        assert_eq!(identity.subject(), Some("acct"));
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), Some(token));
        assert!(auth.is_signed_in());
    }

    #[tokio::test]
    async fn login_surfaces_server_message() {
        let store = Arc::new(MemoryTokenStore::default());
        let (svc, auth) = service(
            FakeAccounts::answering(Err(FetchError::status(
                401,
                r#"{"message":"Invalid credentials"}"#,
            ))),
            store,
        );

        let err = svc.login("me@example.com", "nope").await.expect_err("rejected");
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!auth.is_signed_in());
    }

    #[tokio::test]
    async fn login_falls_back_to_generic_message() {
        let (svc, _) = service(
            FakeAccounts::answering(Err(FetchError::transport("refused"))),
            Arc::new(MemoryTokenStore::default()),
        );
        let err = svc.login("a@b.c", "x").await.expect_err("rejected");
        assert_eq!(err.to_string(), LOGIN_FAILURE);
    }

    #[tokio::test]
    async fn login_without_token_is_an_error() {
        let (svc, auth) = service(
            FakeAccounts::answering(Ok(LoginResponse { token: None })),
            Arc::new(MemoryTokenStore::default()),
        );
        assert!(svc.login("a@b.c", "x").await.is_err());
        assert!(!auth.is_signed_in());
    }

    #[tokio::test]
    async fn register_sends_account_fields() {
        let api = FakeAccounts::answering(Ok(LoginResponse { token: None }));
        let (svc, _) = service(api.clone(), Arc::new(MemoryTokenStore::default()));

        svc.register("yasir", "y@example.com", "Secret123")
            .await
            .expect("registered");

        let sent = api.registered.lock().expect("lock");
        assert_eq!(sent[0].account_name, "yasir");
        assert_eq!(sent[0].email, "y@example.com");
    }

    #[tokio::test]
    async fn cancelled_logout_keeps_session() {
        let store = Arc::new(MemoryTokenStore::with_token("a.b.c"));
        let (svc, auth) = service(
            FakeAccounts::answering(Ok(LoginResponse { token: None })),
            store.clone(),
        );
        let gate = ConfirmationGate::new(ScriptedPrompter::new(Decision::Cancelled));

        let outcome = svc.logout(&gate).await.expect("logout");

        assert!(outcome.is_cancelled());
        assert!(auth.is_signed_in());
        assert!(store.get(AUTH_TOKEN_KEY).expect("get").is_some());
    }

    #[tokio::test]
    async fn confirmed_logout_clears_session() {
        let store = Arc::new(MemoryTokenStore::with_token("a.b.c"));
        let (svc, auth) = service(
            FakeAccounts::answering(Ok(LoginResponse { token: None })),
            store.clone(),
        );
        let gate = ConfirmationGate::new(ScriptedPrompter::new(Decision::Confirmed));

        let outcome = svc.logout(&gate).await.expect("logout");

        assert_eq!(outcome, Gated::Confirmed(()));
        assert!(!auth.is_signed_in());
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
    }
}
